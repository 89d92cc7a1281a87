use flowrt::prelude::*;

/// Miniature game loop: a heartbeat, an intro timer and a scripted
/// coroutine that waits for a level to become available.
fn main() -> anyhow::Result<()> {
    let _log_guard = LoggerConfig::from_env().init()?;

    let mut kernel = Kernel::new(KernelConfig::default());
    let fac = kernel.factory().clone();

    // Visible sign of life every half second of game time.
    let heartbeat = fac.periodic(0.5).named("heartbeat");
    heartbeat.on_tick(|| tracing::info!("heartbeat"));
    kernel.root().add(heartbeat);

    // The loop assigns this mid-run, as an asset load would.
    let level_ready = fac.future::<String>();

    let intro = fac.timer(0.25).named("intro");
    kernel.root().add(intro.clone());

    let script = {
        let wait_for = level_ready.clone();
        let read_from = level_ready.clone();
        fac.coroutine(move || {
            [Step::wait(intro), Step::wait(wait_for)]
                .into_iter()
                .chain(std::iter::once_with(move || {
                    Step::Yield(read_from.value())
                }))
        })
    };
    kernel.root().add(script.clone());

    // Fixed-step main loop at 60 Hz.
    for frame in 0..120 {
        kernel.update(1.0 / 60.0);

        if frame == 30 {
            tracing::info!("level finished loading");
            level_ready.set("castle".to_string());
        }

        if !script.active() {
            break;
        }
    }

    tracing::info!(
        "script finished at t={:.2}s with {:?}",
        kernel.time(),
        script.value()
    );
    Ok(())
}
