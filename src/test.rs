#[cfg(test)]
mod tests {
    use crate::error::FaultKind;
    use crate::log::LogSink;
    use crate::prelude::*;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn kernel() -> Kernel {
        Kernel::with_log(KernelConfig::default(), Log::null())
    }

    // ---- Sink that records everything, for fault-reporting checks
    #[derive(Clone, Default)]
    struct CaptureSink {
        lines: Rc<RefCell<Vec<String>>>,
    }

    impl CaptureSink {
        fn contains(&self, needle: &str) -> bool {
            self.lines.borrow().iter().any(|l| l.contains(needle))
        }
    }

    impl LogSink for CaptureSink {
        fn info(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("info: {msg}"));
        }
        fn warn(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("warn: {msg}"));
        }
        fn error(&self, msg: &str) {
            self.lines.borrow_mut().push(format!("error: {msg}"));
        }
        fn verbose(&self, level: u8, msg: &str) {
            self.lines.borrow_mut().push(format!("v{level}: {msg}"));
        }
    }

    fn flag() -> (Rc<Cell<bool>>, impl FnOnce() + 'static) {
        let f = Rc::new(Cell::new(false));
        let setter = {
            let f = f.clone();
            move || f.set(true)
        };
        (f, setter)
    }

    // ---- Barriers and triggers

    #[test]
    fn barrier_waits_for_all_members() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let f1 = fac.future::<bool>();
        let f2 = fac.future::<bool>();
        let f3 = fac.future::<bool>();

        let barrier = fac.barrier();
        barrier.add(f1.clone());
        barrier.add(f2.clone());
        barrier.add(f3.clone());

        let completions = Rc::new(Cell::new(0u32));
        barrier.then({
            let c = completions.clone();
            move || c.set(c.get() + 1)
        });

        k.root().add(barrier.clone());
        k.step();
        assert!(barrier.active());

        f2.set(true);
        k.step();
        assert!(barrier.active());

        f1.set(true);
        k.step();
        assert!(barrier.active());
        assert_eq!(barrier.pending(), 1);

        f3.set(true);
        k.step();
        assert!(!barrier.active());
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn trigger_completes_on_first_member() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let f1 = fac.future::<bool>();
        let f2 = fac.future::<bool>();
        let f3 = fac.future::<bool>();

        let trigger = fac.trigger();
        trigger.add(f1.clone());
        trigger.add(f2.clone());
        trigger.add(f3.clone());

        k.root().add(trigger.clone());
        k.step();
        assert!(trigger.active());

        f2.set(true);
        k.step();
        assert!(!trigger.active());
        assert!(f1.active());
        assert!(f3.active());

        // Survivors completing later must not re-fire anything.
        f1.set(true);
        k.step();
        assert!(!trigger.active());
    }

    #[test]
    fn empty_barrier_stays_active_until_first_cycle() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let barrier = fac.barrier();
        k.root().add(barrier.clone());

        k.step();
        k.step();
        assert!(barrier.active());

        let f = fac.future::<u32>();
        barrier.add(f.clone());
        f.set(1);
        assert!(!barrier.active());
    }

    #[test]
    fn barrier_drops_inactive_member_and_logs() {
        let sink = CaptureSink::default();
        let k = Kernel::with_log(KernelConfig::default(), Log::new(sink.clone()));
        let fac = k.factory().clone();

        let f = fac.future::<u32>();
        f.complete();

        let barrier = fac.barrier();
        barrier.add(f);
        assert_eq!(barrier.pending(), 0);
        assert!(barrier.active());
        assert!(sink.contains("inactive member rejected"));
    }

    #[test]
    fn trigger_ignores_adds_after_completion() {
        let k = kernel();
        let fac = k.factory().clone();
        let trigger = fac.trigger();

        let f1 = fac.future::<u32>();
        trigger.add(f1.clone());
        f1.set(1);
        assert!(!trigger.active());

        let f2 = fac.future::<u32>();
        trigger.add(f2.clone());
        assert_eq!(trigger.pending(), 0);
        f2.set(2);
        assert!(!trigger.active());
    }

    // ---- Sequences

    #[test]
    fn nested_sequence_runs_in_order() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let append = |n: i32| {
            let seen = seen.clone();
            fac.subroutine(move || {
                seen.borrow_mut().push(n);
                Ok(())
            })
        };

        let outer = fac.sequence();
        let inner = fac.sequence();
        outer.add(append(1));
        inner.add(append(2));
        inner.add(append(3));
        inner.add(append(4));
        outer.add(inner);
        outer.add(append(5));
        outer.add(append(6));

        k.root().add(outer.clone());
        let mut guard = 0;
        while outer.active() && guard < 100 {
            k.step();
            guard += 1;
        }

        assert!(!outer.active());
        assert_eq!(*seen.borrow(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn sequence_bounds_completed_head_pops_per_step() {
        let mut k = Kernel::with_log(
            KernelConfig {
                max_sequence_skip: Some(4),
                ..KernelConfig::default()
            },
            Log::null(),
        );
        let fac = k.factory().clone();
        let (ran, set_ran) = flag();

        let seq = fac.sequence();
        for _ in 0..10 {
            let cancelled = fac.subroutine(|| Ok(()));
            cancelled.complete();
            seq.add(cancelled);
        }
        seq.add(fac.subroutine(move || {
            set_ran();
            Ok(())
        }));

        k.root().add(seq.clone());
        k.step();
        k.step();
        assert!(!ran.get());

        // Third step clears the last two heads and runs the live one.
        k.step();
        assert!(ran.get());

        k.step();
        assert!(!seq.active());
    }

    // ---- Futures

    #[test]
    fn future_defaults_until_assigned_exactly_once() {
        let k = kernel();
        let fac = k.factory().clone();
        let f = fac.future::<u64>();

        assert!(!f.available());
        assert_eq!(f.value(), 0);

        f.set(5);
        assert!(f.available());
        assert!(!f.active());
        assert_eq!(f.value(), 5);

        f.set(7);
        assert_eq!(f.value(), 5);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let k = kernel();
        let fac = k.factory().clone();
        let f = fac.future::<u32>();

        let count = Rc::new(Cell::new(0u32));
        f.then({
            let c = count.clone();
            move || c.set(c.get() + 1)
        });

        f.complete();
        f.complete();
        assert!(!f.active());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn then_on_inactive_transient_runs_immediately() {
        let k = kernel();
        let fac = k.factory().clone();
        let f = fac.future::<u32>();
        f.complete();

        let (seen, set_seen) = flag();
        f.then(set_seen);
        assert!(seen.get());
    }

    #[test]
    fn complete_after_chain_cascades() {
        let k = kernel();
        let fac = k.factory().clone();

        let chain: Vec<_> = (0..40).map(|_| fac.future::<u32>()).collect();
        for pair in chain.windows(2) {
            pair[1].complete_after(&*pair[0]);
        }

        chain[0].complete();
        assert!(chain.iter().all(|f| !f.active()));
    }

    // ---- Suspend/resume protocol

    #[test]
    fn step_is_pure_noop_while_suspended() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let co = fac.coroutine(|| vec![Step::Yield(1), Step::Yield(2), Step::Yield(3)]);
        k.root().add(co.clone());

        k.step();
        assert_eq!(co.step_number(), 1);
        assert_eq!(co.value(), Some(1));

        co.suspend();
        co.suspend();
        k.step();
        k.step();
        assert_eq!(co.step_number(), 1);
        assert_eq!(co.value(), Some(1));

        co.resume();
        co.resume();
        k.step();
        assert_eq!(co.step_number(), 2);
        assert_eq!(co.value(), Some(2));
    }

    #[test]
    fn resume_after_inactive_dependency_resumes_now() {
        let k = kernel();
        let fac = k.factory().clone();
        let done = fac.future::<u32>();
        done.set(1);

        let co = fac.coroutine(|| vec![Step::Yield(1)]);
        co.resume_after(&*done);
        assert!(co.running());
    }

    #[test]
    fn suspend_after_trips_on_dependency_completion() {
        let k = kernel();
        let fac = k.factory().clone();
        let stopper = fac.future::<u32>();

        let co = fac.coroutine(|| vec![Step::Yield(1)]);
        co.suspend_after(&*stopper);
        assert!(co.running());

        stopper.set(1);
        assert!(!co.running());
    }

    // ---- Coroutines and subroutines

    #[test]
    fn coroutine_suspends_on_yielded_future() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let fut = fac.future::<i32>();

        let co = {
            let fut = fut.clone();
            fac.coroutine(move || vec![Step::wait(fut), Step::Yield(7)])
        };
        k.root().add(co.clone());

        k.step();
        assert!(!co.running());
        assert!(co.awaiting().is_some());
        assert_eq!(co.step_number(), 1);

        k.step();
        assert_eq!(co.step_number(), 1);

        fut.set(5);
        assert!(co.running());

        k.step();
        assert_eq!(co.step_number(), 2);
        assert_eq!(co.value(), Some(7));
        assert!(co.awaiting().is_none());

        k.step();
        assert!(!co.active());
    }

    #[test]
    fn coroutine_pause_consumes_the_tick() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let co = fac.coroutine(|| vec![Step::Pause, Step::Yield(9)]);
        k.root().add(co.clone());

        k.step();
        assert!(co.running());
        assert_eq!(co.step_number(), 1);
        assert_eq!(co.value(), None);

        k.step();
        assert_eq!(co.value(), Some(9));
    }

    #[test]
    fn coroutine_fault_completes_without_poisoning_siblings() {
        let sink = CaptureSink::default();
        let mut k = Kernel::with_log(KernelConfig::default(), Log::new(sink.clone()));
        let fac = k.factory().clone();

        let co = fac.coroutine(|| {
            vec![
                Step::Yield(1),
                Step::Fail(anyhow!("boom")),
                Step::Yield(2),
            ]
        });
        let (sibling_ran, set_ran) = flag();
        let sibling = fac.subroutine(move || {
            set_ran();
            Ok(())
        });

        k.root().add(co.clone());
        k.root().add(sibling);

        k.step();
        k.step();
        assert!(!co.active());
        assert!(co.faulted());
        assert_eq!(co.take_fault().unwrap().kind(), FaultKind::CoroutineBody);
        assert!(sibling_ran.get());
        assert!(sink.contains("coroutine body failed"));
        assert!(sink.contains("boom"));
    }

    #[test]
    fn subroutine_stores_value_and_completes_on_first_step() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let sub = fac.subroutine(|| Ok(40 + 2));
        k.root().add(sub.clone());

        k.step();
        assert_eq!(sub.value(), Some(42));
        assert!(!sub.active());
        assert_eq!(sub.step_number(), 1);
    }

    #[test]
    fn subroutine_error_is_recorded_not_thrown() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let sub = fac.subroutine::<u32, _>(|| Err(anyhow!("no value")));
        k.root().add(sub.clone());

        k.step();
        assert!(!sub.active());
        assert_eq!(sub.value(), None);
        assert_eq!(sub.take_fault().unwrap().kind(), FaultKind::SubroutineBody);
    }

    // ---- Timers

    #[test]
    fn periodic_ticks_and_stays_active() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let p = fac.periodic(0.1);
        k.root().add(p.clone());

        for _ in 0..10 {
            k.update(0.1);
        }
        assert!(p.tick_count() >= 3);
        assert!(p.active());
    }

    #[test]
    fn periodic_catches_up_one_period_per_tick_by_default() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let p = fac.periodic(0.1);
        k.root().add(p.clone());

        k.update(1.0);
        assert_eq!(p.tick_count(), 1);

        k.step();
        k.step();
        assert_eq!(p.tick_count(), 3);
    }

    #[test]
    fn periodic_catch_up_is_opt_in() {
        let mut k = Kernel::with_log(
            KernelConfig {
                periodic_catch_up: true,
                ..KernelConfig::default()
            },
            Log::null(),
        );
        let fac = k.factory().clone();
        let p = fac.periodic(0.1);
        k.root().add(p.clone());

        k.update(1.05);
        assert_eq!(p.tick_count(), 10);
    }

    #[test]
    fn timer_elapses_once_and_leaves_the_root() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let timer = fac.timer(0.1);
        let (elapsed, set_elapsed) = flag();
        timer.on_elapsed(set_elapsed);
        k.root().add(timer.clone());

        k.update(0.05);
        assert!(timer.active());
        assert!(!elapsed.get());

        k.update(0.06);
        assert!(!timer.active());
        assert!(elapsed.get());
        assert!(k.root().is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires_elapsed() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let timer = fac.timer(0.1);
        let (elapsed, set_elapsed) = flag();
        timer.on_elapsed(set_elapsed);
        k.root().add(timer.clone());

        timer.complete();
        k.update(1.0);
        assert!(!elapsed.get());
        assert!(k.root().is_empty());
    }

    // ---- Timed composites

    #[test]
    fn timed_future_times_out_with_default_value() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let tf = fac.timed_future::<String>(0.05);

        let (timed_out, set_timed_out) = flag();
        tf.on_timed_out(set_timed_out);

        for _ in 0..10 {
            k.update(0.01);
        }

        assert!(timed_out.get());
        assert!(tf.timed_out());
        assert!(!tf.active());
        assert!(!tf.inner().active());
        assert_eq!(tf.value(), String::default());
    }

    #[test]
    fn timed_barrier_settles_before_timeout() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let tb = fac.timed_barrier(1.0);

        let f = fac.future::<u32>();
        tb.add(f.clone());

        k.update(0.1);
        f.set(1);
        assert!(!tb.active());
        assert!(!tb.timed_out());
        // Settling cancels the timeout leg out of the root.
        assert!(k.root().is_empty());

        k.update(2.0);
        assert!(!tb.timed_out());
    }

    #[test]
    fn timed_trigger_timeout_leaves_members_alone() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let tt = fac.timed_trigger(0.05);

        let f = fac.future::<u32>();
        tt.add(f.clone());

        for _ in 0..10 {
            k.update(0.01);
        }
        assert!(tt.timed_out());
        assert!(!tt.active());
        assert!(f.active());
    }

    // ---- Node and group

    #[test]
    fn node_defers_children_added_mid_tick() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let (late_ran, set_late_ran) = flag();

        let root = k.root().clone();
        let inner_fac = fac.clone();
        let spawner = fac.subroutine(move || {
            root.add(inner_fac.subroutine(move || {
                set_late_ran();
                Ok(())
            }));
            Ok(())
        });
        k.root().add(spawner);

        k.step();
        assert!(!late_ran.get());

        k.step();
        assert!(late_ran.get());
    }

    #[test]
    fn group_bundles_without_forcing_completion() {
        let k = kernel();
        let fac = k.factory().clone();
        let group = fac.group();

        let f1 = fac.future::<u32>();
        let f2 = fac.future::<u32>();
        group.add(f1.clone());
        group.add(f2.clone());
        assert_eq!(group.len(), 2);

        f1.set(1);
        assert_eq!(group.len(), 1);

        group.complete();
        assert!(!group.active());
        assert!(f2.active());
    }

    // ---- Kernel time model

    #[test]
    fn time_is_monotonic_and_bad_deltas_are_clamped() {
        let sink = CaptureSink::default();
        let mut k = Kernel::with_log(KernelConfig::default(), Log::new(sink.clone()));

        k.update(0.5);
        assert_eq!(k.time(), 0.5);
        assert_eq!(k.last_delta(), 0.5);

        k.update(-1.0);
        assert_eq!(k.time(), 0.5);
        assert_eq!(k.last_delta(), 0.0);
        assert!(sink.contains("invalid time delta"));

        k.update(f64::NAN);
        assert_eq!(k.time(), 0.5);
    }

    #[test]
    fn wait_pauses_stepping_until_the_deadline() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let (ran, set_ran) = flag();
        k.root().add(fac.subroutine(move || {
            set_ran();
            Ok(())
        }));

        k.wait(1.0);
        k.update(0.5);
        assert!(!ran.get());
        assert_eq!(k.step_number(), 0);

        k.update(0.6);
        assert!(ran.get());
        assert_eq!(k.step_number(), 1);
        assert!(k.waiting_until().is_none());
    }

    #[test]
    fn break_flow_is_observable_and_resettable() {
        let mut k = kernel();
        let fac = k.factory().clone();
        let (ran, set_ran) = flag();
        k.root().add(fac.subroutine(move || {
            set_ran();
            Ok(())
        }));

        k.break_flow();
        assert!(k.break_flag());
        k.update(1.0);
        assert!(!ran.get());
        assert_eq!(k.step_number(), 0);

        k.clear_break();
        k.step();
        assert!(ran.get());
    }

    // ---- Surface sugar

    #[test]
    fn named_decorator_sticks() {
        let k = kernel();
        let fac = k.factory().clone();
        let timer = fac.timer(1.0).named("respawn");
        assert_eq!(timer.name().as_deref(), Some("respawn"));
    }

    #[test]
    fn kernel_config_parses_from_json() {
        let cfg: KernelConfig =
            serde_json::from_str(r#"{"initial_time": 5.0, "periodic_catch_up": true}"#).unwrap();
        assert_eq!(cfg.initial_time, Some(5.0));
        assert!(cfg.periodic_catch_up);
        assert_eq!(cfg.max_sequence_skip, None);

        let k = Kernel::with_log(cfg, Log::null());
        assert_eq!(k.time(), 5.0);
    }
}
