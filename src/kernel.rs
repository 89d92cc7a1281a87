use crate::config::KernelConfig;
use crate::factory::Factory;
use crate::flow::{Generator, Named, Node};
use crate::log::Log;
use crate::utils::Clock;
use std::rc::Rc;

/// Single-threaded cooperative scheduler.
///
/// Owns the root [`Node`], the time model and the step driver.
/// Applications call [`update`](Kernel::update) once per frame (or
/// [`step`](Kernel::step) for a zero-delta tick); the kernel
/// propagates stepping into the root, which propagates into each
/// active child in insertion order.
///
/// Everything a kernel owns must be driven from the thread that
/// created it; there is no cross-thread marshaling and no locking
/// anywhere in the tree.
pub struct Kernel {
    clock: Clock,
    log: Log,
    root: Rc<Node>,
    factory: Factory,
    step_number: u64,
    break_flag: bool,
    wait_until: Option<f64>,
}

impl Kernel {
    /// Kernel logging through `tracing`.
    pub fn new(cfg: KernelConfig) -> Self {
        Self::with_log(cfg, Log::tracing())
    }

    /// Kernel with an explicit log sink.
    pub fn with_log(cfg: KernelConfig, log: Log) -> Self {
        let clock = Clock::new(cfg.initial_time.unwrap_or(0.0), log.clone());
        let root = Node::new(log.clone()).named("root");
        let factory = Factory::new(
            clock.clone(),
            log.clone(),
            root.clone(),
            cfg.periodic_catch_up,
            cfg.max_sequence_skip
                .unwrap_or(KernelConfig::DEFAULT_SEQUENCE_SKIP),
        );
        Self {
            clock,
            log,
            root,
            factory,
            step_number: 0,
            break_flag: false,
            wait_until: None,
        }
    }

    /// Advance time by `delta` seconds and tick once.
    pub fn update(&mut self, delta: f64) {
        self.clock.advance(delta);
        self.step();
    }

    /// One tick without advancing time. No-op while broken or while a
    /// `wait` deadline is pending.
    pub fn step(&mut self) {
        if self.break_flag {
            return;
        }
        if let Some(deadline) = self.wait_until {
            if self.clock.now() < deadline {
                return;
            }
            self.wait_until = None;
        }
        self.step_number += 1;
        self.root.step();
    }

    /// Pause all stepping until `duration` seconds from now.
    pub fn wait(&mut self, duration: f64) {
        let deadline = self.clock.now() + duration.max(0.0);
        self.wait_until = Some(deadline);
        self.log.verbose(0, &format!("kernel waiting until t={deadline:.3}"));
    }

    /// Stop stepping until [`clear_break`](Kernel::clear_break).
    pub fn break_flow(&mut self) {
        self.break_flag = true;
        self.log.info("kernel flow broken");
    }

    /// Lift a previous [`break_flow`](Kernel::break_flow).
    pub fn clear_break(&mut self) {
        self.break_flag = false;
    }

    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Seconds accumulated since kernel creation.
    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    pub fn last_delta(&self) -> f64 {
        self.clock.last_delta()
    }

    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    pub fn break_flag(&self) -> bool {
        self.break_flag
    }

    /// Pending `wait` deadline, if stepping is paused.
    pub fn waiting_until(&self) -> Option<f64> {
        self.wait_until
    }

    pub fn log(&self) -> &Log {
        &self.log
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}
