use std::rc::Rc;

/// Four-method logging capability consumed by the core.
///
/// The kernel and its flow objects report faults and dropped
/// invariants through a sink instead of calling a global logger,
/// so hosts can redirect or silence the output per kernel.
pub trait LogSink {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    /// Leveled diagnostics; `level` 0 is the loudest.
    fn verbose(&self, level: u8, msg: &str);
}

/// Sink routing to the `tracing` macros. The default for kernels.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn verbose(&self, level: u8, msg: &str) {
        if level == 0 {
            tracing::debug!("{msg}");
        } else {
            tracing::trace!("{msg}");
        }
    }
}

/// Sink that drops everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn verbose(&self, _level: u8, _msg: &str) {}
}

/// Cheaply clonable handle over a shared [`LogSink`].
///
/// Every flow object that can report a fault holds one of these,
/// set at birth by the factory.
#[derive(Clone)]
pub struct Log {
    sink: Rc<dyn LogSink>,
}

impl Log {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }

    /// Handle over a [`TracingSink`].
    pub fn tracing() -> Self {
        Self::new(TracingSink)
    }

    /// Handle over a [`NullSink`].
    pub fn null() -> Self {
        Self::new(NullSink)
    }

    #[inline]
    pub fn info(&self, msg: &str) {
        self.sink.info(msg);
    }

    #[inline]
    pub fn warn(&self, msg: &str) {
        self.sink.warn(msg);
    }

    #[inline]
    pub fn error(&self, msg: &str) {
        self.sink.error(msg);
    }

    #[inline]
    pub fn verbose(&self, level: u8, msg: &str) {
        self.sink.verbose(level, msg);
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Log")
    }
}
