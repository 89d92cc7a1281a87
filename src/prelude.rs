pub use crate::config::KernelConfig;
pub use crate::error::{FaultKind, FlowFault};
pub use crate::factory::Factory;
pub use crate::flow::{
    Barrier, Coroutine, Future, Generator, GeneratorExt, Group, Lifecycle, Named, Node, Periodic,
    Sequence, Step, Subroutine, Timed, TimedBarrier, TimedFuture, TimedTrigger, Timer, Transient,
    TransientExt, Trigger,
};
pub use crate::kernel::Kernel;
pub use crate::log::{Log, LogSink, NullSink, TracingSink};
pub use crate::utils::logger::LoggerConfig;
pub use crate::utils::Clock;
