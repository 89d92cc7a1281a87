pub use barrier::Barrier;
pub use coroutine::{Coroutine, Step, Subroutine};
pub use future::Future;
pub use generator::{Generator, GeneratorExt, StepCore};
pub use node::{Group, Node};
pub use sequence::Sequence;
pub use timed::{Timed, TimedBarrier, TimedFuture, TimedTrigger};
pub use timer::{Periodic, Timer};
pub use transient::{Lifecycle, Named, Transient, TransientExt};
pub use trigger::Trigger;

mod barrier;
mod coroutine;
mod future;
mod generator;
mod node;
mod sequence;
mod timed;
mod timer;
mod transient;
mod trigger;
