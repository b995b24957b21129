//! Stock pipeline behaviors.

mod logging;
mod processors;
mod timeout;

pub use logging::LoggingBehavior;
pub use processors::{PostProcessorBehavior, PreProcessorBehavior};
pub use timeout::{TimeoutBehavior, TimeoutError};
