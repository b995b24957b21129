//! Notification delivery strategies.
//!
//! A strategy decides how the resolved handlers of one notification are run:
//! one after another ([`SequentialDelivery`]) or concurrently
//! ([`ParallelDelivery`]).

mod parallel;
mod sequential;
mod traits;

pub use parallel::ParallelDelivery;
pub use sequential::{ErrorMode, SequentialDelivery};
pub use traits::{DeliveryStrategy, DynDeliveryStrategy, HandlerInvocation};
