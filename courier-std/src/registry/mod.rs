//! Handler registration.
//!
//! - [`RegistryBuilder`] scans candidates and decides what to register
//! - [`HandlerRegistry`] stores the result and resolves instances

mod builder;
mod container;

pub use builder::{RegistrationConfig, RegistryBuilder};
pub use container::HandlerRegistry;
