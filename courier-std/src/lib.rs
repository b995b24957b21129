//! # courier-std
//!
//! Standard implementations for the Courier mediator.
//!
//! This crate provides:
//! - **Resolution**: [`resolver`] matches candidates against contract templates
//!   and specializes open generics
//! - **Registration**: [`RegistryBuilder`] and the [`HandlerRegistry`] container
//! - **Dispatch**: [`RequestDispatcher`] and [`NotificationPublisher`]
//! - **Delivery strategies**: [`SequentialDelivery`], [`ParallelDelivery`]
//! - **Standard behaviors**: Logging, Timeout, pre/post processors
//! - **Discovery**: link-time candidate collection (feature `inventory`)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use courier_core;

// Modules
pub mod behaviors;
pub mod delivery;
pub mod dispatch;
pub mod registry;
pub mod resolver;
pub mod testing;

#[cfg(feature = "inventory")]
pub mod discovery;

pub use delivery::{
    DeliveryStrategy, DynDeliveryStrategy, ErrorMode, HandlerInvocation, ParallelDelivery,
    SequentialDelivery,
};
pub use dispatch::{AnyNotification, AnyRequest, NotificationPublisher, RequestDispatcher};
pub use registry::{HandlerRegistry, RegistrationConfig, RegistryBuilder};

#[cfg(feature = "inventory")]
pub use inventory;
