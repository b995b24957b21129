//! # courier-core
//!
//! Core contracts for the Courier in-process mediator.
//!
//! This crate has minimal dependencies and is meant to be imported by crates
//! that only declare messages and handlers. The registry, dispatcher and
//! publisher live in `courier-std`.
//!
//! # Vocabulary
//!
//! ## Messages ([`Request`], [`Notification`], [`StreamRequest`])
//!
//! A request is answered by exactly one handler. A notification reaches every
//! matching handler, possibly none. A stream request is answered by one handler
//! producing a sequence of items.
//!
//! ## Contract shapes ([`ContractShape`])
//!
//! The type-level signature a handler matches, such as
//! `RequestHandler<Ping, Pong>`. Shapes are plain values, so the registration
//! scan can compare them without reflection.
//!
//! ## Candidates ([`TypeDescriptor`], [`Candidate`])
//!
//! What the scan knows about an implementation: whether it is concrete or a
//! generic definition, the shapes it declares, its base type, and how to build
//! it.
//!
//! ## Handlers and pipeline ([`RequestHandler`], [`PipelineBehavior`], [`Next`])
//!
//! Native `async` traits with object-safe `Dyn*` twins. Behaviors wrap the
//! handler; [`Next`] is the continuation each behavior receives.
//!
//! ## Container boundary ([`ServiceProvider`], [`ServiceRegistrar`])
//!
//! The mediator resolves instances through these traits and never constructs
//! handlers itself.
//!
//! # Error Types
//!
//! - [`MediatorError`] - Returned by `send` and `publish`
//! - [`ResolveError`] - Raised by service providers
//! - [`PublishError`] - Aggregate of failed notification handlers
//! - [`SpecializationSkipped`] - Registration diagnostic

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod candidate;
mod descriptor;
mod error;
mod handler;
mod message;
mod pipeline;
mod provider;
mod shape;

// Re-exports
pub use candidate::Candidate;
pub use descriptor::{Component, Constraint, GenericParam, Interface, TypeDescriptor, TypeKind};
pub use error::{
    BoxError, Cancelled, HandlerFailure, MediatorError, PublishError, ResolveError, SkipReason,
    SpecializationSkipped,
};
pub use handler::{
    DynNotificationHandler, DynRequestHandler, NotificationHandler, RequestHandler,
    StreamRequestHandler,
};
pub use message::{Message, Notification, Request, StreamRequest};
pub use pipeline::{
    DynPipelineBehavior, DynPostProcessor, DynPreProcessor, Next, PipelineBehavior,
    RequestPostProcessor, RequestPreProcessor,
};
pub use provider::{Instance, Lifetime, Registration, ServiceProvider, ServiceRegistrar};
pub use shape::{ContractShape, Template, TemplateKind, TypeArg, TypeKey, contracts};

pub use futures::{future::BoxFuture, stream::BoxStream};
pub use tokio_util::sync::CancellationToken;
