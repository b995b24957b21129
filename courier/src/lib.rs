//! # courier - Generic-Aware In-Process Mediator
//!
//! `courier` decouples the code that sends a message from the code that
//! handles it. Requests go to exactly one handler and return its response;
//! notifications fan out to every matching handler; stream requests are
//! answered by one handler producing a sequence of items.
//!
//! Handlers are discovered by scanning candidate types against contract
//! templates. Open generic handlers, such as an audit handler written once for
//! every notification, are specialized for each closed shape the scan sees.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Request)]
//! #[request(response = String)]
//! struct Greet(String);
//!
//! struct Greeter;
//!
//! #[courier::register]
//! impl RequestHandler<Greet> for Greeter {
//!     async fn handle(&self, req: &Greet, _: &CancellationToken) -> Result<String, BoxError> {
//!         Ok(format!("hello {}", req.0))
//!     }
//! }
//!
//! let mediator = Mediator::builder().discover().build();
//! let greeting = mediator.send(&Greet("ada".into()), &CancellationToken::new()).await?;
//! ```
//!
//! Candidates can also be listed by hand with [`Candidate`]:
//!
//! ```rust,ignore
//! let mediator = Mediator::builder()
//!     .candidate(Candidate::new(|| Greeter).request_handler::<Greet>())
//!     .build();
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod mediator;

pub use mediator::{Mediator, MediatorBuilder, Publisher, Sender};

pub use courier_core::{
    // Errors
    BoxError,
    // Futures
    BoxFuture,
    BoxStream,
    Cancelled,
    // Cancellation
    CancellationToken,
    // Candidates
    Candidate,
    Component,
    Constraint,
    // Contract shapes
    ContractShape,
    // Handlers
    DynNotificationHandler,
    // Pipeline
    DynPipelineBehavior,
    DynPostProcessor,
    DynPreProcessor,
    DynRequestHandler,
    GenericParam,
    HandlerFailure,
    // Container boundary
    Instance,
    Interface,
    Lifetime,
    MediatorError,
    // Messages
    Message,
    Next,
    Notification,
    NotificationHandler,
    PipelineBehavior,
    PublishError,
    Registration,
    Request,
    RequestHandler,
    RequestPostProcessor,
    RequestPreProcessor,
    ResolveError,
    ServiceProvider,
    ServiceRegistrar,
    SkipReason,
    SpecializationSkipped,
    StreamRequest,
    StreamRequestHandler,
    Template,
    TemplateKind,
    TypeArg,
    TypeDescriptor,
    TypeKey,
    TypeKind,
    contracts,
};

pub use courier_std::{
    AnyNotification, AnyRequest, DeliveryStrategy, DynDeliveryStrategy, ErrorMode,
    HandlerInvocation, HandlerRegistry, NotificationPublisher, ParallelDelivery,
    RegistrationConfig, RegistryBuilder, RequestDispatcher, SequentialDelivery,
};

/// Type-closing resolver.
pub mod resolver {
    pub use courier_std::resolver::{
        find_closed_shapes, implements_template, is_registrable, specialize,
    };
}

/// Standard pipeline behaviors.
pub mod behaviors {
    pub use courier_std::behaviors::{
        LoggingBehavior, PostProcessorBehavior, PreProcessorBehavior, TimeoutBehavior,
        TimeoutError,
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::testing::*;
}

/// Link-time candidate discovery.
#[cfg(feature = "inventory")]
pub mod discovery {
    pub use courier_std::discovery::{CandidateRegistration, discover};
}

#[cfg(feature = "inventory")]
#[doc(hidden)]
pub use inventory;

#[cfg(feature = "macros")]
pub use courier_macros::{Notification, Request, StreamRequest, register};

/// Prelude module - common imports for Courier.
///
/// # Usage
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, CancellationToken, Candidate, Mediator, MediatorError, Message, Next,
        Notification, NotificationHandler, PipelineBehavior, Publisher, Request, RequestHandler,
        Sender, StreamRequest, StreamRequestHandler,
    };
}
