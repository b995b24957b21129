//! Error types for Courier.
//!
//! - [`MediatorError`] - Everything `send` and `publish` can fail with
//! - [`ResolveError`] - A service provider failed to produce an instance
//! - [`PublishError`] - Aggregate of failed notification handlers
//! - [`SpecializationSkipped`] - Diagnostic record, never raised to callers
//! - [`Cancelled`] - Marker handlers return to report cooperative cancellation

use crate::shape::{ContractShape, TypeKey};
use std::fmt;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cooperative cancellation was observed.
///
/// Handlers and behaviors return this (boxed) to stop a dispatch; the
/// dispatcher maps it to [`MediatorError::Cancelled`].
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("operation was cancelled")]
pub struct Cancelled;

/// Top-level error type for mediator operations.
#[derive(Error, Debug)]
pub enum MediatorError {
    /// No handler is registered for the request.
    #[error("no handler registered for request `{request}` ({contract})")]
    HandlerNotFound {
        /// Type name of the request.
        request: String,
        /// Contract shape that was looked up.
        contract: String,
    },

    /// The provider failed while building a handler.
    #[error("failed to construct handler `{handler}`")]
    HandlerConstruction {
        /// Implementation that failed.
        handler: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// A handler or behavior failed; the original error is kept as is.
    #[error(transparent)]
    Handler(BoxError),

    /// One or more notification handlers failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The dispatch was cancelled before it completed.
    #[error("operation was cancelled")]
    Cancelled,
}

impl MediatorError {
    /// Classifies an error raised while invoking handlers.
    ///
    /// The [`Cancelled`] marker becomes [`MediatorError::Cancelled`], a nested
    /// `MediatorError` is unwrapped, anything else is kept in
    /// [`MediatorError::Handler`].
    pub fn from_invocation(err: BoxError) -> Self {
        if Self::is_cancellation(&err) {
            return Self::Cancelled;
        }
        match err.downcast::<MediatorError>() {
            Ok(inner) => *inner,
            Err(err) => Self::Handler(err),
        }
    }

    /// `true` when `err` reports cancellation, either as the [`Cancelled`]
    /// marker or as a forwarded [`MediatorError::Cancelled`].
    pub fn is_cancellation(err: &BoxError) -> bool {
        err.is::<Cancelled>()
            || err
                .downcast_ref::<MediatorError>()
                .is_some_and(MediatorError::is_cancelled)
    }

    /// `true` for [`MediatorError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// `true` for [`MediatorError::HandlerNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }
}

impl From<ResolveError> for MediatorError {
    fn from(err: ResolveError) -> Self {
        let handler = err.implementation().to_string();
        match err {
            ResolveError::Construction { source, .. } => Self::HandlerConstruction { handler, source },
            mismatch @ ResolveError::ContractMismatch { .. } => Self::HandlerConstruction {
                handler,
                source: Box::new(mismatch),
            },
        }
    }
}

/// A service provider could not produce an instance.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The implementation's constructor failed.
    #[error("failed to construct `{implementation}`")]
    Construction {
        /// Implementation being built.
        implementation: TypeKey,
        /// Constructor error.
        #[source]
        source: BoxError,
    },

    /// The implementation was built but does not provide the contract.
    #[error("`{implementation}` does not provide {contract}")]
    ContractMismatch {
        /// Implementation that was built.
        implementation: TypeKey,
        /// Contract that was requested.
        contract: ContractShape,
    },
}

impl ResolveError {
    /// Implementation the error refers to.
    pub fn implementation(&self) -> &TypeKey {
        match self {
            Self::Construction { implementation, .. } | Self::ContractMismatch { implementation, .. } => {
                implementation
            }
        }
    }
}

/// One failed notification handler.
#[derive(Error, Debug)]
#[error("handler `{handler}` failed: {source}")]
pub struct HandlerFailure {
    handler: TypeKey,
    #[source]
    source: BoxError,
}

impl HandlerFailure {
    /// Records `source` as raised by `handler`.
    pub fn new(handler: TypeKey, source: BoxError) -> Self {
        Self { handler, source }
    }

    /// Implementation that failed.
    pub fn handler(&self) -> &TypeKey {
        &self.handler
    }

    /// The raised error.
    pub fn error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.source
    }

    /// Consumes the record, returning the raised error.
    pub fn into_error(self) -> BoxError {
        self.source
    }
}

/// Aggregate of every notification handler that failed in one publish.
#[derive(Error, Debug)]
#[error("{} notification handler(s) failed", failures.len())]
pub struct PublishError {
    failures: Vec<HandlerFailure>,
}

impl PublishError {
    /// Wraps the collected failures.
    pub fn new(failures: Vec<HandlerFailure>) -> Self {
        Self { failures }
    }

    /// Failures in the order the handlers ran.
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    /// Consumes the aggregate.
    pub fn into_failures(self) -> Vec<HandlerFailure> {
        self.failures
    }
}

/// An open generic implementation could not be closed over a shape.
///
/// This is an expected outcome during registration. It is logged and kept for
/// inspection but never returned as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("skipped specializing `{definition}` for {contract}: {reason}")]
pub struct SpecializationSkipped {
    /// The generic definition.
    pub definition: TypeKey,
    /// Closed shape it was tried against.
    pub contract: ContractShape,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Reason a specialization was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The shape was not closed.
    OpenContract,
    /// The definition does not close the shape's template at all.
    NotImplemented,
    /// Argument counts differ.
    ArityMismatch {
        /// Arguments on the definition's shape.
        expected: usize,
        /// Arguments on the closed shape.
        found: usize,
    },
    /// A fixed argument differs from the closed shape's.
    ArgumentMismatch {
        /// Argument fixed by the definition.
        expected: TypeKey,
        /// Argument on the closed shape.
        found: TypeKey,
    },
    /// A parameter index is out of range for the definition.
    UnknownParameter(usize),
    /// A repeated parameter would bind to two different types.
    ConflictingBinding {
        /// Parameter index.
        param: usize,
        /// First binding.
        first: TypeKey,
        /// Second binding.
        second: TypeKey,
    },
    /// A parameter is not mentioned by the shape.
    Unbound(usize),
    /// A parameter constraint rejected its argument.
    ConstraintRejected {
        /// Parameter name.
        param: String,
        /// Description of the constraint.
        constraint: String,
        /// Rejected argument.
        argument: TypeKey,
    },
    /// The definition offers no instantiation for these arguments.
    NoInstantiation(Vec<TypeKey>),
    /// The instantiation exists but does not provide the shape.
    MissingContract(TypeKey),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenContract => f.write_str("contract is not closed"),
            Self::NotImplemented => f.write_str("definition does not implement the template"),
            Self::ArityMismatch { expected, found } => {
                write!(f, "expected {expected} type arguments, found {found}")
            }
            Self::ArgumentMismatch { expected, found } => {
                write!(f, "argument `{found}` does not match `{expected}`")
            }
            Self::UnknownParameter(index) => write!(f, "unknown generic parameter #{index}"),
            Self::ConflictingBinding {
                param,
                first,
                second,
            } => write!(f, "parameter #{param} bound to both `{first}` and `{second}`"),
            Self::Unbound(index) => write!(f, "generic parameter #{index} left unbound"),
            Self::ConstraintRejected {
                param,
                constraint,
                argument,
            } => write!(f, "`{argument}` violates `{param}: {constraint}`"),
            Self::NoInstantiation(args) => {
                f.write_str("no instantiation for [")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
            Self::MissingContract(key) => write!(f, "`{key}` does not provide the contract"),
        }
    }
}
