//! Request dispatch and notification publishing.
//!
//! Both sides resolve instances through a [`ServiceProvider`] and view them
//! through the typed `Dyn*` contract traits.

mod publish;
mod request;
mod stream;

pub use publish::{AnyNotification, NotificationPublisher};
pub use request::{AnyRequest, RequestDispatcher};

use courier_core::{ContractShape, Instance, MediatorError, ResolveError, ServiceProvider};
use std::any::Any;

/// Resolves the single instance for `shape` and views it as `V`.
pub(crate) fn resolve_one<V>(
    provider: &dyn ServiceProvider,
    shape: &ContractShape,
    request: &str,
) -> Result<V, MediatorError>
where
    V: Any + Clone,
{
    let instance = provider
        .resolve(shape)?
        .ok_or_else(|| MediatorError::HandlerNotFound {
            request: request.to_owned(),
            contract: shape.to_string(),
        })?;
    view(&instance, shape)
}

/// Resolves every instance for `shape` and views them as `V`.
pub(crate) fn resolve_all<V>(
    provider: &dyn ServiceProvider,
    shape: &ContractShape,
) -> Result<Vec<(Instance, V)>, MediatorError>
where
    V: Any + Clone,
{
    provider
        .resolve_all(shape)?
        .into_iter()
        .map(|instance| {
            let typed = view(&instance, shape)?;
            Ok((instance, typed))
        })
        .collect()
}

fn view<V: Any + Clone>(instance: &Instance, shape: &ContractShape) -> Result<V, MediatorError> {
    instance.downcast::<V>().ok_or_else(|| {
        ResolveError::ContractMismatch {
            implementation: instance.implementation().clone(),
            contract: shape.clone(),
        }
        .into()
    })
}
