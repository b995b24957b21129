//! Message contracts.
//!
//! These traits carry no behavior. They are the typing vocabulary every other
//! part of the mediator is keyed on: a [`Request`] names the response its single
//! handler produces, a [`Notification`] may reach any number of handlers, and a
//! [`StreamRequest`] produces a sequence of items.

/// Base marker for anything the mediator can carry.
///
/// Messages are borrowed immutably for the whole dispatch, so they must be
/// shareable across the tasks a handler may suspend on.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a courier message",
    label = "missing `Message` implementation",
    note = "derive `Request`, `Notification` or `StreamRequest`, or implement `Message` manually."
)]
pub trait Message: Send + Sync + 'static {}

/// A message answered by exactly one handler.
pub trait Request: Message {
    /// Value produced by the handler. Use `()` for requests without a result.
    type Response: Send + Sync + 'static;
}

/// A message delivered to every matching handler.
pub trait Notification: Message {}

/// A request whose handler yields a stream of items.
pub trait StreamRequest: Message {
    /// Element type of the produced stream.
    type Item: Send + 'static;
}
