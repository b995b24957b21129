//! Procedural macros for Courier.
//!
//! - `#[derive(Request)]`, `#[derive(Notification)]`, `#[derive(StreamRequest)]`
//! - `#[register]` to submit a handler impl for link-time discovery

use proc_macro::TokenStream;

mod message;
mod register;

/// Derives `Message` and `Request`.
///
/// The response type is given with `#[request(response = T)]` and defaults to
/// `()`.
///
/// ```rust,ignore
/// #[derive(Request)]
/// #[request(response = Vec<User>)]
/// struct ListUsers;
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    message::derive_request_impl(input)
}

/// Derives `Message` and `Notification`.
#[proc_macro_derive(Notification)]
pub fn derive_notification(input: TokenStream) -> TokenStream {
    message::derive_notification_impl(input)
}

/// Derives `Message` and `StreamRequest`.
///
/// The item type is required: `#[stream(item = T)]`.
#[proc_macro_derive(StreamRequest, attributes(stream))]
pub fn derive_stream_request(input: TokenStream) -> TokenStream {
    message::derive_stream_request_impl(input)
}

/// Submits a handler impl as a discovery candidate.
///
/// Put it on an `impl` of one of the handler traits. The type is built with
/// `Default` unless a constructor expression is given:
///
/// ```rust,ignore
/// #[courier::register(constructor = Greeter::new("hello"))]
/// impl RequestHandler<Greet> for Greeter { ... }
/// ```
#[proc_macro_attribute]
pub fn register(attr: TokenStream, item: TokenStream) -> TokenStream {
    register::register_impl(attr, item)
}
