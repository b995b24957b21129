//! Message derives.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Type, parse_macro_input, parse_quote};

/// Implementation of `#[derive(Request)]`.
pub fn derive_request_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let response = match associated_type(&input, "request", "response") {
        Ok(response) => response.unwrap_or_else(|| parse_quote!(())),
        Err(err) => return err.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let message = message_impl(&input);

    let expanded = quote! {
        #message

        impl #impl_generics ::courier::Request for #name #ty_generics #where_clause {
            type Response = #response;
        }
    };
    TokenStream::from(expanded)
}

/// Implementation of `#[derive(Notification)]`.
pub fn derive_notification_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let message = message_impl(&input);

    let expanded = quote! {
        #message

        impl #impl_generics ::courier::Notification for #name #ty_generics #where_clause {}
    };
    TokenStream::from(expanded)
}

/// Implementation of `#[derive(StreamRequest)]`.
pub fn derive_stream_request_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let item = match associated_type(&input, "stream", "item") {
        Ok(Some(item)) => item,
        Ok(None) => {
            return syn::Error::new_spanned(
                &input.ident,
                "missing item type: add #[stream(item = T)]",
            )
            .to_compile_error()
            .into();
        }
        Err(err) => return err.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let message = message_impl(&input);

    let expanded = quote! {
        #message

        impl #impl_generics ::courier::StreamRequest for #name #ty_generics #where_clause {
            type Item = #item;
        }
    };
    TokenStream::from(expanded)
}

fn message_impl(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        impl #impl_generics ::courier::Message for #name #ty_generics #where_clause {}
    }
}

/// Reads `#[attr(key = Type)]`, rejecting any other key.
fn associated_type(input: &DeriveInput, attr: &str, key: &str) -> syn::Result<Option<Type>> {
    let mut found = None;
    for attribute in input.attrs.iter().filter(|a| a.path().is_ident(attr)) {
        attribute.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                found = Some(meta.value()?.parse::<Type>()?);
                Ok(())
            } else {
                Err(meta.error(format!("unknown attribute: expected `{key} = Type`")))
            }
        })?;
    }
    Ok(found)
}
