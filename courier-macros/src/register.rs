//! The `#[register]` attribute.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Expr, GenericArgument, Ident, ItemImpl, PathArguments, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input, parse_quote,
};

/// Arguments for the `#[register]` macro.
pub(crate) struct RegisterArgs {
    /// Expression building the handler. Defaults to `Default::default()`.
    pub constructor: Option<Expr>,
}

impl Parse for RegisterArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut constructor = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "constructor" => {
                    constructor = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(RegisterArgs { constructor })
    }
}

/// Candidate method for each handler trait.
const CONTRACTS: &[(&str, &str)] = &[
    ("RequestHandler", "request_handler"),
    ("NotificationHandler", "notification_handler"),
    ("PipelineBehavior", "pipeline_behavior"),
    ("RequestPreProcessor", "pre_processor"),
    ("RequestPostProcessor", "post_processor"),
    ("StreamRequestHandler", "stream_handler"),
];

/// Implementation of the `#[register]` attribute macro.
pub fn register_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RegisterArgs);
    let input = parse_macro_input!(item as ItemImpl);

    match submission(&args, &input) {
        Ok(submit) => TokenStream::from(quote! {
            #input
            #submit
        }),
        Err(err) => err.to_compile_error().into(),
    }
}

fn submission(args: &RegisterArgs, input: &ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[register] needs a concrete impl; describe generic handlers with TypeDescriptor::generic",
        ));
    }
    let Some((_, trait_path, _)) = &input.trait_ else {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[register] must be placed on a handler trait impl",
        ));
    };
    let Some(segment) = trait_path.segments.last() else {
        return Err(syn::Error::new_spanned(trait_path, "empty trait path"));
    };

    let trait_name = segment.ident.to_string();
    let Some((_, method)) = CONTRACTS.iter().find(|(name, _)| *name == trait_name) else {
        return Err(syn::Error::new_spanned(
            &segment.ident,
            format!("`{trait_name}` is not a handler trait"),
        ));
    };
    let method = Ident::new(method, segment.ident.span());
    let message = message_type(&segment.arguments).ok_or_else(|| {
        syn::Error::new_spanned(segment, "expected the message type as the trait argument")
    })?;

    let self_ty = &input.self_ty;
    let constructor: Expr = match &args.constructor {
        Some(expr) => expr.clone(),
        None => parse_quote!(<#self_ty as ::core::default::Default>::default()),
    };

    Ok(quote! {
        const _: () = {
            fn __courier_candidate() -> ::courier::TypeDescriptor {
                ::courier::Candidate::<#self_ty>::new(|| #constructor)
                    .#method::<#message>()
                    .into_descriptor()
            }

            ::courier::inventory::submit! {
                ::courier::discovery::CandidateRegistration::new(
                    ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#self_ty)),
                    ::core::stringify!(#trait_path),
                    __courier_candidate,
                )
            }
        };
    })
}

fn message_type(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
