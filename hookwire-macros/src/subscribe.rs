//! `#[listener]` - submit a function to a named channel at link time.

use proc_macro::TokenStream;
use quote::quote;
use syn::{FnArg, Ident, ItemFn, LitStr, ReturnType, Token, parse::Parse, parse_macro_input};

/// Arguments for the `#[listener]` macro.
pub(crate) struct ListenerArgs {
    /// Channel to subscribe to.
    pub channel: LitStr,
    /// Diagnostic name; defaults to the function name.
    pub name: Option<LitStr>,
}

impl Parse for ListenerArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut channel = None;
        let mut name = None;

        // Positional channel name first: #[listener("round_start")]
        if input.peek(LitStr) {
            channel = Some(input.parse()?);
        }

        while !input.is_empty() {
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }

            if input.is_empty() {
                break;
            }

            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "channel" => channel = Some(input.parse()?),
                "name" => name = Some(input.parse()?),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }
        }

        match channel {
            Some(channel) => Ok(ListenerArgs { channel, name }),
            None => Err(input.error("expected a channel name: #[listener(\"channel\")]")),
        }
    }
}

fn validate(input: &ItemFn) -> syn::Result<()> {
    let sig = &input.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "listener functions are called synchronously and cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "listener functions cannot be generic",
        ));
    }
    if sig.inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "listener functions take exactly one argument: fn(ctx: &mut CallContext)",
        ));
    }
    if let Some(FnArg::Receiver(receiver)) = sig.inputs.first() {
        return Err(syn::Error::new_spanned(
            receiver,
            "listener functions cannot take self",
        ));
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        return Err(syn::Error::new_spanned(ty, "listener functions return nothing"));
    }
    Ok(())
}

/// Implementation of the `#[listener]` macro.
///
/// Keeps the function as written and submits it to the collected listener
/// set for the given channel.
///
/// # Usage
///
/// ```rust,ignore
/// #[hookwire::listener("round_start")]
/// fn announce(ctx: &mut CallContext) {
///     // ...
/// }
///
/// #[hookwire::listener(channel = "round_end", name = "scoreboard")]
/// fn tally(ctx: &mut CallContext) {
///     // ...
/// }
///
/// // At startup
/// registry.install_collected();
/// ```
pub fn listener_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ListenerArgs);
    let input = parse_macro_input!(item as ItemFn);

    expand(&args, &input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: &ListenerArgs, input: &ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    validate(input)?;

    let fn_name = &input.sig.ident;
    let channel = &args.channel;
    let name = match &args.name {
        Some(name) => quote! { #name },
        None => quote! { ::core::stringify!(#fn_name) },
    };

    Ok(quote! {
        #input

        ::hookwire::inventory::submit! {
            ::hookwire::CollectedListener::new(#channel, #name, #fn_name)
        }
    })
}
