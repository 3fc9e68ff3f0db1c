//! Procedural macros for hookwire.
//!
//! Use through the `hookwire` crate with the `macros` feature enabled.

use proc_macro::TokenStream;

mod subscribe;

/// Submit a listener function to a named channel.
///
/// The function must have the shape `fn(&mut CallContext)`. It is kept
/// unchanged and registered with the collected listener set; the host
/// installs collected listeners with `Registry::install_collected`.
///
/// ```rust,ignore
/// #[hookwire::listener("round_start")]
/// fn on_round_start(ctx: &mut CallContext) {
///     ctx.set_result(1_u32).ok();
/// }
/// ```
#[proc_macro_attribute]
pub fn listener(attr: TokenStream, item: TokenStream) -> TokenStream {
    subscribe::listener_impl(attr, item)
}
