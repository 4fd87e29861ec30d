#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Not an issue in a macro crate"
)]
//! Procedural macros checking SID and GUID literals at compile time.
mod expand;
use expand::{guid_impl, sid_impl};
use proc_macro::TokenStream;

use syn::{LitStr, parse_macro_input};

/// Expands a SID string to a `ConstSid<N>` constant expression.
///
/// A malformed string, or a revision other than 1, is a compile error.
#[proc_macro]
pub fn sid(input: TokenStream) -> TokenStream {
    let lit = parse_macro_input!(input as LitStr);
    match sid_impl(&lit) {
        Ok(token_stream) => token_stream,
        Err(err) => err.to_compile_error(),
    }
    .into()
}

/// Expands a GUID string to a `Guid` constant expression.
#[proc_macro]
pub fn guid(input: TokenStream) -> TokenStream {
    let lit = parse_macro_input!(input as LitStr);
    match guid_impl(&lit) {
        Ok(token_stream) => token_stream,
        Err(err) => err.to_compile_error(),
    }
    .into()
}
