use parsing::{GuidComponents, SidComponents};
use proc_macro_crate::{Error as MacroCrateError, FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::LitStr;

fn root() -> Result<TokenStream, syn::Error> {
    crate_root("win-security-descriptor").map_err(|err| {
        syn::Error::new(Span::call_site(), format!("Root crate not found:{err}"))
    })
}

pub fn sid_impl(input: &LitStr) -> Result<TokenStream, syn::Error> {
    let components: SidComponents = input
        .value()
        .parse()
        .map_err(|e| syn::Error::new_spanned(input, e))?;
    if components.revision != 1 {
        return Err(syn::Error::new_spanned(input, "SID revision must be 1"));
    }
    let authority = components.identifier_authority;
    let sub_authority = components.sub_authority.as_slice();
    let len = sub_authority.len();
    let root = root()?;

    let expanded = quote! {
        #root::ConstSid::<#len>::new(
            #root::SidIdentifierAuthority { value: [#(#authority),*] },
            [#(#sub_authority),*]
        )
    };
    Ok(expanded)
}

pub fn guid_impl(input: &LitStr) -> Result<TokenStream, syn::Error> {
    let components: GuidComponents = input
        .value()
        .parse()
        .map_err(|e| syn::Error::new_spanned(input, e))?;
    let bytes = components.bytes;
    let root = root()?;

    let expanded = quote! {
        #root::Guid::from_wire([#(#bytes),*])
    };
    Ok(expanded)
}

fn crate_root(name: &str) -> Result<TokenStream, MacroCrateError> {
    crate_name(name).map(|found| match found {
        FoundCrate::Name(found_name) => {
            let ident = syn::Ident::new(&found_name, Span::call_site());
            quote!(::#ident)
        }
        FoundCrate::Itself => quote!(crate),
    })
}
