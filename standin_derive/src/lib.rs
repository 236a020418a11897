// vim: tw=80
//! Proc macros for use with standin
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the `standin` crate.

#![cfg_attr(feature = "nightly_derive", feature(proc_macro_diagnostic))]
#![cfg_attr(test, deny(warnings))]
extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    *,
    ext::IdentExt,
    spanned::Spanned
};

cfg_if! {
    // proc-macro2's Span::unstable method requires the nightly feature, and it
    // doesn't work in test mode.
    // https://github.com/alexcrichton/proc-macro2/issues/159
    if #[cfg(all(feature = "nightly_derive", not(test)))] {
        fn compile_error(span: Span, msg: &'static str) {
            span.unstable()
                .error(msg)
                .emit();
        }
    } else {
        fn compile_error(_span: Span, msg: &str) {
            panic!("{}.  More information may be available when standin is built with the \"nightly\" feature.", msg);
        }
    }
}

/// Strip any `r#` prefix, so `r#type` is declared as `type`
fn member_name(ident: &Ident) -> String {
    ident.unraw().to_string()
}

/// Best-effort human readable name for the implementing type
fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(tp) if tp.qself.is_none() => {
            tp.path.segments.last()
                .map(|seg| seg.ident.to_string())
                .unwrap_or_default()
        },
        _ => quote!(#ty).to_string()
    }
}

fn specify_impl(item: &ItemImpl) -> TokenStream {
    let members = item.items.iter()
        .filter_map(|ii| match ii {
            ImplItem::Fn(f) => Some(member_name(&f.sig.ident)),
            ImplItem::Const(c) => Some(member_name(&c.ident)),
            _ => None
        }).collect::<Vec<_>>();
    let (ig, _tg, wc) = item.generics.split_for_impl();
    let self_ty = &item.self_ty;
    let name = type_name(self_ty);
    quote!(
        impl #ig ::standin::Specification for #self_ty #wc {
            const NAME: &'static str = #name;
            const MEMBERS: &'static [&'static str] = &[#(#members),*];
        }
    )
}

fn specify_trait(item: &ItemTrait) -> TokenStream {
    if !item.generics.params.is_empty() {
        compile_error(item.generics.span(),
            "#[specify] does not support generic traits");
        return TokenStream::new();
    }
    let members = item.items.iter()
        .filter_map(|ti| match ti {
            TraitItem::Fn(f) => Some(member_name(&f.sig.ident)),
            TraitItem::Const(c) => Some(member_name(&c.ident)),
            _ => None
        }).collect::<Vec<_>>();
    let ident = &item.ident;
    let name = ident.to_string();
    quote!(
        impl ::standin::Specification for dyn #ident {
            const NAME: &'static str = #name;
            const MEMBERS: &'static [&'static str] = &[#(#members),*];
        }
    )
}

fn do_specify(attrs: TokenStream, input: TokenStream) -> TokenStream {
    if !attrs.is_empty() {
        compile_error(attrs.span(), "#[specify] does not take arguments");
    }
    let item: Item = match parse2(input.clone()) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error()
    };
    let spec = match &item {
        Item::Impl(ii) => specify_impl(ii),
        Item::Trait(it) => specify_trait(it),
        _ => {
            compile_error(item.span(),
                "#[specify] only supports impl blocks and traits");
            TokenStream::new()
        }
    };
    quote!(
        #input
        #spec
    )
}

/// Implement `Specification` from the members an item declares.
///
/// On an `impl` block the implementing type gets the names of the block's
/// methods and associated constants.  On a trait, `dyn Trait` gets the names
/// of the trait's methods and constants.  A type can only have one
/// specification, so put the attribute on one `impl` block per type.
///
/// # Examples
/// ```ignore
/// # use standin::*;
/// struct Calc;
///
/// #[specify]
/// impl Calc {
///     const ZERO: i32 = 0;
///     fn add(&self, a: i32, b: i32) -> i32 { a + b }
/// }
///
/// assert_eq!(<Calc as Specification>::MEMBERS, &["ZERO", "add"]);
/// ```
#[proc_macro_attribute]
pub fn specify(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    do_specify(attrs.into(), input.into()).into()
}
