//! Implementation of the #[mapper] attribute macro.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{parse_macro_input, parse_quote, FnArg, Item, ItemTrait, Pat, TraitItem, TraitItemFn};

pub fn mapper_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(Span::call_site(), "#[mapper] takes no arguments")
            .to_compile_error()
            .into();
    }

    let item = parse_macro_input!(item as Item);
    let result = match item {
        Item::Trait(item_trait) => expand(item_trait),
        other => Err(syn::Error::new_spanned(
            other,
            "#[mapper] can only be applied to traits",
        )),
    };

    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A required trait method that the proxy forwards.
struct ForwardedMethod {
    item: TraitItemFn,
    params: Vec<syn::Ident>,
}

fn expand(mut item_trait: ItemTrait) -> syn::Result<TokenStream2> {
    if !item_trait.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item_trait.generics,
            "mapper traits cannot be generic",
        ));
    }

    let mut forwarded = Vec::new();
    for trait_item in &item_trait.items {
        match trait_item {
            TraitItem::Fn(method) if method.default.is_none() => {
                forwarded.push(forwarded_method(method)?);
            }
            TraitItem::Fn(_) => {}
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "mapper traits may only declare methods",
                ));
            }
        }
    }

    if item_trait.colon_token.is_none() {
        item_trait.colon_token = Some(Default::default());
    }
    item_trait.supertraits.push(parse_quote!(::core::marker::Send));
    item_trait.supertraits.push(parse_quote!(::core::marker::Sync));

    let vis = &item_trait.vis;
    let ident = &item_trait.ident;
    let ident_str = ident.to_string();
    let proxy = format_ident!("__{}MapperProxy", ident);

    // Proxy bodies: bind each named argument, then dispatch by method name
    let method_impls = forwarded.iter().map(|method| {
        let sig = &method.item.sig;
        let name = sig.ident.to_string();
        let binds = method.params.iter().map(|param| {
            let param_str = param.to_string();
            quote! { __params.bind(#param_str, &#param)?; }
        });

        quote! {
            #sig {
                #[allow(unused_mut)]
                let mut __params = ::mapwire::Params::new();
                #(#binds)*
                ::core::result::Result::Ok(self.0.invoke(#name, __params)?)
            }
        }
    });

    let method_descriptors = forwarded.iter().map(|method| {
        let name = method.item.sig.ident.to_string();
        let params = method.params.iter().map(|param| param.to_string());
        quote! { ::mapwire::MethodDescriptor::new(#name, &[#(#params),*]) }
    });

    Ok(quote! {
        #item_trait

        #[doc(hidden)]
        #vis struct #proxy(::mapwire::MapperProxy);

        #[allow(clippy::needless_question_mark)]
        impl #ident for #proxy {
            #(#method_impls)*
        }

        impl ::mapwire::MapperInterface for dyn #ident {
            fn descriptor() -> ::mapwire::InterfaceDescriptor {
                const METHODS: &[::mapwire::MethodDescriptor] = &[#(#method_descriptors),*];
                ::mapwire::InterfaceDescriptor::interface(
                    ::core::concat!(::core::module_path!(), "::", #ident_str),
                    #ident_str,
                    METHODS,
                )
            }

            fn proxy(handler: ::mapwire::MapperProxy) -> ::std::sync::Arc<Self> {
                ::std::sync::Arc::new(#proxy(handler))
            }
        }
    })
}

fn forwarded_method(method: &TraitItemFn) -> syn::Result<ForwardedMethod> {
    let sig = &method.sig;

    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(sig, "mapper methods cannot be async"));
    }
    if sig.generics.type_params().next().is_some() || sig.generics.const_params().next().is_some() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "mapper methods cannot have type or const parameters",
        ));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "mapper methods must take `&self`",
            ));
        }
    }

    let mut params = Vec::new();
    for input in inputs {
        let FnArg::Typed(pat_type) = input else {
            return Err(syn::Error::new_spanned(input, "unexpected receiver"));
        };
        match pat_type.pat.as_ref() {
            Pat::Ident(pat_ident) if pat_ident.subpat.is_none() => {
                params.push(pat_ident.ident.clone());
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "mapper parameters must be plain identifiers",
                ));
            }
        }
    }

    Ok(ForwardedMethod {
        item: method.clone(),
        params,
    })
}
