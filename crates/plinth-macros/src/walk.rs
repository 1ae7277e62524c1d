//! `#[derive(Walk)]` expansion.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, Data, DeriveInput, Fields, Index};

use crate::parse::{field_name, serde_rename, serde_rename_all, ContainerAttrs, WalkFieldAttrs};

/// Expands `#[derive(Walk)]`.
pub fn expand_walk(mut input: DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::from_attrs(&input.attrs, "walk")?;
    let runtime = container.runtime();
    let rename_all = serde_rename_all(&input.attrs);

    let visits = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => {
                let mut visits = Vec::new();
                for field in &named.named {
                    let attrs = WalkFieldAttrs::from_attrs(&field.attrs)?;
                    if attrs.skip {
                        continue;
                    }
                    let Some(ident) = field.ident.as_ref() else {
                        continue;
                    };
                    let wire = attrs
                        .rename
                        .or_else(|| serde_rename(&field.attrs))
                        .unwrap_or_else(|| {
                            let name = field_name(ident);
                            rename_all.map_or_else(|| name.clone(), |rule| rule.apply(&name))
                        });
                    visits.push(quote! { walker.field(#wire, &self.#ident); });
                }
                visits
            }
            Fields::Unnamed(unnamed) => {
                let mut visits = Vec::new();
                for (i, field) in unnamed.unnamed.iter().enumerate() {
                    let attrs = WalkFieldAttrs::from_attrs(&field.attrs)?;
                    if attrs.skip {
                        continue;
                    }
                    let index = Index::from(i);
                    // Newtypes are transparent; wider tuples are addressed by position.
                    if unnamed.unnamed.len() == 1 {
                        visits.push(quote! { walker.visit(&self.#index); });
                    } else {
                        let wire = attrs.rename.unwrap_or_else(|| i.to_string());
                        visits.push(quote! { walker.field(#wire, &self.#index); });
                    }
                }
                visits
            }
            Fields::Unit => Vec::new(),
        },
        Data::Enum(data) => {
            if let Some(variant) = data.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
                return Err(syn::Error::new_spanned(
                    &variant.ident,
                    "Walk can only be derived for enums whose variants carry no data; \
                     implement Walk by hand",
                ));
            }
            Vec::new()
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.ident.span(),
                "Walk cannot be derived for unions",
            ))
        }
    };

    let params: Vec<_> = input
        .generics
        .type_params()
        .map(|p| p.ident.clone())
        .collect();
    let where_clause = input.generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote!(#param: #runtime::Walk));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let resolver = container.resolve.then(|| {
        quote! {
            fn resolver(&self) -> ::core::option::Option<&dyn #runtime::Resolve> {
                ::core::option::Option::Some(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics #runtime::Walk for #name #ty_generics #where_clause {
            #resolver

            #[allow(unused_variables)]
            fn walk_children(&self, walker: &mut #runtime::Walker<'_>) {
                #( #visits )*
            }
        }
    })
}
