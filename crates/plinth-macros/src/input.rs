//! `#[derive(Input)]` expansion.
//!
//! Generates `Input` (descriptor plus assembly) and `Walk` for a struct with
//! named fields. Slot indices follow the order of bound fields; skipped
//! fields take no slot.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Fields, Ident, Path, Type};

use crate::parse::{field_name, Binding, ContainerAttrs, FieldAttrs};

struct BoundField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
    binding: Binding,
}

/// Expands `#[derive(Input)]`.
pub fn expand_input(input: DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::from_attrs(&input.attrs, "input")?;
    let runtime = container.runtime();

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Input can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.ident.span(),
                "Input can only be derived for structs",
            ))
        }
    };

    let mut fields = Vec::with_capacity(named.len());
    let mut body: Option<&Ident> = None;
    let mut raw_body: Option<&Ident> = None;

    for field in named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.span(), "expected named field"))?;
        let mut attrs = FieldAttrs::from_attrs(&field.attrs)?;
        let binding = attrs.binding.take().ok_or_else(|| {
            syn::Error::new(
                ident.span(),
                "field needs a binding: #[input(query|header|path = \"..\")], \
                 #[input(body)], #[input(raw_body)] or #[input(skip)]",
            )
        })?;

        match binding {
            Binding::Body => {
                if let Some(first) = body {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("body is already bound to `{first}`"),
                    ));
                }
                body = Some(ident);
            }
            Binding::RawBody => {
                if let Some(first) = raw_body {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("raw body is already captured by `{first}`"),
                    ));
                }
                if attrs.schema.is_some() {
                    return Err(syn::Error::new(
                        ident.span(),
                        "raw body fields cannot declare a schema",
                    ));
                }
                raw_body = Some(ident);
            }
            _ => {}
        }

        fields.push(BoundField {
            ident,
            ty: &field.ty,
            attrs,
            binding,
        });
    }

    let name = &input.ident;
    let shape = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut descriptors = Vec::new();
    let mut assignments = Vec::new();
    let mut slot = 0usize;
    for field in &fields {
        let ident = field.ident;
        if field.binding == Binding::Skip {
            assignments.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }
        descriptors.push(describe_field(field, &runtime));
        assignments.push(assemble_field(field, slot));
        slot += 1;
    }

    let resolver = container.resolve.then(|| {
        quote! {
            fn resolver(&self) -> ::core::option::Option<&dyn #runtime::Resolve> {
                ::core::option::Option::Some(self)
            }
        }
    });

    let walk_body = body.map(|ident| {
        quote! { walker.field("body", &self.#ident); }
    });

    Ok(quote! {
        impl #impl_generics #runtime::Input for #name #ty_generics #where_clause {
            fn describe() -> ::core::result::Result<#runtime::TypeDescriptor, #runtime::DescriptorError> {
                #runtime::TypeDescriptor::builder(#shape)
                    #( .field(#descriptors) )*
                    .build()
            }

            #[allow(unused_variables)]
            fn assemble(bound: &mut #runtime::Bound<'_>) -> ::core::option::Option<Self> {
                ::core::option::Option::Some(Self {
                    #( #assignments, )*
                })
            }
        }

        impl #impl_generics #runtime::Walk for #name #ty_generics #where_clause {
            #resolver

            #[allow(unused_variables)]
            fn walk_children(&self, walker: &mut #runtime::Walker<'_>) {
                #walk_body
            }
        }
    })
}

fn describe_field(field: &BoundField<'_>, runtime: &Path) -> TokenStream {
    let name = field_name(field.ident);
    let ty = field.ty;

    let base = match &field.binding {
        Binding::Query(key) => param(runtime, &name, quote!(Query), key, ty),
        Binding::Header(key) => param(runtime, &name, quote!(Header), key, ty),
        Binding::Path(key) => param(runtime, &name, quote!(Path), key, ty),
        Binding::Body => quote! { #runtime::FieldDescriptor::body(#name) },
        Binding::RawBody => quote! { #runtime::FieldDescriptor::raw_body(#name) },
        Binding::Skip => TokenStream::new(),
    };

    let schema = field.attrs.schema.as_ref().map(|path| {
        quote! { .with_constraints(#path()) }
    });
    let time_format = field.attrs.time_format.as_ref().map(|format| {
        quote! { .with_time_format(#format) }
    });

    quote! { #base #schema #time_format }
}

fn param(runtime: &Path, name: &str, source: TokenStream, key: &str, ty: &Type) -> TokenStream {
    quote! {
        #runtime::FieldDescriptor::param(
            #name,
            #runtime::Source::#source,
            #key,
            <#ty as #runtime::FromParam>::kind(),
        )
    }
}

fn assemble_field(field: &BoundField<'_>, slot: usize) -> TokenStream {
    let ident = field.ident;
    let ty = field.ty;
    match field.binding {
        Binding::Body => quote! { #ident: bound.body::<#ty>(#slot)? },
        Binding::RawBody => quote! { #ident: bound.raw_body::<#ty>(#slot) },
        _ => quote! { #ident: bound.param::<#ty>(#slot) },
    }
}
