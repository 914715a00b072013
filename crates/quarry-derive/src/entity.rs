//! Entity derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let table_name = match get_table_name(&input)? {
        Some(table) => quote! { ::core::option::Option::Some(#table) },
        None => quote! { ::core::option::Option::None },
    };
    let type_name = name.unraw().to_string();

    let mut schemas = Vec::with_capacity(fields.len());
    let mut getters = Vec::with_capacity(fields.len());
    let mut zero_checks = Vec::with_capacity(fields.len());
    let mut setters = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let ty = &field.ty;
        let field_name = ident.unraw().to_string();
        let type_str = quote!(#ty).to_string().replace(' ', "");
        let tag = get_tag(field)?;

        schemas.push(quote! {
            ::quarry::model::FieldSchema::new::<#ty>(
                #field_name,
                #tag,
                #type_str,
                ::core::mem::offset_of!(Self, #ident),
            )
        });
        getters.push(quote! {
            #index => ::core::option::Option::Some(::quarry::FieldValue::to_value(&self.#ident)),
        });
        zero_checks.push(quote! {
            #index => ::quarry::FieldValue::is_zero(&self.#ident),
        });
        setters.push(quote! {
            #field_name => {
                self.#ident = <#ty as ::quarry::FieldValue>::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        });
    }

    // The impl is `unsafe`: every schema entry pairs a field's own type with
    // its `offset_of!` in this struct.
    Ok(quote! {
        unsafe impl #impl_generics ::quarry::Entity for #name #ty_generics #where_clause {
            const KIND: ::quarry::EntityKind = ::quarry::EntityKind::Struct;

            fn schema() -> ::quarry::model::StructSchema {
                ::quarry::model::StructSchema {
                    type_name: #type_name,
                    table_name: #table_name,
                    fields: ::std::vec![#(#schemas),*],
                }
            }

            fn field_value(&self, index: usize) -> ::core::option::Option<::quarry::Value> {
                match index {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_is_zero(&self, index: usize) -> bool {
                match index {
                    #(#zero_checks)*
                    _ => false,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::quarry::Value,
            ) -> ::quarry::OrmResult<()> {
                match name {
                    #(#setters)*
                    _ => ::core::result::Result::Err(::quarry::OrmError::unknown_field(name)),
                }
            }
        }
    })
}

/// `#[orm(table = "...")]` on the struct.
fn get_table_name(input: &DeriveInput) -> Result<Option<String>> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported orm struct attribute, expected `table`"))
            }
        })?;
    }
    Ok(table)
}

/// Raw tag string for a field. `column = "x"` is shorthand for `tag = "column=x"`.
fn get_tag(field: &syn::Field) -> Result<String> {
    let mut tag = String::new();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                let lit: LitStr = meta.value()?.parse()?;
                tag = lit.value();
                Ok(())
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                tag = format!("column={}", lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported orm field attribute, expected `column` or `tag`"))
            }
        })?;
    }
    Ok(tag)
}
