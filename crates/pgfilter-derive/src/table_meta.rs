//! `#[derive(TableMeta)]` expansion.

use crate::attrs::{field_attr, table_name};
use crate::sql_ident::parse_sql_ident_with_span;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub(crate) fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let table = table_name(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "TableMeta can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "TableMeta can only be derived for structs",
            ));
        }
    };

    let mut columns: Vec<String> = Vec::new();
    let mut primary_key: Option<String> = None;

    for field in fields {
        let attr = field_attr(field)?;
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        if attr.skip {
            if attr.is_id {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "#[orm(id)] field cannot be skipped",
                ));
            }
            continue;
        }

        let column = match &attr.column {
            Some(lit) => parse_sql_ident_with_span(&lit.value(), lit.span(), "column name")?,
            None => {
                let raw = field_ident.to_string();
                let raw = raw.strip_prefix("r#").unwrap_or(&raw);
                parse_sql_ident_with_span(raw, field_ident.span(), "column name")?
            }
        };

        if columns.contains(&column) {
            return Err(syn::Error::new_spanned(
                field_ident,
                format!("duplicate column '{column}'"),
            ));
        }

        if attr.is_id {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "only one field may be marked #[orm(id)]",
                ));
            }
            primary_key = Some(column.clone());
        }

        columns.push(column);
    }

    if columns.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "TableMeta requires at least one column",
        ));
    }

    let primary_key = match primary_key {
        Some(pk) => quote! { ::core::option::Option::Some(#pk) },
        None => quote! { ::core::option::Option::None },
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::pgfilter::TableMeta for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table
            }

            fn columns() -> &'static [&'static str] {
                &[#(#columns),*]
            }

            fn primary_key() -> ::core::option::Option<&'static str> {
                #primary_key
            }
        }
    })
}
