//! `#[orm(...)]` attribute parsing.

use crate::sql_ident::parse_sql_ident_with_span;
use heck::ToSnakeCase;
use syn::{DeriveInput, LitStr, Result};

/// Field-level `#[orm(...)]` contents.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub is_id: bool,
    pub skip: bool,
    pub column: Option<LitStr>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "id" {
                attr.is_id = true;
            } else if ident == "skip" {
                attr.skip = true;
            } else if ident == "column" {
                let _: syn::Token![=] = input.parse()?;
                attr.column = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("unknown field attribute `{ident}` (expected id, skip or column)"),
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("unexpected tokens in #[orm(...)]"));
        }
        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` on a field.
pub(crate) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.skip |= parsed.skip;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
    }
    Ok(merged)
}

/// Table name from `#[orm(table = "...")]`, or the snake_case struct name.
pub(crate) fn table_name(input: &DeriveInput) -> Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "expected #[orm(table = \"table_name\")]",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return parse_sql_ident_with_span(&lit.value(), lit.span(), "table name");
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }

    let derived = input.ident.to_string().to_snake_case();
    parse_sql_ident_with_span(&derived, input.ident.span(), "table name")
}
