//! Attribute parsing for the Table derive macro.
//!
//! Struct level: `#[crud(table = "...", schema = "...", syntax = "...", no_inserts, no_updates, no_deletes)]`.
//! Field level: see [`FieldAttrs`].

use proc_macro2::Span;
use syn::{Error, Result};

use crate::sql_ident::parse_sql_ident;

#[derive(Default)]
pub(super) struct StructAttrs {
    pub(super) table: Option<String>,
    pub(super) schema: Option<String>,
    pub(super) syntax: Option<syn::Ident>,
    pub(super) no_inserts: bool,
    pub(super) no_updates: bool,
    pub(super) no_deletes: bool,
}

/// `ignore_insert`, `ignore_update` or `match_update`, optionally with
/// `(value = "<sql>", auto_sync)`.
#[derive(Default)]
pub(super) struct OverrideAttr {
    pub(super) value: Option<String>,
    pub(super) auto_sync: bool,
}

#[derive(Default)]
pub(super) struct FieldAttrs {
    pub(super) key: bool,
    pub(super) auto_increment: bool,
    pub(super) column: Option<String>,
    pub(super) ordinal: Option<i32>,
    pub(super) skip: bool,
    pub(super) ignore_select: bool,
    pub(super) ignore_insert: Option<OverrideAttr>,
    pub(super) ignore_update: Option<OverrideAttr>,
    pub(super) match_update: Option<OverrideAttr>,
    pub(super) match_delete: bool,
}

fn set_once<T>(slot: &mut Option<T>, value: T, ident: &syn::Ident) -> Result<()> {
    if slot.is_some() {
        return Err(Error::new(ident.span(), format!("duplicate `{ident}`")));
    }
    *slot = Some(value);
    Ok(())
}

fn set_flag(flag: &mut bool, ident: &syn::Ident) -> Result<()> {
    if *flag {
        return Err(Error::new(ident.span(), format!("duplicate `{ident}`")));
    }
    *flag = true;
    Ok(())
}

fn syntax_variant(value: &syn::LitStr) -> Result<syn::Ident> {
    let variant = match value.value().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => "Postgres",
        "sqlserver" | "mssql" => "SqlServer",
        "mysql" => "MySql",
        "sqlite" => "Sqlite",
        other => {
            return Err(Error::new(
                value.span(),
                format!(
                    "unknown syntax `{other}` (expected postgres, sqlserver, mysql or sqlite)"
                ),
            ));
        }
    };
    Ok(syn::Ident::new(variant, value.span()))
}

impl syn::parse::Parse for StructAttrs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attrs = Self::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                match key.as_str() {
                    "table" => set_once(&mut attrs.table, parse_sql_ident(&value, "table")?, &ident)?,
                    "schema" => set_once(&mut attrs.schema, parse_sql_ident(&value, "schema")?, &ident)?,
                    "syntax" => set_once(&mut attrs.syntax, syntax_variant(&value)?, &ident)?,
                    _ => return Err(Error::new(ident.span(), format!("unknown attribute `{key}`"))),
                }
            } else {
                match key.as_str() {
                    "no_inserts" => set_flag(&mut attrs.no_inserts, &ident)?,
                    "no_updates" => set_flag(&mut attrs.no_updates, &ident)?,
                    "no_deletes" => set_flag(&mut attrs.no_deletes, &ident)?,
                    _ => return Err(Error::new(ident.span(), format!("unknown attribute `{key}`"))),
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attrs)
    }
}

impl syn::parse::Parse for OverrideAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = Self::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            match ident.to_string().as_str() {
                "value" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    if value.value().trim().is_empty() {
                        return Err(Error::new(value.span(), "value must not be empty"));
                    }
                    set_once(&mut attr.value, value.value(), &ident)?;
                }
                "auto_sync" => set_flag(&mut attr.auto_sync, &ident)?,
                other => {
                    return Err(Error::new(
                        ident.span(),
                        format!("unknown option `{other}` (expected value or auto_sync)"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

impl FieldAttrs {
    /// Parse one `#[crud(...)]` into `self`. Keys set by an earlier attribute are duplicates.
    fn parse_into(&mut self, input: syn::parse::ParseStream) -> Result<()> {
        let attrs = self;

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            if input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in input);
                let parsed: OverrideAttr = content.parse()?;
                match key.as_str() {
                    "ignore_insert" => set_once(&mut attrs.ignore_insert, parsed, &ident)?,
                    "ignore_update" => set_once(&mut attrs.ignore_update, parsed, &ident)?,
                    "match_update" => set_once(&mut attrs.match_update, parsed, &ident)?,
                    _ => {
                        return Err(Error::new(
                            ident.span(),
                            format!("`{key}` does not take options"),
                        ));
                    }
                }
            } else if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                match key.as_str() {
                    "column" => {
                        let value: syn::LitStr = input.parse()?;
                        set_once(&mut attrs.column, parse_sql_ident(&value, "column")?, &ident)?;
                    }
                    "ordinal" => {
                        let negative = input.peek(syn::Token![-]);
                        if negative {
                            let _: syn::Token![-] = input.parse()?;
                        }
                        let value: syn::LitInt = input.parse()?;
                        let ordinal = value.base10_parse::<i32>()?;
                        let ordinal = if negative { -ordinal } else { ordinal };
                        set_once(&mut attrs.ordinal, ordinal, &ident)?;
                    }
                    _ => return Err(Error::new(ident.span(), format!("unknown attribute `{key}`"))),
                }
            } else {
                match key.as_str() {
                    "key" | "id" => set_flag(&mut attrs.key, &ident)?,
                    "auto_key" | "auto_increment" => set_flag(&mut attrs.auto_increment, &ident)?,
                    "skip" | "not_mapped" => set_flag(&mut attrs.skip, &ident)?,
                    "ignore_select" => set_flag(&mut attrs.ignore_select, &ident)?,
                    "ignore_insert" => set_once(&mut attrs.ignore_insert, OverrideAttr::default(), &ident)?,
                    "ignore_update" => set_once(&mut attrs.ignore_update, OverrideAttr::default(), &ident)?,
                    "match_update" => set_once(&mut attrs.match_update, OverrideAttr::default(), &ident)?,
                    "match_delete" => set_flag(&mut attrs.match_delete, &ident)?,
                    _ => return Err(Error::new(ident.span(), format!("unknown attribute `{key}`"))),
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(())
    }
}

/// Merge every `#[crud(...)]` on the struct.
pub(super) fn struct_attrs(input: &syn::DeriveInput) -> Result<StructAttrs> {
    let mut merged = StructAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("crud") {
            continue;
        }
        let parsed: StructAttrs = attr.parse_args()?;
        let span = Span::call_site();
        let dup = |what: &str| Error::new(span, format!("duplicate `{what}`"));
        if let Some(table) = parsed.table {
            if merged.table.replace(table).is_some() {
                return Err(dup("table"));
            }
        }
        if let Some(schema) = parsed.schema {
            if merged.schema.replace(schema).is_some() {
                return Err(dup("schema"));
            }
        }
        if let Some(syntax) = parsed.syntax {
            if merged.syntax.replace(syntax).is_some() {
                return Err(dup("syntax"));
            }
        }
        merged.no_inserts |= parsed.no_inserts;
        merged.no_updates |= parsed.no_updates;
        merged.no_deletes |= parsed.no_deletes;
    }
    Ok(merged)
}

/// Merge every `#[crud(...)]` on a field. Fields without one get the defaults.
pub(super) fn field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if attr.path().is_ident("crud") {
            attr.parse_args_with(|input: syn::parse::ParseStream| attrs.parse_into(input))?;
        }
    }
    Ok(attrs)
}
