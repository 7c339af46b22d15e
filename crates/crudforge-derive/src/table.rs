//! Table derive macro implementation

mod attrs;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use attrs::{OverrideAttr, field_attrs, struct_attrs};

fn override_tokens(attr: &OverrideAttr) -> TokenStream {
    let base = match &attr.value {
        Some(value) => quote! { ::crudforge::Override::literal(#value) },
        None => quote! { ::crudforge::Override::NONE },
    };
    if attr.auto_sync {
        quote! { #base.auto_sync() }
    } else {
        base
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Table cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Table can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Table can only be derived for structs",
            ));
        }
    };

    let table_attrs = struct_attrs(&input)?;
    let type_name = name.to_string();
    let table = table_attrs.table.clone().unwrap_or_else(|| type_name.clone());

    let mut column_defs = Vec::new();
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let attrs = field_attrs(field)?;
        let field_name = ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name).to_string();

        // A key stays mapped even when also marked `skip`; classification gives keys precedence.
        if attrs.skip && !(attrs.key || attrs.auto_increment) {
            column_defs.push(quote! {
                ::crudforge::ColumnDef::new(#index, #field_name, ::crudforge::ScalarKind::Other)
                    .not_mapped()
            });
            continue;
        }

        let mut def = quote! {
            ::crudforge::ColumnDef::new(
                #index,
                #field_name,
                <#ty as ::crudforge::ToValue>::KIND,
            )
            .nullable(<#ty as ::crudforge::ToValue>::NULLABLE)
        };
        if let Some(column) = &attrs.column {
            def = quote! { #def.column(#column) };
        }
        if let Some(ordinal) = attrs.ordinal {
            def = quote! { #def.ordinal(#ordinal) };
        }
        if attrs.auto_increment {
            def = quote! { #def.auto_increment() };
        } else if attrs.key {
            def = quote! { #def.key() };
        }
        if attrs.ignore_select {
            def = quote! { #def.ignore_select() };
        }
        if let Some(o) = &attrs.ignore_insert {
            let o = override_tokens(o);
            def = quote! { #def.ignore_insert(#o) };
        }
        if let Some(o) = &attrs.ignore_update {
            let o = override_tokens(o);
            def = quote! { #def.ignore_update(#o) };
        }
        if let Some(o) = &attrs.match_update {
            let o = override_tokens(o);
            def = quote! { #def.match_update(#o) };
        }
        if attrs.match_delete {
            def = quote! { #def.match_delete() };
        }
        if attrs.skip {
            def = quote! { #def.not_mapped() };
        }
        column_defs.push(def);

        let column = attrs.column.clone().unwrap_or_else(|| field_name.clone());
        get_arms.push(quote! {
            #index => ::crudforge::ToValue::to_value(&self.#ident),
        });
        set_arms.push(quote! {
            #index => {
                self.#ident = <#ty as ::crudforge::FromValue>::from_value(value)
                    .map_err(|e| ::crudforge::OrmError::decode(#column, e.to_string()))?;
            }
        });
    }

    let schema = table_attrs
        .schema
        .as_ref()
        .map(|schema| quote! { .schema(#schema) });
    let syntax = table_attrs
        .syntax
        .as_ref()
        .map(|variant| quote! { .syntax(::crudforge::Syntax::#variant) });
    let no_inserts = table_attrs.no_inserts.then(|| quote! { .no_inserts() });
    let no_updates = table_attrs.no_updates.then(|| quote! { .no_updates() });
    let no_deletes = table_attrs.no_deletes.then(|| quote! { .no_deletes() });

    Ok(quote! {
        impl ::crudforge::Table for #name {
            const TABLE: ::crudforge::TableDef = {
                const COLUMNS: &[::crudforge::ColumnDef] = &[#(#column_defs),*];
                ::crudforge::TableDef::new(#type_name, #table)
                    #schema
                    #syntax
                    #no_inserts
                    #no_updates
                    #no_deletes
                    .columns(COLUMNS)
            };

            fn get_value(&self, field: usize) -> ::crudforge::Value {
                match field {
                    #(#get_arms)*
                    _ => ::crudforge::Value::Null,
                }
            }

            fn set_value(
                &mut self,
                field: usize,
                value: ::crudforge::Value,
            ) -> ::crudforge::OrmResult<()> {
                match field {
                    #(#set_arms)*
                    _ => {}
                }
                Ok(())
            }
        }
    })
}
