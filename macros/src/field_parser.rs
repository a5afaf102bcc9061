use proc_macro2::Ident;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::{Fields, ItemStruct, LitBool, LitStr};

pub enum ParsingResult {
    Pk(FieldDef),
    Column(ColumnDef),
    Transient,
}

#[derive(Clone)]
pub struct FieldDef {
    pub name: Ident,
}

#[derive(Clone)]
pub struct ColumnDef {
    pub field: FieldDef,
    pub pk: bool,
    pub passive: bool,
}

/// Stored columns in field order, primary key columns included. Transient fields are skipped.
pub struct FieldDefs {
    pub columns: Vec<ColumnDef>,
}

impl FieldDefs {
    pub fn pk_names(&self) -> Vec<String> {
        self.columns.iter().filter(|c| c.pk).map(|c| c.field.name.to_string()).collect()
    }

    pub fn passive_names(&self) -> Vec<String> {
        self.columns.iter().filter(|c| c.passive).map(|c| c.field.name.to_string()).collect()
    }
}

#[derive(Default)]
pub struct ModelAttrs {
    pub table: Option<String>,
    pub extends: Option<String>,
    pub retrieve_before_write: Option<bool>,
    pub skip_validation_if_absent: Option<bool>,
}

pub fn get_named_fields(ast: &ItemStruct) -> Result<Punctuated<syn::Field, Comma>, syn::Error> {
    match &ast.fields {
        Fields::Named(columns_named) => Ok(columns_named.named.clone()),
        _ => Err(syn::Error::new(ast.ident.span(), "`#[derive(Model)]` only supports structs with named columns.")),
    }
}

pub fn get_model_attrs(ast: &ItemStruct) -> Result<ModelAttrs, syn::Error> {
    let mut attrs = ModelAttrs::default();
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("model")) {
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("table") {
                attrs.table = Some(nested.value()?.parse::<LitStr>()?.value());
            } else if nested.path.is_ident("extends") {
                attrs.extends = Some(nested.value()?.parse::<LitStr>()?.value());
            } else if nested.path.is_ident("retrieve_before_write") {
                attrs.retrieve_before_write = Some(nested.value()?.parse::<LitBool>()?.value);
            } else if nested.path.is_ident("skip_validation_if_absent") {
                attrs.skip_validation_if_absent = Some(nested.value()?.parse::<LitBool>()?.value);
            } else {
                return Err(nested.error("expected one of `table`, `extends`, `retrieve_before_write`, `skip_validation_if_absent`"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_model_field(field: &syn::Field) -> Result<ParsingResult, syn::Error> {
    match &field.ident {
        None => Err(syn::Error::new(field.span(), "Unnamed fields not supported")),
        Some(column_name) => {
            for attr in &field.attrs {
                if attr.path().is_ident("pk") {
                    let field = FieldDef { name: column_name.clone() };
                    return Ok(ParsingResult::Pk(field));
                } else if attr.path().is_ident("column") {
                    let mut passive = false;
                    if !matches!(attr.meta, syn::Meta::Path(_)) {
                        attr.parse_nested_meta(|nested| {
                            if nested.path.is_ident("passive") {
                                passive = true;
                                Ok(())
                            } else {
                                Err(nested.error("expected `passive`"))
                            }
                        })?;
                    }
                    let field = FieldDef { name: column_name.clone() };
                    return Ok(ParsingResult::Column(ColumnDef { field, pk: false, passive }));
                } else if attr.path().is_ident("transient") {
                    return Ok(ParsingResult::Transient);
                }
            }
            Err(syn::Error::new(
                column_name.span(),
                "Field must have one of #[pk] / #[column] / #[column(passive)] / #[transient] annotations",
            ))
        }
    }
}

pub fn get_field_macros(fields: &Punctuated<syn::Field, Comma>, ast: &ItemStruct) -> Result<FieldDefs, syn::Error> {
    let mut columns: Vec<ColumnDef> = Vec::new();

    for field in fields.iter() {
        match parse_model_field(field)? {
            ParsingResult::Pk(field) => columns.push(ColumnDef { field, pk: true, passive: false }),
            ParsingResult::Column(column) => columns.push(column),
            ParsingResult::Transient => {}
        }
    }

    if !columns.iter().any(|c| c.pk) {
        return Err(syn::Error::new(ast.ident.span(), "`#[pk]` attribute not found on any column. At least one column must have `#[pk]`."));
    }

    Ok(FieldDefs { columns })
}
