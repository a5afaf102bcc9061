use crate::field_parser::{self, FieldDefs, ModelAttrs};
use crate::macro_utils;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::ItemStruct;

pub struct ModelMacros {
    pub model_name: Ident,
    pub table: String,
    pub attrs: ModelAttrs,
    pub fields: FieldDefs,
}

impl ModelMacros {
    pub fn new(item_struct: &ItemStruct) -> Result<Self, syn::Error> {
        let named = field_parser::get_named_fields(item_struct)?;
        let fields = field_parser::get_field_macros(&named, item_struct)?;
        let attrs = field_parser::get_model_attrs(item_struct)?;
        let table = attrs
            .table
            .clone()
            .unwrap_or_else(|| macro_utils::default_table_name(&item_struct.ident.to_string()));
        Ok(ModelMacros { model_name: item_struct.ident.clone(), table, attrs, fields })
    }

    fn declare_options(&self) -> TokenStream {
        let retrieve = self.attrs.retrieve_before_write.unwrap_or(true);
        let skip = self.attrs.skip_validation_if_absent.unwrap_or(true);
        quote! {
            fn declare_options() -> ::passive::DeclareOptions {
                ::passive::DeclareOptions { retrieve_before_write: #retrieve, skip_validation_if_absent: #skip }
            }
        }
    }

    fn parent_model(&self) -> TokenStream {
        match &self.attrs.extends {
            Some(parent) => quote! {
                fn parent_model() -> Option<&'static str> {
                    Some(#parent)
                }
            },
            None => quote! {},
        }
    }

    fn to_row(&self) -> TokenStream {
        let inserts = self.fields.columns.iter().map(|column| {
            let ident = &column.field.name;
            let name = ident.to_string();
            quote! {
                row.insert(#name.to_string(), ::passive::Value::from(self.#ident.clone()));
            }
        });
        quote! {
            fn to_row(&self) -> ::passive::Row {
                let mut row = ::passive::Row::new();
                #(#inserts)*
                row
            }
        }
    }

    pub fn expand(&self) -> TokenStream {
        let model_name = &self.model_name;
        let table = &self.table;
        let attributes: Vec<String> = self.fields.columns.iter().map(|c| c.field.name.to_string()).collect();
        let pks = self.fields.pk_names();
        let passive = self.fields.passive_names();
        let declare_options = self.declare_options();
        let parent_model = self.parent_model();
        let to_row = self.to_row();

        quote! {
            impl ::passive::ModelType for #model_name {
                const MODEL_NAME: &'static str = stringify!(#model_name);

                fn model_schema() -> Result<::passive::ModelSchema, ::passive::PassiveError> {
                    ::passive::ModelSchema::new(Self::MODEL_NAME, #table, &[#(#attributes),*], &[#(#pks),*])
                }

                fn passive_attributes() -> &'static [&'static str] {
                    &[#(#passive),*]
                }

                #declare_options
                #parent_model
                #to_row
            }

            ::passive::inventory::submit! {
                ::passive::ModelInfo {
                    name: stringify!(#model_name),
                    register: ::passive::register_model::<#model_name>,
                }
            }
        }
    }
}
