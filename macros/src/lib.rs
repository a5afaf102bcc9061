extern crate proc_macro;
mod field_parser;
mod macro_utils;
mod model;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::{parse_macro_input, ItemStruct};

/// Derives `passive::ModelType` and registers the model with `inventory`.
///
/// ```ignore
/// #[derive(Model)]
/// #[model(table = "projects")]
/// struct Project {
///     #[pk] id: i64,
///     #[column] name: String,
///     #[column(passive)] description: Option<String>,
///     #[transient] dirty_hint: bool,
/// }
/// ```
///
/// Every field needs exactly one of `#[pk]`, `#[column]`, `#[column(passive)]` or `#[transient]`.
/// Several `#[pk]` fields form a composite key in field order.
///
/// Stored fields must implement `Clone` and `Into<passive::Value>`: `bool`, `i8` to `i64`, `u8` to `u32`,
/// `f32`, `f64`, `String`, `Vec<u8>` and `Option` of any of these. `u64` and `usize` do not fit
/// losslessly into an `i64` column, so declare such fields as `i64`; `Record::read_as::<u64>` still
/// reads them back with a range check.
#[proc_macro_derive(Model, attributes(model, pk, column, transient))]
#[proc_macro_error]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item_struct = parse_macro_input!(input as ItemStruct);
    let model = match model::ModelMacros::new(&item_struct) {
        Ok(model) => model,
        Err(e) => return e.to_compile_error().into(),
    };
    macro_utils::submit_struct_to_stream(model.expand(), "model", &item_struct.ident, "_derive.rs")
}
