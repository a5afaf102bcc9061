use crate::schema::{ModelSchema, SchemaDeclaration};

/// Columns requested from storage for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// No narrowing; the row source returns every column.
    All,
    Columns(Vec<String>),
}

impl Projection {
    pub fn includes(&self, column: &str) -> bool {
        match self {
            Projection::All => true,
            Projection::Columns(columns) => columns.iter().any(|c| c == column),
        }
    }

    pub fn columns<'a>(&'a self, schema: &'a ModelSchema) -> &'a [String] {
        match self {
            Projection::All => schema.attributes(),
            Projection::Columns(columns) => columns,
        }
    }
}

/// Projection used when the caller did not pick columns.
///
/// An explicit list always wins and is returned untouched. Otherwise passive attributes
/// are left out, keeping the schema's attribute order.
pub fn default_projection(schema: &ModelSchema, declaration: &SchemaDeclaration, explicit: &[String]) -> Projection {
    if !explicit.is_empty() {
        return Projection::Columns(explicit.to_vec());
    }
    if !declaration.has_passive() {
        return Projection::All;
    }
    Projection::Columns(
        schema
            .attributes()
            .iter()
            .filter(|a| !declaration.is_passive(a))
            .cloned()
            .collect(),
    )
}
