//! Row stores implementing both collaborator traits: a redb-backed `Storage` and an in-memory
//! `MemoryStore`. Rows are kept whole; projections are applied on the way out.

mod memory;
mod table;

pub use memory::MemoryStore;
pub use table::Storage;

use crate::gateway::Identity;
use crate::projection::Projection;
use crate::schema::ModelSchema;
use crate::value::{Row, Value};
use crate::PassiveError;

/// Identity of a row about to be written; every key column must be set and non-null.
pub(crate) fn row_identity(schema: &ModelSchema, row: &Row) -> Result<Identity, PassiveError> {
    let mut constraints = Vec::with_capacity(schema.primary_key().len());
    for key in schema.primary_key() {
        match row.get(key) {
            Some(value) if !value.is_null() => constraints.push((key.clone(), value.clone())),
            _ => {
                return Err(PassiveError::IdentityUnresolved {
                    model: schema.name().to_string(),
                    attribute: key.clone(),
                    key: key.clone(),
                })
            }
        }
    }
    Ok(Identity::new(constraints))
}

/// Primary key values in `schema.primary_key()` order, looked up by column name.
/// A missing or null key column leaves the identity unresolved.
pub(crate) fn key_values(schema: &ModelSchema, identity: &Identity) -> Result<Vec<Value>, PassiveError> {
    schema
        .primary_key()
        .iter()
        .map(|key| match identity.get(key) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(PassiveError::IdentityUnresolved {
                model: schema.name().to_string(),
                attribute: key.clone(),
                key: key.clone(),
            }),
        })
        .collect()
}

pub(crate) fn check_row(schema: &ModelSchema, row: &Row) -> Result<(), PassiveError> {
    for column in row.keys() {
        schema.ensure_attribute(column)?;
    }
    Ok(())
}

/// Keeps projected columns only. Columns the stored row lacks come back as null.
pub(crate) fn project(schema: &ModelSchema, row: &Row, projection: &Projection) -> Row {
    projection
        .columns(schema)
        .iter()
        .map(|column| (column.clone(), row.get(column).cloned().unwrap_or(Value::Null)))
        .collect()
}

pub(crate) fn column_of(schema: &ModelSchema, row: &Row, column: &str) -> Result<Value, PassiveError> {
    schema.ensure_attribute(column)?;
    Ok(row.get(column).cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ModelSchema {
        ModelSchema::new("Project", "projects", &["id", "name", "description"], &["id"]).unwrap()
    }

    #[test]
    fn rows_need_their_key() {
        let mut row = Row::new();
        row.insert("name".into(), Value::from("P"));
        assert!(matches!(row_identity(&schema(), &row), Err(PassiveError::IdentityUnresolved { .. })));
        row.insert("id".into(), Value::Int(3));
        assert_eq!(row_identity(&schema(), &row).unwrap().values(), vec![Value::Int(3)]);
    }

    #[test]
    fn key_values_follow_schema_order() {
        let schema = ModelSchema::new("Membership", "memberships", &["user_id", "project_id"], &["user_id", "project_id"]).unwrap();
        let swapped = Identity::new(vec![("project_id".into(), Value::Int(2)), ("user_id".into(), Value::Int(1))]);
        assert_eq!(key_values(&schema, &swapped).unwrap(), vec![Value::Int(1), Value::Int(2)]);

        let misnamed = Identity::new(vec![("user".into(), Value::Int(1)), ("project".into(), Value::Int(2))]);
        assert!(matches!(key_values(&schema, &misnamed), Err(PassiveError::IdentityUnresolved { key, .. }) if key == "user_id"));
    }

    #[test]
    fn projection_fills_missing_columns_with_null() {
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(3));
        let projected = project(&schema(), &row, &Projection::Columns(vec!["id".into(), "description".into()]));
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["description"], Value::Null);
        assert_eq!(project(&schema(), &row, &Projection::All).len(), 3);
    }
}
