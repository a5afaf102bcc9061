use super::{check_row, column_of, key_values, project, row_identity};
use crate::gateway::{not_found, Identity, PointLookupGateway, RowSource};
use crate::projection::Projection;
use crate::schema::ModelSchema;
use crate::value::{Row, Value};
use crate::PassiveError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Process-local row store keyed by table name. Counts point lookups and selects.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    fetches: AtomicUsize,
    selects: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the row with the same identity.
    pub fn insert(&self, schema: &ModelSchema, row: Row) -> Result<(), PassiveError> {
        check_row(schema, &row)?;
        let identity = row_identity(schema, &row)?;
        let mut tables = self.tables.lock()?;
        let rows = tables.entry(schema.table().to_string()).or_default();
        match rows.iter_mut().find(|existing| identity.matches(existing)) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        Ok(())
    }

    pub fn delete(&self, schema: &ModelSchema, identity: &Identity) -> Result<bool, PassiveError> {
        key_values(schema, identity)?;
        let mut tables = self.tables.lock()?;
        let Some(rows) = tables.get_mut(schema.table()) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| !identity.matches(row));
        Ok(rows.len() != before)
    }

    /// Number of `fetch_column` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    fn row(&self, schema: &ModelSchema, identity: &Identity) -> Result<Option<Row>, PassiveError> {
        key_values(schema, identity)?;
        let tables = self.tables.lock()?;
        Ok(tables
            .get(schema.table())
            .and_then(|rows| rows.iter().find(|row| identity.matches(row)))
            .cloned())
    }
}

impl PointLookupGateway for MemoryStore {
    fn fetch_column(&self, schema: &ModelSchema, identity: &Identity, column: &str) -> Result<Value, PassiveError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let row = self.row(schema, identity)?.ok_or_else(|| not_found(schema, identity))?;
        column_of(schema, &row, column)
    }
}

impl RowSource for MemoryStore {
    fn select(&self, schema: &ModelSchema, projection: &Projection) -> Result<Vec<Row>, PassiveError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock()?;
        Ok(tables
            .get(schema.table())
            .map(|rows| rows.iter().map(|row| project(schema, row, projection)).collect())
            .unwrap_or_default())
    }

    fn find(&self, schema: &ModelSchema, identity: &Identity, projection: &Projection) -> Result<Option<Row>, PassiveError> {
        Ok(self.row(schema, identity)?.map(|row| project(schema, &row, projection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ModelSchema {
        ModelSchema::new("Project", "projects", &["id", "name", "description"], &["id"]).unwrap()
    }

    fn row(id: i64, name: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(id));
        row.insert("name".into(), Value::from(name));
        row.insert("description".into(), Value::from(format!("{} description", name)));
        row
    }

    fn identity(id: i64) -> Identity {
        Identity::new(vec![("id".into(), Value::Int(id))])
    }

    #[test]
    fn insert_replaces_same_identity() {
        let store = MemoryStore::new();
        store.insert(&schema(), row(1, "a")).unwrap();
        store.insert(&schema(), row(1, "b")).unwrap();
        assert_eq!(store.select(&schema(), &Projection::All).unwrap().len(), 1);
        assert_eq!(store.fetch_column(&schema(), &identity(1), "name").unwrap(), Value::from("b"));
    }

    #[test]
    fn fetch_column_counts_and_reports_missing_rows() {
        let store = MemoryStore::new();
        store.insert(&schema(), row(1, "a")).unwrap();
        assert!(matches!(store.fetch_column(&schema(), &identity(2), "name"), Err(PassiveError::NotFound(_))));
        assert!(matches!(store.fetch_column(&schema(), &identity(1), "nope"), Err(PassiveError::UnknownAttribute { .. })));
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn lookups_need_every_key_column_by_name() {
        let store = MemoryStore::new();
        store.insert(&schema(), row(1, "a")).unwrap();
        let misnamed = Identity::new(vec![("project".into(), Value::Int(1))]);
        assert!(matches!(store.fetch_column(&schema(), &misnamed, "name"), Err(PassiveError::IdentityUnresolved { .. })));
        let narrowed = Identity::new(vec![("name".into(), Value::from("a"))]);
        assert!(matches!(store.find(&schema(), &narrowed, &Projection::All), Err(PassiveError::IdentityUnresolved { .. })));
    }

    #[test]
    fn unknown_columns_are_rejected_on_insert() {
        let store = MemoryStore::new();
        let mut bad = row(1, "a");
        bad.insert("extra".into(), Value::Int(0));
        assert!(matches!(store.insert(&schema(), bad), Err(PassiveError::UnknownAttribute { .. })));
    }

    #[test]
    fn delete_removes_rows() {
        let store = MemoryStore::new();
        store.insert(&schema(), row(1, "a")).unwrap();
        assert!(store.delete(&schema(), &identity(1)).unwrap());
        assert!(!store.delete(&schema(), &identity(1)).unwrap());
        assert!(store.find(&schema(), &identity(1), &Projection::All).unwrap().is_none());
    }
}
