use super::{check_row, column_of, key_values, project, row_identity};
use crate::gateway::{not_found, Identity, PointLookupGateway, RowSource};
use crate::projection::Projection;
use crate::schema::ModelSchema;
use crate::settings::StorageSettings;
use crate::value::{Row, Value};
use crate::PassiveError;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use std::path::Path;
use std::sync::Arc;

type RowTable<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

fn row_table(name: &str) -> RowTable<'_> {
    TableDefinition::new(name)
}

fn encode_key(schema: &ModelSchema, identity: &Identity) -> Result<Vec<u8>, PassiveError> {
    Ok(bincode::serialize(&key_values(schema, identity)?)?)
}

/// redb database holding one table per model table; key = primary key values, value = the row.
#[derive(Clone)]
pub struct Storage {
    pub db: Arc<Database>,
}

impl Storage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn open(path: &Path, cache_size_mb: usize) -> Result<Self, PassiveError> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let db = if path.exists() {
            crate::info!("Opening existing db at {:?}", path);
            Database::open(path)?
        } else {
            Database::builder().set_cache_size(cache_size_mb * 1024 * 1024).create(path)?
        };
        Ok(Self::new(Arc::new(db)))
    }

    pub fn from_settings(settings: &StorageSettings) -> Result<Self, PassiveError> {
        Self::open(Path::new(&settings.db_path), settings.cache_size_mb)
    }

    /// Fresh database under the system temp dir, named after `name` plus a random suffix.
    pub fn temp(name: &str) -> Result<Arc<Storage>, PassiveError> {
        let dir = std::env::temp_dir().join("passive").join("test");
        let path = dir.join(format!("{}_{}.redb", name, rand::random::<u64>()));
        Ok(Arc::new(Self::open(&path, 16)?))
    }

    /// Inserts or replaces the row with the same identity.
    pub fn insert(&self, schema: &ModelSchema, row: &Row) -> Result<(), PassiveError> {
        check_row(schema, row)?;
        let key = encode_key(schema, &row_identity(schema, row)?)?;
        let value = bincode::serialize(row)?;
        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(row_table(schema.table()))?;
            table.insert(key.as_slice(), value.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete(&self, schema: &ModelSchema, identity: &Identity) -> Result<bool, PassiveError> {
        let key = encode_key(schema, identity)?;
        let tx = self.db.begin_write()?;
        let removed = {
            let mut table = tx.open_table(row_table(schema.table()))?;
            let removed = table.remove(key.as_slice())?.is_some();
            removed
        };
        tx.commit()?;
        Ok(removed)
    }

    fn row(&self, schema: &ModelSchema, identity: &Identity) -> Result<Option<Row>, PassiveError> {
        let key = encode_key(schema, identity)?;
        let tx = self.db.begin_read()?;
        let table = match tx.open_table(row_table(schema.table())) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let row = match table.get(key.as_slice())? {
            Some(guard) => Some(bincode::deserialize::<Row>(guard.value())?),
            None => None,
        };
        // constraints beyond the key must hold too
        Ok(row.filter(|row| identity.matches(row)))
    }
}

impl PointLookupGateway for Storage {
    fn fetch_column(&self, schema: &ModelSchema, identity: &Identity, column: &str) -> Result<Value, PassiveError> {
        let row = self.row(schema, identity)?.ok_or_else(|| not_found(schema, identity))?;
        column_of(schema, &row, column)
    }
}

impl RowSource for Storage {
    fn select(&self, schema: &ModelSchema, projection: &Projection) -> Result<Vec<Row>, PassiveError> {
        let tx = self.db.begin_read()?;
        let table = match tx.open_table(row_table(schema.table())) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut rows = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let row: Row = bincode::deserialize(value.value())?;
            rows.push(project(schema, &row, projection));
        }
        Ok(rows)
    }

    fn find(&self, schema: &ModelSchema, identity: &Identity, projection: &Projection) -> Result<Option<Row>, PassiveError> {
        Ok(self.row(schema, identity)?.map(|row| project(schema, &row, projection)))
    }
}
