use crate::attribute_set::{AttributeSet, Change, Slot};
use crate::gateway::{Identity, PointLookupGateway, RowSource};
use crate::loader::PassiveAttributeLoader;
use crate::projection::default_projection;
use crate::schema::{ModelBinding, ModelSchema, SchemaDeclaration};
use crate::value::{Row, Value};
use crate::PassiveError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One materialized model instance.
///
/// All attribute access goes through `read`/`write`, which consult the attribute set first
/// and fall back to the passive loader for attributes that were not fetched.
pub struct Record {
    binding: ModelBinding,
    attributes: AttributeSet,
    gateway: Arc<dyn PointLookupGateway>,
    loader: Option<PassiveAttributeLoader>,
}

impl Record {
    /// Record built from a stored row. Only the row's columns are present and none is dirty.
    pub fn materialize(binding: ModelBinding, gateway: Arc<dyn PointLookupGateway>, row: Row) -> Self {
        let attributes = Self::known_columns(&binding.schema, row);
        Self { binding, attributes, gateway, loader: None }
    }

    /// New, unsaved record: every attribute is present (null unless given), given values are dirty.
    pub fn build(binding: ModelBinding, gateway: Arc<dyn PointLookupGateway>, values: Row) -> Result<Self, PassiveError> {
        let mut attributes = AttributeSet::new();
        for name in binding.schema.attributes() {
            attributes.fill(name, Value::Null);
        }
        for (name, value) in values {
            binding.schema.ensure_attribute(&name)?;
            attributes.set(&name, value);
        }
        Ok(Self { binding, attributes, gateway, loader: None })
    }

    fn known_columns(schema: &ModelSchema, row: Row) -> AttributeSet {
        let mut known = Row::new();
        for (name, value) in row {
            if schema.has_attribute(&name) {
                known.insert(name, value);
            } else {
                crate::warn!("Ignoring column {} not declared on {}", name, schema.name());
            }
        }
        AttributeSet::from_row(known)
    }

    pub fn binding(&self) -> &ModelBinding {
        &self.binding
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.binding.schema
    }

    pub fn declaration(&self) -> &SchemaDeclaration {
        &self.binding.declaration
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Value of `name`; a passive attribute that was not fetched is loaded and cached on first read.
    pub fn read(&mut self, name: &str) -> Result<Value, PassiveError> {
        self.access(name, false)
    }

    pub fn read_as<T>(&mut self, name: &str) -> Result<T, PassiveError>
    where
        T: TryFrom<Value, Error = PassiveError>,
    {
        T::try_from(self.read(name)?)
    }

    /// Loads `name` if it is missing, whether it is declared passive or not.
    pub fn load_attribute(&mut self, name: &str) -> Result<Value, PassiveError> {
        self.access(name, true)
    }

    /// Assigns `name`. With `retrieve_before_write`, an unfetched passive attribute is loaded
    /// first so the stored value shows up as the original in `changes()`.
    pub fn write(&mut self, name: &str, value: impl Into<Value>) -> Result<(), PassiveError> {
        self.binding.schema.ensure_attribute(name)?;
        let declaration = &self.binding.declaration;
        if declaration.options().retrieve_before_write && declaration.is_passive(name) && !self.attributes.contains(name) {
            self.access(name, false)?;
        }
        self.attributes.set(name, value.into());
        Ok(())
    }

    fn access(&mut self, name: &str, force: bool) -> Result<Value, PassiveError> {
        if let Slot::Present(value) = self.attributes.get(name) {
            return Ok(value.clone());
        }
        self.binding.schema.ensure_attribute(name)?;
        let binding = &self.binding;
        let loader = self
            .loader
            .get_or_insert_with(|| PassiveAttributeLoader::new(binding.schema.clone(), binding.declaration.clone()));
        loader.load(&mut self.attributes, self.gateway.as_ref(), name, force)
    }

    /// Loads every declared attribute that is still missing.
    pub fn load_missing(&mut self) -> Result<(), PassiveError> {
        let missing: Vec<String> = self
            .binding
            .schema
            .attributes()
            .iter()
            .filter(|a| !self.attributes.contains(a))
            .cloned()
            .collect();
        for name in missing {
            self.load_attribute(&name)?;
        }
        Ok(())
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.attributes.is_dirty(name)
    }

    pub fn has_changes(&self) -> bool {
        self.attributes.has_changes()
    }

    pub fn changes(&self) -> BTreeMap<String, Change> {
        self.attributes.changes()
    }

    pub fn changes_applied(&mut self) {
        self.attributes.changes_applied();
    }

    pub fn identity(&self) -> Result<Identity, PassiveError> {
        Identity::capture(&self.binding.schema, &self.attributes).map_err(|key| PassiveError::IdentityUnresolved {
            model: self.binding.schema.name().to_string(),
            attribute: key.clone(),
            key,
        })
    }

    /// Present attributes only, in schema order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for name in self.binding.schema.attributes() {
            if let Slot::Present(value) = self.attributes.get(name) {
                map.insert(name.clone(), value.to_json());
            }
        }
        serde_json::Value::Object(map)
    }

    /// Replaces the whole attribute set with a freshly fetched default-projection row.
    /// Unsaved changes and previously loaded passive attributes are discarded.
    pub fn reload(&mut self, source: &dyn RowSource) -> Result<(), PassiveError> {
        let identity = self.identity()?;
        let projection = default_projection(&self.binding.schema, &self.binding.declaration, &[]);
        let row = source
            .find(&self.binding.schema, &identity, &projection)?
            .ok_or_else(|| crate::gateway::not_found(&self.binding.schema, &identity))?;
        self.attributes = Self::known_columns(&self.binding.schema, row);
        self.loader = None;
        Ok(())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.binding.schema.name())
            .field("attributes", &self.attributes)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeclareOptions, SchemaRegistry};
    use crate::storage::MemoryStore;

    fn store_and_binding(options: DeclareOptions) -> (Arc<MemoryStore>, ModelBinding) {
        let mut registry = SchemaRegistry::new();
        let schema = registry.register(
            ModelSchema::new("Project", "projects", &["id", "user_id", "name", "description", "guidelines"], &["id"]).unwrap(),
        );
        registry.declare("Project", &["description", "guidelines"], options).unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(1));
        row.insert("user_id".into(), Value::Int(7));
        row.insert("name".into(), Value::from("P"));
        row.insert("description".into(), Value::from("d"));
        row.insert("guidelines".into(), Value::from("g"));
        store.insert(&schema, row).unwrap();
        (store, registry.binding("Project").unwrap())
    }

    fn narrow_row() -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(1));
        row.insert("user_id".into(), Value::Int(7));
        row.insert("name".into(), Value::from("P"));
        row
    }

    #[test]
    fn read_loads_passive_attribute_once() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut record = Record::materialize(binding, store.clone(), narrow_row());

        assert_eq!(record.read("description").unwrap(), Value::from("d"));
        assert_eq!(record.read("description").unwrap(), Value::from("d"));
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(record.attributes().names(), vec!["description", "id", "name", "user_id"]);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut record = Record::materialize(binding, store, narrow_row());
        assert!(matches!(record.read("summary"), Err(PassiveError::UnknownAttribute { .. })));
        assert!(matches!(record.write("summary", 1), Err(PassiveError::UnknownAttribute { .. })));
    }

    #[test]
    fn explicit_load_reaches_non_passive_columns() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(1));
        let mut record = Record::materialize(binding, store, row);

        assert!(matches!(record.read("name"), Err(PassiveError::NotLoadable { .. })));
        assert_eq!(record.load_attribute("name").unwrap(), Value::from("P"));
        assert_eq!(record.read_as::<String>("name").unwrap(), "P");
    }

    #[test]
    fn write_retrieves_before_overwriting() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut record = Record::materialize(binding, store.clone(), narrow_row());

        record.write("description", "new").unwrap();
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(record.changes()["description"], (Some(Value::from("d")), Value::from("new")));
    }

    #[test]
    fn write_without_retrieval_skips_storage() {
        let options = DeclareOptions { retrieve_before_write: false, ..DeclareOptions::default() };
        let (store, binding) = store_and_binding(options);
        let mut record = Record::materialize(binding, store.clone(), narrow_row());

        record.write("description", "new").unwrap();
        assert_eq!(store.fetch_count(), 0);
        assert_eq!(record.changes()["description"], (None, Value::from("new")));
    }

    #[test]
    fn writing_the_loaded_value_is_not_a_change() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut record = Record::materialize(binding, store, narrow_row());
        record.write("description", "d").unwrap();
        assert!(!record.is_dirty("description"));
    }

    #[test]
    fn built_records_never_hit_storage() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut values = Row::new();
        values.insert("name".into(), Value::from("New"));
        let mut record = Record::build(binding, store.clone(), values).unwrap();

        assert_eq!(record.read("description").unwrap(), Value::Null);
        assert!(record.is_dirty("name"));
        assert!(!record.is_dirty("description"));
        assert_eq!(store.fetch_count(), 0);
    }

    #[test]
    fn json_lists_present_attributes_in_schema_order() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut record = Record::materialize(binding, store, narrow_row());
        assert_eq!(record.to_json(), serde_json::json!({"id": 1, "user_id": 7, "name": "P"}));
        record.read("guidelines").unwrap();
        assert_eq!(record.to_json().to_string(), r#"{"id":1,"user_id":7,"name":"P","guidelines":"g"}"#);
    }

    #[test]
    fn reload_resets_presence() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut record = Record::materialize(binding, store.clone(), narrow_row());
        record.read("description").unwrap();
        record.write("name", "Renamed").unwrap();

        record.reload(store.as_ref()).unwrap();
        assert!(!record.contains("description"));
        assert!(!record.has_changes());
        assert_eq!(record.read("name").unwrap(), Value::from("P"));
    }

    #[test]
    fn load_missing_fills_everything() {
        let (store, binding) = store_and_binding(DeclareOptions::default());
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(1));
        let mut record = Record::materialize(binding, store.clone(), row);
        record.load_missing().unwrap();
        assert_eq!(record.attributes().len(), 5);
        assert_eq!(store.fetch_count(), 4);
        assert!(!record.has_changes());
    }
}
