use crate::settings::Settings;
use crate::value::Row;
use crate::PassiveError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Static layout of one model: its table, attributes in canonical order and primary key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    name: String,
    table: String,
    attributes: Vec<String>,
    primary_key: Vec<String>,
}

impl ModelSchema {
    pub fn new(name: &str, table: &str, attributes: &[&str], primary_key: &[&str]) -> Result<Self, PassiveError> {
        let attributes: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();
        if primary_key.is_empty() {
            return Err(PassiveError::new(format!("{} has no primary key", name)));
        }
        for key in primary_key {
            if !attributes.iter().any(|a| a == key) {
                return Err(PassiveError::UnknownAttribute { model: name.to_string(), attribute: key.to_string() });
            }
        }
        Ok(Self {
            name: name.to_string(),
            table: table.to_string(),
            attributes,
            primary_key: primary_key.iter().map(|k| k.to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    pub fn ensure_attribute(&self, name: &str) -> Result<(), PassiveError> {
        if self.has_attribute(name) {
            Ok(())
        } else {
            Err(PassiveError::UnknownAttribute { model: self.name.clone(), attribute: name.to_string() })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclareOptions {
    /// Load a passive attribute before overwriting it so `changes()` reports the stored value.
    pub retrieve_before_write: bool,
    /// Skip single-attribute validations on passive attributes that were never fetched.
    pub skip_validation_if_absent: bool,
}

impl Default for DeclareOptions {
    fn default() -> Self {
        Self { retrieve_before_write: true, skip_validation_if_absent: true }
    }
}

impl From<&Settings> for DeclareOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            retrieve_before_write: settings.passive.retrieve_before_write,
            skip_validation_if_absent: settings.passive.skip_validation_if_absent,
        }
    }
}

/// Which attributes of a model are passive and how they behave. Immutable once declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDeclaration {
    model: String,
    passive_attributes: Vec<String>,
    passive_set: HashSet<String>,
    options: DeclareOptions,
}

impl SchemaDeclaration {
    pub fn declare(schema: &ModelSchema, attribute_names: &[&str], options: DeclareOptions) -> Result<Self, PassiveError> {
        let mut passive_attributes = Vec::with_capacity(attribute_names.len());
        for name in attribute_names {
            schema.ensure_attribute(name)?;
            if !passive_attributes.iter().any(|a: &String| a == name) {
                passive_attributes.push(name.to_string());
            }
        }
        let passive_set = passive_attributes.iter().cloned().collect();
        Ok(Self { model: schema.name().to_string(), passive_attributes, passive_set, options })
    }

    /// Declaration of a model that never declared passive attributes.
    pub fn none(model: &str) -> Self {
        Self { model: model.to_string(), passive_attributes: Vec::new(), passive_set: HashSet::new(), options: DeclareOptions::default() }
    }

    /// The model that made the declaration; subtypes report their ancestor here.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn passive_attributes(&self) -> &[String] {
        &self.passive_attributes
    }

    pub fn is_passive(&self, name: &str) -> bool {
        self.passive_set.contains(name)
    }

    pub fn has_passive(&self) -> bool {
        !self.passive_attributes.is_empty()
    }

    pub fn options(&self) -> DeclareOptions {
        self.options
    }
}

/// A model's schema paired with the declaration in effect for it.
#[derive(Debug, Clone)]
pub struct ModelBinding {
    pub schema: Arc<ModelSchema>,
    pub declaration: Arc<SchemaDeclaration>,
}

/// Implemented by `#[derive(Model)]`.
pub trait ModelType {
    const MODEL_NAME: &'static str;
    fn model_schema() -> Result<ModelSchema, PassiveError>;
    fn passive_attributes() -> &'static [&'static str];
    fn declare_options() -> DeclareOptions {
        DeclareOptions::default()
    }
    fn parent_model() -> Option<&'static str> {
        None
    }
    fn to_row(&self) -> Row;
}

pub struct ModelInfo {
    pub name: &'static str,
    pub register: fn(&mut SchemaRegistry) -> Result<(), PassiveError>,
}

inventory::collect!(ModelInfo);

/// Registers `T` and, unless it inherits from its parent, its passive declaration.
pub fn register_model<T: ModelType>(registry: &mut SchemaRegistry) -> Result<(), PassiveError> {
    let schema = T::model_schema()?;
    match T::parent_model() {
        Some(parent) => registry.register_subtype(schema, parent),
        None => {
            registry.register(schema);
        }
    }
    let passive = T::passive_attributes();
    if !passive.is_empty() {
        registry.declare(T::MODEL_NAME, passive, T::declare_options())?;
    }
    Ok(())
}

/// Schemas and declarations looked up by model name, with explicit parent fallback.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<ModelSchema>>,
    declarations: HashMap<String, Arc<SchemaDeclaration>>,
    parents: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every model that derives `Model` in the linked binary.
    pub fn from_inventory() -> Result<Self, PassiveError> {
        let mut registry = SchemaRegistry::new();
        for info in inventory::iter::<ModelInfo> {
            (info.register)(&mut registry)?;
            crate::debug!("Registered model {}", info.name);
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: ModelSchema) -> Arc<ModelSchema> {
        let schema = Arc::new(schema);
        self.schemas.insert(schema.name().to_string(), schema.clone());
        schema
    }

    pub fn register_subtype(&mut self, schema: ModelSchema, parent: &str) {
        self.parents.insert(schema.name().to_string(), parent.to_string());
        self.register(schema);
    }

    pub fn schema(&self, model: &str) -> Result<Arc<ModelSchema>, PassiveError> {
        self.schemas.get(model).cloned().ok_or_else(|| PassiveError::UnknownModel(model.to_string()))
    }

    /// Declares the passive attributes of `model`, replacing its previous declaration.
    pub fn declare(&mut self, model: &str, attribute_names: &[&str], options: DeclareOptions) -> Result<Arc<SchemaDeclaration>, PassiveError> {
        let schema = self.schema(model)?;
        let declaration = Arc::new(SchemaDeclaration::declare(&schema, attribute_names, options)?);
        if self.declarations.insert(model.to_string(), declaration.clone()).is_some() {
            crate::debug!("Replaced passive declaration of {}", model);
        }
        Ok(declaration)
    }

    /// Own declaration, else the nearest ancestor's (shared, not copied), else an empty one.
    pub fn declaration(&self, model: &str) -> Result<Arc<SchemaDeclaration>, PassiveError> {
        self.schema(model)?;
        let mut current = model;
        // bounded walk guards against a parent cycle
        for _ in 0..=self.parents.len() {
            if let Some(declaration) = self.declarations.get(current) {
                return Ok(declaration.clone());
            }
            match self.parents.get(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Ok(Arc::new(SchemaDeclaration::none(model)))
    }

    pub fn binding(&self, model: &str) -> Result<ModelBinding, PassiveError> {
        Ok(ModelBinding { schema: self.schema(model)?, declaration: self.declaration(model)? })
    }

    pub fn binding_for<T: ModelType>(&self) -> Result<ModelBinding, PassiveError> {
        self.binding(T::MODEL_NAME)
    }

    pub fn models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_schema() -> ModelSchema {
        ModelSchema::new("Project", "projects", &["id", "user_id", "name", "description", "guidelines"], &["id"]).unwrap()
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(project_schema());
        registry.register_subtype(
            ModelSchema::new("ArchivedProject", "projects", &["id", "user_id", "name", "description", "guidelines"], &["id"]).unwrap(),
            "Project",
        );
        registry
    }

    #[test]
    fn primary_key_must_be_an_attribute() {
        let err = ModelSchema::new("Project", "projects", &["name"], &["id"]).unwrap_err();
        assert!(matches!(err, PassiveError::UnknownAttribute { attribute, .. } if attribute == "id"));
    }

    #[test]
    fn unknown_passive_names_fail_at_declaration() {
        let mut registry = registry();
        let err = registry.declare("Project", &["description", "summary"], DeclareOptions::default()).unwrap_err();
        assert!(matches!(err, PassiveError::UnknownAttribute { attribute, .. } if attribute == "summary"));
        assert!(!registry.declaration("Project").unwrap().has_passive());
    }

    #[test]
    fn redeclaration_replaces() {
        let mut registry = registry();
        registry.declare("Project", &["description", "guidelines"], DeclareOptions::default()).unwrap();
        registry.declare("Project", &["guidelines"], DeclareOptions::default()).unwrap();
        let declaration = registry.declaration("Project").unwrap();
        assert_eq!(declaration.passive_attributes(), ["guidelines".to_string()]);
        assert!(!declaration.is_passive("description"));
    }

    #[test]
    fn subtypes_share_the_parent_declaration() {
        let mut registry = registry();
        let parent = registry.declare("Project", &["description"], DeclareOptions::default()).unwrap();
        let inherited = registry.declaration("ArchivedProject").unwrap();
        assert!(Arc::ptr_eq(&parent, &inherited));
        assert_eq!(inherited.model(), "Project");
    }

    #[test]
    fn subtype_declaration_overrides_parent() {
        let mut registry = registry();
        registry.declare("Project", &["description"], DeclareOptions::default()).unwrap();
        registry.declare("ArchivedProject", &["guidelines"], DeclareOptions::default()).unwrap();
        assert!(registry.declaration("ArchivedProject").unwrap().is_passive("guidelines"));
        assert!(registry.declaration("Project").unwrap().is_passive("description"));
    }

    #[test]
    fn parent_cycles_terminate() {
        let mut registry = SchemaRegistry::new();
        registry.register_subtype(ModelSchema::new("A", "a", &["id"], &["id"]).unwrap(), "B");
        registry.register_subtype(ModelSchema::new("B", "b", &["id"], &["id"]).unwrap(), "A");
        assert!(!registry.declaration("A").unwrap().has_passive());
    }

    #[test]
    fn unknown_models_are_reported() {
        let registry = registry();
        assert!(matches!(registry.binding("Ghost"), Err(PassiveError::UnknownModel(name)) if name == "Ghost"));
    }

    #[test]
    fn duplicate_names_collapse() {
        let declaration = SchemaDeclaration::declare(&project_schema(), &["description", "description"], DeclareOptions::default()).unwrap();
        assert_eq!(declaration.passive_attributes().len(), 1);
    }
}
