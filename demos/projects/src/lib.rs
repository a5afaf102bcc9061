pub use passive::*;
use serde::{Deserialize, Serialize};

#[derive(Model, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[model(table = "users")]
pub struct User {
    #[pk]
    pub id: i64,
    #[column]
    pub name: String,
    #[column(passive)]
    pub bio: Option<String>,
}

#[derive(Model, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[model(table = "projects")]
pub struct Project {
    #[pk]
    pub id: i64,
    #[column]
    pub user_id: i64,
    #[column]
    pub name: String,
    #[column(passive)]
    pub description: Option<String>,
    #[column(passive)]
    pub guidelines: Option<String>,
    #[column(passive)]
    pub settings: Option<String>,
}

/// Same table as `Project`; inherits its passive declaration.
#[derive(Model, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[model(table = "projects", extends = "Project")]
pub struct ArchivedProject {
    #[pk]
    pub id: i64,
    #[column]
    pub user_id: i64,
    #[column]
    pub name: String,
    #[column]
    pub description: Option<String>,
    #[column]
    pub guidelines: Option<String>,
    #[column]
    pub settings: Option<String>,
}

impl Project {
    pub fn sample(id: i64, user_id: i64) -> Self {
        Project {
            id,
            user_id,
            name: format!("Project {}", id),
            description: Some(format!("Long form description of project {}", id)),
            guidelines: Some(format!("Contribution guidelines of project {}", id)),
            settings: Some(format!(r#"{{"visibility":"private","seats":{}}}"#, rand::random_range(1..50))),
        }
    }
}

impl User {
    pub fn sample(id: i64) -> Self {
        User { id, name: format!("user-{}", id), bio: Some(format!("Bio of user {}", id)) }
    }
}

fn json_object(value: &Value) -> Result<(), String> {
    match value {
        Value::Null => Ok(()),
        Value::Text(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(_)) => Ok(()),
            Ok(_) => Err("must be a JSON object".to_string()),
            Err(e) => Err(format!("is not valid JSON: {}", e)),
        },
        other => Err(format!("must be text, found {}", other.type_name())),
    }
}

pub fn project_validations(registry: &SchemaRegistry) -> Result<Validations, PassiveError> {
    let binding = registry.binding_for::<Project>()?;
    let mut validations = Validations::new(binding.declaration);
    validations
        .validates(Rule::presence(&["name"]))
        .validates(Rule::length(&["name"], Some(3), Some(80)))
        .validates(Rule::length(&["description"], None, Some(2000)))
        .validates(Rule::custom(&["settings"], json_object));
    Ok(validations)
}

/// Registry, redb storage and the retrying lookup gateway used by records it hands out.
pub struct Catalog {
    pub registry: SchemaRegistry,
    pub storage: Arc<Storage>,
    gateway: Arc<dyn PointLookupGateway>,
}

impl Catalog {
    pub fn open(settings: &Settings) -> Result<Self, PassiveError> {
        let storage = Arc::new(Storage::from_settings(&settings.storage)?);
        Self::new(storage, settings)
    }

    pub fn new(storage: Arc<Storage>, settings: &Settings) -> Result<Self, PassiveError> {
        let registry = SchemaRegistry::from_inventory()?;
        let gateway = Arc::new(RetryingGateway::from_settings(storage.as_ref().clone(), &settings.storage));
        Ok(Catalog { registry, storage, gateway })
    }

    pub fn insert<T: ModelType>(&self, model: &T) -> Result<(), PassiveError> {
        let schema = self.registry.schema(T::MODEL_NAME)?;
        self.storage.insert(&schema, &model.to_row())
    }

    pub fn query<T: ModelType>(&self) -> Result<Query, PassiveError> {
        Query::of::<T>(&self.registry)
    }

    pub fn all<T: ModelType>(&self) -> Result<Vec<Record>, PassiveError> {
        self.query::<T>()?.load(self.storage.as_ref(), self.gateway.clone())
    }

    pub fn find<T: ModelType>(&self, id: i64) -> Result<Record, PassiveError> {
        let identity = Identity::new(vec![("id".to_string(), Value::Int(id))]);
        self.query::<T>()?.find(&identity, self.storage.as_ref(), self.gateway.clone())
    }

    /// Validates `record` and writes its changed attributes over the stored row.
    pub fn save(&self, record: &mut Record, validations: &Validations) -> Result<(), PassiveError> {
        validations.validate(record)?;
        if !record.has_changes() {
            return Ok(());
        }
        let identity = record.identity()?;
        let mut row = self.storage.find(record.schema(), &identity, &Projection::All)?.unwrap_or_default();
        for (name, (_, value)) in record.changes() {
            row.insert(name, value);
        }
        for (name, value) in record.attributes().present() {
            row.entry(name.to_string()).or_insert_with(|| value.clone());
        }
        self.storage.insert(record.schema(), &row)?;
        info!("Saved {} {}", record.schema().name(), identity);
        record.changes_applied();
        Ok(())
    }
}
