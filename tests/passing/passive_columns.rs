use passive::*;

#[derive(Model, Clone, Debug)]
#[model(table = "projects")]
pub struct Project {
    #[pk]
    pub id: i64,
    #[column]
    pub name: String,
    #[column(passive)]
    pub description: Option<String>,
    #[column(passive)]
    pub guidelines: Option<String>,
    #[transient]
    pub note: String,
}

fn main() {
    let schema = Project::model_schema().unwrap();
    assert_eq!(schema.table(), "projects");
    assert_eq!(schema.attributes(), ["id", "name", "description", "guidelines"]);
    assert_eq!(Project::passive_attributes(), ["description", "guidelines"]);

    let project = Project { id: 1, name: "P".into(), description: None, guidelines: Some("g".into()), note: String::new() };
    let row = project.to_row();
    assert_eq!(row.get("description"), Some(&Value::Null));
    assert!(!row.contains_key("note"));

    let registry = SchemaRegistry::from_inventory().unwrap();
    assert!(registry.declaration("Project").unwrap().is_passive("guidelines"));
}
