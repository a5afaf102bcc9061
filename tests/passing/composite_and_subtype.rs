use passive::*;

#[derive(Model)]
pub struct Membership {
    #[pk]
    pub user_id: i64,
    #[pk]
    pub project_id: i64,
    #[column]
    pub role: String,
}

#[derive(Model)]
#[model(table = "documents", retrieve_before_write = false, skip_validation_if_absent = false)]
pub struct Document {
    #[pk]
    pub id: i64,
    #[column(passive)]
    pub body: Vec<u8>,
}

#[derive(Model)]
#[model(table = "documents", extends = "Document")]
pub struct Memo {
    #[pk]
    pub id: i64,
    #[column]
    pub body: Vec<u8>,
}

fn main() {
    let schema = Membership::model_schema().unwrap();
    assert_eq!(schema.table(), "memberships");
    assert_eq!(schema.primary_key(), ["user_id", "project_id"]);

    assert!(!Document::declare_options().retrieve_before_write);
    assert_eq!(Memo::parent_model(), Some("Document"));

    let registry = SchemaRegistry::from_inventory().unwrap();
    let memo = registry.binding_for::<Memo>().unwrap();
    assert_eq!(memo.declaration.model(), "Document");
    assert!(memo.declaration.is_passive("body"));
    assert!(!registry.declaration("Membership").unwrap().has_passive());
}
