use crate::validation::ValidationErrors;
use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassiveError {

    #[error("missing attribute '{attribute}' on {model}: it is not passive, select it or load it explicitly")]
    NotLoadable { model: String, attribute: String },

    #[error("missing attribute '{attribute}' on {model}: identity key '{key}' is not loaded")]
    IdentityUnresolved { model: String, attribute: String, key: String },

    #[error("unknown attribute '{attribute}' for {model}")]
    UnknownAttribute { model: String, attribute: String },

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl PassiveError {
    pub fn new(msg: impl Into<String>) -> Self {
        PassiveError::Custom(msg.into())
    }

    /// Storage-level failures that a gateway may retry. Loader and schema errors never are.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PassiveError::Database(_)
                | PassiveError::RedbTransaction(_)
                | PassiveError::RedbStorage(_)
                | PassiveError::RedbCommit(_)
                | PassiveError::Io(_)
        )
    }
}

impl<T> From<PoisonError<T>> for PassiveError
{
    fn from(e: PoisonError<T>) -> Self {
        PassiveError::Custom(format!("Poison error: {:?}", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_errors_are_not_transient() {
        let err = PassiveError::NotLoadable { model: "Project".into(), attribute: "name".into() };
        assert!(!err.is_transient());
        assert!(!PassiveError::NotFound("projects".into()).is_transient());
    }

    #[test]
    fn io_errors_are_transient() {
        let err: PassiveError = std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr").into();
        assert!(err.is_transient());
    }

    #[test]
    fn messages_name_model_and_attribute() {
        let err = PassiveError::IdentityUnresolved { model: "Project".into(), attribute: "description".into(), key: "id".into() };
        assert_eq!(err.to_string(), "missing attribute 'description' on Project: identity key 'id' is not loaded");
    }
}
