//! passive lets models declare some of their columns passive: those columns are left out of
//! the default query projection and fetched from storage one at a time, the first time they are read.
//!
//! Models are plain structs deriving [`Model`]; each derivation registers itself through `inventory`
//! so [`SchemaRegistry::from_inventory`] can build the schemas and declarations at startup.
//! Rows live in [redb](https://github.com/cberner/redb) via [`Storage`], encoded with `bincode`,
//! or in the process-local [`MemoryStore`].
//!

pub mod attribute_set;
pub mod error;
pub mod gateway;
pub mod loader;
pub mod logger;
pub mod projection;
pub mod query;
pub mod record;
pub mod retry;
pub mod schema;
pub mod settings;
pub mod storage;
pub mod validation;
pub mod value;

pub use attribute_set::{AttributeSet, Change, Slot};
pub use error::PassiveError;
pub use gateway::{Identity, PointLookupGateway, RowSource};
pub use inventory;
pub use loader::PassiveAttributeLoader;
pub use macros::Model;
pub use projection::{default_projection, Projection};
pub use query::Query;
pub use record::Record;
pub use retry::{retry_with_delay, RetryingGateway};
pub use schema::{register_model, DeclareOptions, ModelBinding, ModelInfo, ModelSchema, ModelType, SchemaDeclaration, SchemaRegistry};
pub use settings::{load_config, Settings};
pub use std::sync::Arc;
pub use storage::{MemoryStore, Storage};
pub use validation::{Check, FieldError, Rule, ValidationErrors, Validations};
pub use value::{Row, Value};
