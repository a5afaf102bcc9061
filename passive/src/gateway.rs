use crate::attribute_set::{AttributeSet, Slot};
use crate::projection::Projection;
use crate::schema::ModelSchema;
use crate::value::{Row, Value};
use crate::PassiveError;
use std::fmt;

/// Key columns and values that single out one stored row, in primary key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    constraints: Vec<(String, Value)>,
}

impl Identity {
    pub fn new(constraints: Vec<(String, Value)>) -> Self {
        Self { constraints }
    }

    /// Reads the key columns of `schema` from `attributes`.
    /// Fails with the first key column that is absent or null.
    pub fn capture(schema: &ModelSchema, attributes: &AttributeSet) -> Result<Self, String> {
        let mut constraints = Vec::with_capacity(schema.primary_key().len());
        for key in schema.primary_key() {
            match attributes.get(key) {
                Slot::Present(value) if !value.is_null() => constraints.push((key.clone(), value.clone())),
                _ => return Err(key.clone()),
            }
        }
        Ok(Self { constraints })
    }

    pub fn constraints(&self) -> &[(String, Value)] {
        &self.constraints
    }

    pub fn values(&self) -> Vec<Value> {
        self.constraints.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.constraints.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.constraints.iter().all(|(k, v)| row.get(k) == Some(v))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.constraints.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Keyed point read: `SELECT <column> FROM <table> WHERE <identity> LIMIT 1`.
///
/// Returns `PassiveError::NotFound` when no row matches. Timeouts and retries are the
/// implementor's business; callers issue exactly one request per missing attribute.
pub trait PointLookupGateway: Send + Sync {
    fn fetch_column(&self, schema: &ModelSchema, identity: &Identity, column: &str) -> Result<Value, PassiveError>;
}

/// Row execution used by `Query`: rows carry only the projected columns.
pub trait RowSource: Send + Sync {
    fn select(&self, schema: &ModelSchema, projection: &Projection) -> Result<Vec<Row>, PassiveError>;
    fn find(&self, schema: &ModelSchema, identity: &Identity, projection: &Projection) -> Result<Option<Row>, PassiveError>;
}

pub(crate) fn not_found(schema: &ModelSchema, identity: &Identity) -> PassiveError {
    PassiveError::NotFound(format!("{} with {}", schema.name(), identity))
}
