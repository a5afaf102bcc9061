use crate::PassiveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single column value as it travels between storage and a record.
///
/// `Null` is a stored value; it is never used to signal that an attribute was not fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// Column name to value, as returned by a row source.
pub type Row = BTreeMap<String, Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Blank means null, empty/whitespace text or empty bytes.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|byte| serde_json::Value::from(*byte)).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

// u64 and usize have no lossless i64 mapping; they only convert back out of a Value, checked.
impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn mismatch(expected: &str, found: &Value) -> PassiveError {
    PassiveError::Custom(format!("expected {} value, found {}", expected, found.type_name()))
}

impl TryFrom<Value> for i64 {
    type Error = PassiveError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch("int", &other)),
        }
    }
}

macro_rules! impl_try_from_integer {
    ($($t:ty),*) => {
        $(
            impl TryFrom<Value> for $t {
                type Error = PassiveError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    let int = i64::try_from(value)?;
                    <$t>::try_from(int).map_err(|_| {
                        PassiveError::Custom(format!("int value {} is out of range for {}", int, stringify!($t)))
                    })
                }
            }
        )*
    };
}

impl_try_from_integer!(i8, i16, i32, u8, u16, u32, u64, usize);

impl TryFrom<Value> for bool {
    type Error = PassiveError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = PassiveError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl TryFrom<Value> for f32 {
    type Error = PassiveError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        f64::try_from(value).map(|f| f as f32)
    }
}

impl TryFrom<Value> for String {
    type Error = PassiveError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = PassiveError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

macro_rules! impl_try_from_nullable {
    ($($t:ty),*) => {
        $(
            impl TryFrom<Value> for Option<$t> {
                type Error = PassiveError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::Null => Ok(None),
                        other => <$t>::try_from(other).map(Some),
                    }
                }
            }
        )*
    };
}

impl_try_from_nullable!(i8, i16, i32, i64, u8, u16, u32, u64, usize, bool, f32, f64, String, Vec<u8>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_map_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
        let back: Option<String> = Value::Null.try_into().unwrap();
        assert_eq!(back, None);
    }

    #[test]
    fn conversions_reject_wrong_types() {
        let err = i64::try_from(Value::Text("1".into())).unwrap_err();
        assert_eq!(err.to_string(), "Custom error: expected int value, found text");
    }

    #[test]
    fn narrower_integers_are_range_checked() {
        assert_eq!(u8::try_from(Value::Int(200)).unwrap(), 200);
        assert_eq!(u64::try_from(Value::Int(i64::MAX)).unwrap(), i64::MAX as u64);
        let err = u64::try_from(Value::Int(-1)).unwrap_err();
        assert_eq!(err.to_string(), "Custom error: int value -1 is out of range for u64");
        assert!(i8::try_from(Value::Int(128)).is_err());
        let absent: Option<u32> = Value::Null.try_into().unwrap();
        assert_eq!(absent, None);
    }

    #[test]
    fn floats_widen_and_narrow() {
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(f32::try_from(Value::Int(2)).unwrap(), 2.0);
    }

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::Text("  ".into()).is_blank());
        assert!(!Value::Int(0).is_blank());
    }

    #[test]
    fn json_rendering() {
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Text("d".into()).to_json(), serde_json::json!("d"));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    }
}
