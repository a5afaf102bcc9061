use crate::value::{Row, Value};
use std::collections::{BTreeMap, HashMap};

/// Result of looking an attribute up: either the materialized value or nothing fetched yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    Present(&'a Value),
    Absent,
}

impl<'a> Slot<'a> {
    pub fn is_present(&self) -> bool {
        matches!(self, Slot::Present(_))
    }

    pub fn value(self) -> Option<&'a Value> {
        match self {
            Slot::Present(v) => Some(v),
            Slot::Absent => None,
        }
    }
}

/// A pending user change: value before the first assignment (None if it was absent) and the current value.
pub type Change = (Option<Value>, Value);

/// Per-record store of materialized attributes plus their pending changes.
///
/// An attribute is present once it has a key in `values`, `Null` included. Presence never
/// goes away again; only replacing the whole set (a reload) forgets attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    values: HashMap<String, Value>,
    // original value per dirty attribute, captured when it first changed
    dirty: HashMap<String, Option<Value>>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_row(row: Row) -> Self {
        Self { values: row.into_iter().collect(), dirty: HashMap::new() }
    }

    pub fn get(&self, name: &str) -> Slot<'_> {
        match self.values.get(name) {
            Some(v) => Slot::Present(v),
            None => Slot::Absent,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Assigns a value. The attribute becomes dirty when the value actually changes (or was absent)
    /// and clean again once it is set back to the value it had before the first change.
    pub fn set(&mut self, name: &str, value: Value) {
        let previous = self.values.get(name).cloned();
        if previous.as_ref() == Some(&value) {
            return;
        }
        match self.dirty.get(name) {
            Some(original) if original.as_ref() == Some(&value) => {
                self.dirty.remove(name);
            }
            Some(_) => {}
            None => {
                self.dirty.insert(name.to_string(), previous);
            }
        }
        self.values.insert(name.to_string(), value);
    }

    pub fn clear_dirty(&mut self, name: &str) {
        self.dirty.remove(name);
    }

    /// Stores a value fetched from storage: present and not a pending change.
    pub fn fill(&mut self, name: &str, value: Value) {
        self.set(name, value);
        self.clear_dirty(name);
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains_key(name)
    }

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty(&self) -> impl Iterator<Item = &str> {
        self.dirty.keys().map(String::as_str)
    }

    pub fn changes(&self) -> BTreeMap<String, Change> {
        self.dirty
            .iter()
            .filter_map(|(name, original)| {
                self.values.get(name).map(|current| (name.clone(), (original.clone(), current.clone())))
            })
            .collect()
    }

    /// Forgets all pending changes, typically after the record was persisted.
    pub fn changes_applied(&mut self) {
        self.dirty.clear();
    }

    pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_row(&self) -> Row {
        self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
