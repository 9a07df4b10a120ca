//! Local state of one resource instance
//!
//! A flat map from field name to typed value plus the opaque remote id.
//! A field missing from the map means "not set"; readers that need a value
//! get the zero value of the accessor's type.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Value of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    String(String),
    Set(BTreeSet<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::Set(_) => "set of string",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Set(items) => {
                let items: Vec<String> = items.iter().map(|s| format!("{:?}", s)).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::Set(value.into_iter().collect())
    }
}

impl From<BTreeSet<String>> for FieldValue {
    fn from(value: BTreeSet<String>) -> Self {
        Self::Set(value)
    }
}

/// Declared and observed configuration of one resource instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    /// Remote id, empty until the first successful create
    #[serde(default)]
    id: String,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl LocalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State that only knows the remote id, as produced by an import
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Whether a remote record is believed to exist
    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_str).unwrap_or("")
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    pub fn get_int(&self, name: &str) -> i64 {
        self.get(name).and_then(FieldValue::as_int).unwrap_or(0)
    }

    /// Set members in sorted order
    pub fn get_set(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(FieldValue::as_set)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }
}
