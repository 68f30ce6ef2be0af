//! # Output Value Tree
//!
//! The deserialization engine produces a dynamic `Value` tree rather than
//! concrete application types. Typed structs are obtained afterwards with
//! [`Value::into_typed`], which routes the tree through `serde_json`.
//!
//! Numbers with no fractional part serialize as integers so that integer
//! fields (`u16` ports, `usize` counts) can be populated from a document
//! whose parser carries every number as `f64`.

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::document::{ConfigNode, ConfigValue};
use crate::error::CoreError;

/// Largest integer magnitude an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A node of the engine's output tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent or explicitly null.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// The result of a multi selector.
    List(Vec<Value>),
    /// The result of an object schema.
    Object(ObjectValue),
    /// A raw document node, passed through untouched.
    Node(Box<ConfigNode>),
}

/// A composite value: ordered named fields plus an optional type name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue {
    /// Registered type name, when the object was built from a typed schema.
    pub type_name: Option<String>,
    fields: Vec<(String, Value)>,
}

impl ObjectValue {
    /// An empty object tagged with a type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: Vec::new(),
        }
    }

    /// An empty, untyped object (a bare mapping).
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Set a field. An existing field keeps its position; a new one is appended.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Iterate over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Value {
    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric payload.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the list payload.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the object payload.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow the raw node payload.
    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Field lookup on an object value; `None` for anything else.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(field))
    }

    /// Convert a JSON value into an output tree.
    ///
    /// JSON objects become untyped `ObjectValue`s preserving key order as
    /// reported by `serde_json`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut object = ObjectValue::untyped();
                for (k, v) in map {
                    object.set(k, Self::from_json(v));
                }
                Self::Object(object)
            }
        }
    }

    /// Capture any serializable value as an output tree.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conversion` if `value` fails to serialize.
    pub fn from_serialize(value: &impl Serialize) -> Result<Self, CoreError> {
        Ok(Self::from_json(serde_json::to_value(value)?))
    }

    /// Convert the tree into a strongly-typed value.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conversion` if the tree's shape does not match `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, CoreError> {
        let json = serde_json::to_value(&self)?;
        Ok(serde_json::from_value(json)?)
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => Self::Null,
            ConfigValue::Boolean(b) => Self::Bool(b),
            ConfigValue::Number(n) => Self::Number(n),
            ConfigValue::String(s) => Self::String(s),
        }
    }
}

impl From<&ConfigValue> for Value {
    fn from(value: &ConfigValue) -> Self {
        Self::from(value.clone())
    }
}

impl From<ConfigNode> for Value {
    fn from(node: ConfigNode) -> Self {
        Self::Node(Box::new(node))
    }
}

impl From<ObjectValue> for Value {
    fn from(object: ObjectValue) -> Self {
        Self::Object(object)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items),
            Self::Object(object) => object.serialize(serializer),
            Self::Node(node) => node.serialize(serializer),
        }
    }
}

impl Serialize for ObjectValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
