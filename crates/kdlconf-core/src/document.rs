//! # Document Model
//!
//! The parsed-tree shape consumed by the deserialization engine. A parser
//! (external to this workspace) produces one `ConfigDocument` per parse
//! call; after that the tree is read-only.
//!
//! ## Node Shape
//!
//! ```text
//! remote "origin" address="10.0.0.1" port=22 {
//! ─┬──── ──┬───── ───────────┬──────────────── ┬
//!  name    values         properties        children
//! ```
//!
//! Nodes have no identity beyond their structural content, so `ConfigNode`
//! derives `PartialEq` and `Clone`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Scalar Values ───────────────────────────────────────────────────

/// A scalar produced by the parser: a positional value or a property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// The absence of a value (`null` / `#null`).
    Null,
    /// A boolean literal.
    Boolean(bool),
    /// Any numeric literal. Integers are carried as `f64`.
    Number(f64),
    /// A string literal.
    String(String),
}

impl ConfigValue {
    /// The runtime kind of this value.
    pub fn kind(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
        }
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

// ─── Value Types ─────────────────────────────────────────────────────

/// The scalar kinds a schema slot may accept.
///
/// | Variant | Accepts |
/// |---------|---------|
/// | `String` | `ConfigValue::String` |
/// | `Number` | `ConfigValue::Number` |
/// | `Boolean` | `ConfigValue::Boolean` |
/// | `Null` | `ConfigValue::Null` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Text values.
    String,
    /// Numeric values.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Explicit null.
    Null,
}

impl ValueType {
    /// Every value type, in declaration order.
    pub const ALL: [ValueType; 4] = [Self::String, Self::Number, Self::Boolean, Self::Null];
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Null => "Null",
        };
        f.write_str(s)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────

/// Secondary type annotations the parser may attach to a node.
///
/// Carried through untouched; the engine never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTags {
    /// Annotation on the node name, e.g. `(ip)addr`.
    pub name: Option<String>,
    /// One annotation slot per positional value.
    pub values: Vec<Option<String>>,
    /// Annotations keyed by property name.
    pub properties: BTreeMap<String, String>,
}

/// One node of the parsed document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// The node's tag.
    pub name: String,
    /// Positional arguments, in document order.
    #[serde(default)]
    pub values: Vec<ConfigValue>,
    /// Named attributes. Keys are unique.
    #[serde(default)]
    pub properties: BTreeMap<String, ConfigValue>,
    /// Child nodes, in document order.
    #[serde(default)]
    pub children: Vec<ConfigNode>,
    /// Type annotations.
    #[serde(default, skip_serializing_if = "NodeTags::is_empty")]
    pub tags: NodeTags,
}

impl NodeTags {
    /// Whether no annotation is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.values.is_empty() && self.properties.is_empty()
    }
}

impl ConfigNode {
    /// A node with the given tag and nothing else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The synthetic empty node: no name, values, properties or children.
    ///
    /// Used when a `default` child selector has to synthesize a match.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The synthetic empty-named root wrapping a parsed document's top-level nodes.
    pub fn root(children: Vec<ConfigNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Append a positional value.
    pub fn with_value(mut self, value: impl Into<ConfigValue>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Set a property, replacing any previous value under the same key.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Append a child node.
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Look up a property by name.
    pub fn property(&self, key: &str) -> Option<&ConfigValue> {
        self.properties.get(key)
    }

    /// Iterate over children carrying the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// The output of one parse call: the document's top-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    /// Top-level nodes in document order.
    pub nodes: Vec<ConfigNode>,
}

impl ConfigDocument {
    /// Build a document from its top-level nodes.
    pub fn new(nodes: Vec<ConfigNode>) -> Self {
        Self { nodes }
    }

    /// Wrap the document in the synthetic empty-named root node.
    pub fn into_root(self) -> ConfigNode {
        ConfigNode::root(self.nodes)
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
