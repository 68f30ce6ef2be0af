//! # Schema Model
//!
//! A `Schema` tells the deserializer how to turn the current document node
//! into a value. There are eight kinds:
//!
//! | Kind | Yields |
//! |------|--------|
//! | `Object` | one sub-result per declared field, all read from the same node |
//! | `Children` | the matching child node(s), selected by tag |
//! | `Values` | a positional value, or a slice of them |
//! | `Property` | a named attribute |
//! | `Tag` | the node's own name |
//! | `Node` | the raw node |
//! | `Deferred` | whatever a lazily-registered schema yields |
//! | `Dynamic` | whatever a schema chosen from the node at runtime yields |
//!
//! Schemas are immutable once built and carry no per-call state, so one
//! schema tree is shared freely across threads and calls. Large payloads sit
//! behind `Arc`, which keeps `Schema::clone` cheap.
//!
//! Only `Children`, `Values` and `Property` carry the `optional` / `default`
//! policies.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use kdlconf_core::{ConfigNode, ObjectValue, ValueType};

use crate::context::TraversalContext;

/// A resolution strategy for one document node.
#[derive(Clone)]
pub enum Schema {
    /// Composite: one sub-schema per field.
    Object(Arc<ObjectSchema>),
    /// Selects matching child node(s) by tag.
    Children(ChildrenSchema),
    /// Selects a positional value or slice.
    Values(ValuesSchema),
    /// Selects a named attribute.
    Property(PropertySchema),
    /// Yields the current node's name.
    Tag,
    /// Yields the current node unchanged.
    Node,
    /// A lazily-resolved reference into a `SchemaRegistry`.
    Deferred(DeferredSchema),
    /// A schema chosen at deserialization time.
    Dynamic(DynamicSchema),
}

impl Schema {
    /// Short lowercase name of this schema's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Children(_) => "children",
            Self::Values(_) => "values",
            Self::Property(_) => "property",
            Self::Tag => "tag",
            Self::Node => "node",
            Self::Deferred(_) => "deferred",
            Self::Dynamic(_) => "dynamic",
        }
    }

    /// Whether `self` and `other` are the same flag-carrying family
    /// (Children+Children, Values+Values, Property+Property).
    pub fn same_family(&self, other: &Schema) -> bool {
        matches!(
            (self, other),
            (Self::Children(_), Self::Children(_))
                | (Self::Values(_), Self::Values(_))
                | (Self::Property(_), Self::Property(_))
        )
    }

    /// `(optional, default)` for flag-carrying kinds.
    pub fn flags(&self) -> Option<(bool, bool)> {
        match self {
            Self::Children(s) => Some((s.optional, s.default)),
            Self::Values(s) => Some((s.optional, s.default)),
            Self::Property(s) => Some((s.optional, s.default)),
            _ => None,
        }
    }

    pub(crate) fn flags_mut(&mut self) -> Option<(&mut bool, &mut bool)> {
        match self {
            Self::Children(s) => Some((&mut s.optional, &mut s.default)),
            Self::Values(s) => Some((&mut s.optional, &mut s.default)),
            Self::Property(s) => Some((&mut s.optional, &mut s.default)),
            _ => None,
        }
    }

    /// Mark this schema `optional`. No effect on kinds without flags.
    pub fn optional(mut self) -> Self {
        if let Some((optional, _)) = self.flags_mut() {
            *optional = true;
        }
        self
    }

    /// Mark this schema `default`. No effect on kinds without flags.
    pub fn with_default(mut self) -> Self {
        if let Some((_, default)) = self.flags_mut() {
            *default = true;
        }
        self
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(s) => fmt::Debug::fmt(s, f),
            Self::Children(s) => fmt::Debug::fmt(s, f),
            Self::Values(s) => fmt::Debug::fmt(s, f),
            Self::Property(s) => fmt::Debug::fmt(s, f),
            Self::Tag => f.write_str("Tag"),
            Self::Node => f.write_str("Node"),
            Self::Deferred(s) => fmt::Debug::fmt(s, f),
            Self::Dynamic(s) => fmt::Debug::fmt(s, f),
        }
    }
}

// ─── Object ──────────────────────────────────────────────────────────

/// Composite schema: fields are resolved in declaration order, each against
/// the same node.
#[derive(Debug)]
pub struct ObjectSchema {
    pub(crate) type_name: Option<String>,
    pub(crate) prototype: Option<ObjectValue>,
    pub(crate) fields: Vec<(String, Schema)>,
}

impl ObjectSchema {
    /// Registered type name, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Declared fields in resolution order.
    pub fn fields(&self) -> &[(String, Schema)] {
        &self.fields
    }

    /// Look up a field's schema.
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, s)| s)
    }

    /// The starting value for one resolution: the prototype when declared,
    /// else an empty mapping.
    pub fn instantiate(&self) -> ObjectValue {
        match (&self.prototype, &self.type_name) {
            (Some(prototype), _) => prototype.clone(),
            (None, Some(name)) => ObjectValue::new(name.clone()),
            (None, None) => ObjectValue::untyped(),
        }
    }
}

// ─── Children ────────────────────────────────────────────────────────

/// Key of a tag-selector entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagKey {
    /// Matches children with exactly this name.
    Name(String),
    /// Matches any child whose name has no entry of its own.
    Any,
}

impl From<&str> for TagKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TagKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Any => f.write_str("*"),
        }
    }
}

/// Ordered mapping from tag key to item schema. Keys are unique.
#[derive(Debug, Clone, Default)]
pub struct TagMap {
    entries: Vec<(TagKey, Schema)>,
}

impl TagMap {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<TagKey>, schema: Schema) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = schema,
            None => self.entries.push((key, schema)),
        }
    }

    /// Builder-style entry for a named tag.
    pub fn tag(mut self, name: impl Into<String>, schema: impl IntoSchema) -> Self {
        self.insert(TagKey::Name(name.into()), schema.into_schema());
        self
    }

    /// Builder-style wildcard entry.
    pub fn any(mut self, schema: impl IntoSchema) -> Self {
        self.insert(TagKey::Any, schema.into_schema());
        self
    }

    /// Schema for a child named `name`: the exact entry, else the wildcard.
    pub fn lookup(&self, name: &str) -> Option<&Schema> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, TagKey::Name(n) if n == name))
            .or_else(|| self.entries.iter().find(|(k, _)| *k == TagKey::Any))
            .map(|(_, s)| s)
    }

    /// The first declared entry's schema.
    pub fn first(&self) -> Option<&Schema> {
        self.entries.first().map(|(_, s)| s)
    }

    /// Declared keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &TagKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Keys joined with `", "` for diagnostics.
    pub fn describe(&self) -> String {
        self.keys()
            .map(TagKey::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Factory producing a tag mapping on demand.
pub type TagFactory = Arc<dyn Fn() -> TagMap + Send + Sync>;

/// The tag set of a Children schema: fixed, or produced per resolution.
#[derive(Clone)]
pub enum TagSchemas {
    /// A mapping built once at declaration time.
    Fixed(Arc<TagMap>),
    /// A factory evaluated once per Children resolution.
    Factory(TagFactory),
}

impl TagSchemas {
    /// Wrap a factory closure.
    pub fn factory(f: impl Fn() -> TagMap + Send + Sync + 'static) -> Self {
        Self::Factory(Arc::new(f))
    }

    /// Materialize the mapping for one resolution.
    pub fn resolve(&self) -> Arc<TagMap> {
        match self {
            Self::Fixed(map) => Arc::clone(map),
            Self::Factory(f) => Arc::new(f()),
        }
    }
}

impl fmt::Debug for TagSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(map) => f.debug_tuple("Fixed").field(map).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Selects child node(s) by tag.
#[derive(Debug, Clone)]
pub struct ChildrenSchema {
    /// Tag → item schema.
    pub tags: TagSchemas,
    /// Exactly one match (stop at the first) versus all matches.
    pub single: bool,
    /// Absence yields the caller's fallback value.
    pub optional: bool,
    /// Absence yields a synthesized placeholder.
    pub default: bool,
}

impl ChildrenSchema {
    /// A mandatory single-child selector.
    pub fn one(tags: impl IntoTagSchemas) -> Self {
        Self {
            tags: tags.into_tag_schemas(),
            single: true,
            optional: false,
            default: false,
        }
    }

    /// A mandatory multi-child selector: an empty result is an error.
    pub fn many(tags: impl IntoTagSchemas) -> Self {
        Self {
            tags: tags.into_tag_schemas(),
            single: false,
            optional: false,
            default: false,
        }
    }
}

/// Conversion into a Children tag set.
///
/// Accepts one `(tag, schema)` pair, a `TagMap` literal, or a `TagSchemas`
/// (including factories).
pub trait IntoTagSchemas {
    /// Perform the conversion.
    fn into_tag_schemas(self) -> TagSchemas;
}

impl IntoTagSchemas for TagSchemas {
    fn into_tag_schemas(self) -> TagSchemas {
        self
    }
}

impl IntoTagSchemas for TagMap {
    fn into_tag_schemas(self) -> TagSchemas {
        TagSchemas::Fixed(Arc::new(self))
    }
}

impl<S: IntoSchema> IntoTagSchemas for (&str, S) {
    fn into_tag_schemas(self) -> TagSchemas {
        TagMap::new().tag(self.0, self.1).into_tag_schemas()
    }
}

impl<S: IntoSchema> IntoTagSchemas for (String, S) {
    fn into_tag_schemas(self) -> TagSchemas {
        TagMap::new().tag(self.0, self.1).into_tag_schemas()
    }
}

impl<S: IntoSchema> IntoTagSchemas for (TagKey, S) {
    fn into_tag_schemas(self) -> TagSchemas {
        let mut map = TagMap::new();
        map.insert(self.0, self.1.into_schema());
        map.into_tag_schemas()
    }
}

// ─── Values / Property ───────────────────────────────────────────────

/// Selects the positional slice `[start, start + length)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesSchema {
    /// First index of the slice.
    pub start: usize,
    /// Slice length; `None` is unbounded.
    pub length: Option<usize>,
    /// Yield one value rather than a list.
    pub single: bool,
    /// Allowed runtime kinds.
    pub types: Vec<ValueType>,
    /// Absence yields the caller's fallback value.
    pub optional: bool,
    /// Absence yields a synthesized placeholder.
    pub default: bool,
}

/// Selects a named attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    /// Property key.
    pub name: String,
    /// Allowed runtime kinds.
    pub types: Vec<ValueType>,
    /// Absence yields the caller's fallback value.
    pub optional: bool,
    /// Absence yields a synthesized placeholder.
    pub default: bool,
}

// ─── Deferred ────────────────────────────────────────────────────────

/// A reference to a registry slot, filled once when the referenced schema
/// is defined.
#[derive(Clone)]
pub struct DeferredSchema {
    pub(crate) key: Arc<str>,
    pub(crate) slot: Arc<OnceLock<Schema>>,
}

impl DeferredSchema {
    /// Registry key this reference points at.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The referenced schema, once defined.
    pub fn resolve(&self) -> Option<&Schema> {
        self.slot.get()
    }
}

impl fmt::Debug for DeferredSchema {
    // Never descend into the slot: self-referential graphs would recurse forever.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("key", &self.key)
            .field("resolved", &self.slot.get().is_some())
            .finish()
    }
}

// ─── Dynamic ─────────────────────────────────────────────────────────

/// What a dynamic factory sees besides the node itself.
pub struct DynamicContext<'a> {
    pub(crate) user: Option<&'a (dyn Any + Send + Sync)>,
    pub(crate) traversal: &'a TraversalContext,
}

impl<'a> DynamicContext<'a> {
    /// The deserializer's user context, downcast to `T`.
    pub fn user<T: Any>(&self) -> Option<&'a T> {
        self.user.and_then(|u| u.downcast_ref::<T>())
    }

    /// The current rendered location.
    pub fn path(&self) -> String {
        self.traversal.path()
    }
}

/// Factory choosing a schema from the node being processed. An `Err`
/// message is recorded as an issue at the current path.
pub type SchemaFactory =
    Arc<dyn Fn(&ConfigNode, &DynamicContext<'_>) -> Result<Schema, String> + Send + Sync>;

/// A schema chosen at deserialization time.
#[derive(Clone)]
pub struct DynamicSchema {
    pub(crate) factory: SchemaFactory,
}

impl DynamicSchema {
    /// Wrap a factory closure.
    pub fn new(
        factory: impl Fn(&ConfigNode, &DynamicContext<'_>) -> Result<Schema, String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Run the factory.
    ///
    /// # Errors
    ///
    /// Returns the factory's message when it cannot choose a schema for `node`.
    pub fn select(&self, node: &ConfigNode, cx: &DynamicContext<'_>) -> Result<Schema, String> {
        (self.factory)(node, cx)
    }
}

impl fmt::Debug for DynamicSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dynamic(..)")
    }
}

// ─── schemaOf ────────────────────────────────────────────────────────

/// Scalar type markers usable wherever a schema is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// A string.
    String,
    /// A number.
    Number,
    /// A boolean.
    Boolean,
}

impl From<Primitive> for ValueType {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::String => ValueType::String,
            Primitive::Number => ValueType::Number,
            Primitive::Boolean => ValueType::Boolean,
        }
    }
}

/// Conversion of a declaration-site value into a `Schema`.
///
/// - A `Schema` (or anything wrapping one) yields that schema.
/// - A `Primitive` yields a single, optional, length-1 Values schema of
///   that type starting at index 0.
/// - Registry references are already `Schema::Deferred`.
pub trait IntoSchema {
    /// Perform the conversion.
    fn into_schema(self) -> Schema;
}

impl IntoSchema for Schema {
    fn into_schema(self) -> Schema {
        self
    }
}

impl IntoSchema for &Schema {
    fn into_schema(self) -> Schema {
        self.clone()
    }
}

impl IntoSchema for Arc<ObjectSchema> {
    fn into_schema(self) -> Schema {
        Schema::Object(self)
    }
}

impl IntoSchema for ChildrenSchema {
    fn into_schema(self) -> Schema {
        Schema::Children(self)
    }
}

impl IntoSchema for ValuesSchema {
    fn into_schema(self) -> Schema {
        Schema::Values(self)
    }
}

impl IntoSchema for PropertySchema {
    fn into_schema(self) -> Schema {
        Schema::Property(self)
    }
}

impl IntoSchema for DynamicSchema {
    fn into_schema(self) -> Schema {
        Schema::Dynamic(self)
    }
}

impl IntoSchema for Primitive {
    fn into_schema(self) -> Schema {
        Schema::Values(ValuesSchema {
            start: 0,
            length: Some(1),
            single: true,
            types: vec![self.into()],
            optional: true,
            default: false,
        })
    }
}

/// Resolve any declaration-site value into a schema.
pub fn schema_of(x: impl IntoSchema) -> Schema {
    x.into_schema()
}
