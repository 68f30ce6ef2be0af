//! # Deserializer
//!
//! Recursive descent over a `ConfigNode` tree, driven by a `Schema` tree.
//! Every kind handler records problems on the `TraversalContext` and keeps
//! going, returning the best value it can (often the caller's fallback or
//! `Value::Null`). A failure in one field, child or value never aborts its
//! siblings.
//!
//! ## Entry Points
//!
//! - [`Deserializer::deserialize`]: top-level call. Owns a fresh context
//!   and surfaces every recorded issue at once.
//! - [`Deserializer::deserialize_in`]: nested call against a context the
//!   caller owns. Never fails; the caller inspects the context.
//!
//! ## Resolution Order for Absent Slots
//!
//! Properties and values: `optional` (fallback) before `default`
//! (synthesized placeholder) before a missing-mandatory issue. A single
//! child selector reports first when neither flag is set, then prefers
//! `default` over `optional`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use kdlconf_core::{ConfigDocument, ConfigNode, Value};
use serde::de::DeserializeOwned;

use crate::config::DeserializerConfig;
use crate::context::TraversalContext;
use crate::error::{DeserializeError, IssueKind};
use crate::schema::{
    ChildrenSchema, DeferredSchema, DynamicContext, DynamicSchema, ObjectSchema, PropertySchema,
    Schema, ValuesSchema,
};
use crate::types;

/// A user-supplied value handed to every dynamic schema factory.
pub type UserContext = Arc<dyn Any + Send + Sync>;

/// The schema-driven deserialization engine.
///
/// Holds no per-call state; one instance can serve any number of calls,
/// including concurrent ones.
#[derive(Clone, Default)]
pub struct Deserializer {
    config: DeserializerConfig,
    user: Option<UserContext>,
}

impl fmt::Debug for Deserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("config", &self.config)
            .field("user", &self.user.is_some())
            .finish()
    }
}

impl Deserializer {
    /// An engine with default configuration and no user context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: DeserializerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a value that dynamic factories can read back with
    /// [`DynamicContext::user`].
    pub fn with_user_context(mut self, user: UserContext) -> Self {
        self.user = Some(user);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &DeserializerConfig {
        &self.config
    }

    /// A fresh traversal context for a caller-driven nested run.
    pub fn context(&self) -> TraversalContext {
        TraversalContext::new(&self.config)
    }

    /// Deserialize `node` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns `DeserializeError::Failed` carrying every issue recorded
    /// anywhere in the tree.
    pub fn deserialize(&self, node: &ConfigNode, schema: &Schema) -> Result<Value, DeserializeError> {
        let mut cx = self.context();
        let value = self.deserialize_in(node, schema, &mut cx, Value::Null);
        tracing::debug!(
            root = %node.name,
            schema = schema.kind_name(),
            issues = cx.issues().len(),
            "deserialization finished"
        );
        cx.finish()?;
        Ok(value)
    }

    /// Wrap a parsed document in the synthetic root and deserialize it.
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](Self::deserialize).
    pub fn deserialize_document(
        &self,
        document: ConfigDocument,
        schema: &Schema,
    ) -> Result<Value, DeserializeError> {
        self.deserialize(&document.into_root(), schema)
    }

    /// Deserialize and convert the result into `T`.
    ///
    /// # Errors
    ///
    /// - `DeserializeError::Failed` if the document does not fit the schema.
    /// - `DeserializeError::Conversion` if the result does not fit `T`.
    pub fn deserialize_into<T: DeserializeOwned>(
        &self,
        node: &ConfigNode,
        schema: &Schema,
    ) -> Result<T, DeserializeError> {
        Ok(self.deserialize(node, schema)?.into_typed()?)
    }

    /// Deserialize `node` against `schema`, recording issues on `cx`.
    ///
    /// `default` is the fallback returned by `optional` selectors when
    /// their target is absent.
    pub fn deserialize_in(
        &self,
        node: &ConfigNode,
        schema: &Schema,
        cx: &mut TraversalContext,
        default: Value,
    ) -> Value {
        tracing::trace!(kind = schema.kind_name(), path = %cx.path(), "resolve");
        match schema {
            Schema::Object(object) => self.object(node, object, cx),
            Schema::Children(children) => self.children(node, children, cx, default),
            Schema::Values(values) => self.values(node, values, cx, default),
            Schema::Property(property) => self.property(node, property, cx, default),
            Schema::Tag => Value::String(node.name.clone()),
            Schema::Node => Value::Node(Box::new(node.clone())),
            Schema::Deferred(deferred) => self.deferred(node, deferred, cx, default),
            Schema::Dynamic(dynamic) => self.dynamic(node, dynamic, cx, default),
        }
    }

    // ─── Object ──────────────────────────────────────────────────────

    fn object(&self, node: &ConfigNode, schema: &ObjectSchema, cx: &mut TraversalContext) -> Value {
        let mut target = schema.instantiate();
        for (name, field) in schema.fields() {
            let fallback = target.get(name).cloned().unwrap_or_default();
            let value = self.deserialize_in(node, field, cx, fallback);
            target.set(name.clone(), value);
        }
        Value::Object(target)
    }

    // ─── Children ────────────────────────────────────────────────────

    fn children(
        &self,
        node: &ConfigNode,
        schema: &ChildrenSchema,
        cx: &mut TraversalContext,
        default: Value,
    ) -> Value {
        let tags = schema.tags.resolve();
        let mut matched = node
            .children
            .iter()
            .filter_map(|child| tags.lookup(&child.name).map(|s| (child, s)));

        if schema.single {
            if let Some((child, item)) = matched.next() {
                return self.scoped(child, item, cx);
            }
            if !schema.default && !schema.optional {
                cx.add_error(
                    IssueKind::MissingMandatory,
                    format!(
                        "Expected one of the following child tags, found none: {}",
                        tags.describe()
                    ),
                );
                return default;
            }
            if !schema.default {
                return default;
            }
            return match tags.first() {
                Some(item) => self.scoped(&ConfigNode::empty(), item, cx),
                None => {
                    cx.add_error(
                        IssueKind::InvalidSchema,
                        "Invalid schema: default child requested with no tags declared",
                    );
                    default
                }
            };
        }

        let matched: Vec<_> = matched.collect();
        if matched.is_empty() {
            if schema.optional {
                return default;
            }
            if schema.default {
                return match default {
                    Value::Null => Value::List(Vec::new()),
                    other => other,
                };
            }
            cx.add_error(
                IssueKind::MissingMandatory,
                format!(
                    "Expected one or more of the following child tags, found none: {}",
                    tags.describe()
                ),
            );
        }

        Value::List(
            matched
                .into_iter()
                .map(|(child, item)| self.scoped(child, item, cx))
                .collect(),
        )
    }

    /// Resolve `item` against `child` inside its own traversal frame.
    fn scoped(&self, child: &ConfigNode, item: &Schema, cx: &mut TraversalContext) -> Value {
        cx.begin_child(&child.name);
        let value = self.deserialize_in(child, item, cx, Value::Null);
        cx.end_child(child);
        value
    }

    // ─── Values ──────────────────────────────────────────────────────

    fn values(
        &self,
        node: &ConfigNode,
        schema: &ValuesSchema,
        cx: &mut TraversalContext,
        default: Value,
    ) -> Value {
        let len = node.values.len();
        let end = match schema.length {
            Some(l) => schema.start.checked_add(l).filter(|&end| end <= len),
            None => Some(len),
        };
        let in_bounds = schema.start < len && (schema.single || end.is_some());

        if in_bounds {
            if schema.single {
                let value = &node.values[schema.start];
                cx.begin_value(true, schema.start, None);
                if let Some(mismatch) = types::validate(value, &schema.types) {
                    cx.add_error(IssueKind::TypeMismatch, mismatch.to_string());
                }
                cx.end_value();
                return Value::from(value);
            }

            let slice = &node.values[schema.start..end.unwrap_or(len)];
            for (offset, value) in slice.iter().enumerate() {
                if let Some(mismatch) = types::validate(value, &schema.types) {
                    cx.begin_value(true, schema.start + offset, None);
                    cx.add_error(IssueKind::TypeMismatch, mismatch.to_string());
                    cx.end_value();
                }
            }
            return Value::List(slice.iter().map(Value::from).collect());
        }

        if schema.optional {
            return default;
        }
        if schema.default {
            if !schema.single {
                return Value::List(Vec::new());
            }
            return synthesize(&schema.types, cx);
        }

        cx.begin_value(schema.single, schema.start, schema.length);
        cx.add_error(IssueKind::MissingMandatory, "Mandatory value(s) missing");
        cx.end_value();
        Value::Null
    }

    // ─── Property ────────────────────────────────────────────────────

    fn property(
        &self,
        node: &ConfigNode,
        schema: &PropertySchema,
        cx: &mut TraversalContext,
        default: Value,
    ) -> Value {
        if let Some(value) = node.property(&schema.name) {
            cx.begin_property(&schema.name);
            if let Some(mismatch) = types::validate(value, &schema.types) {
                cx.add_error(IssueKind::TypeMismatch, mismatch.to_string());
            }
            cx.end_property();
            return Value::from(value);
        }

        if schema.optional {
            return default;
        }
        if schema.default {
            return synthesize(&schema.types, cx);
        }

        cx.begin_property(&schema.name);
        cx.add_error(IssueKind::MissingMandatory, "Mandatory property missing");
        cx.end_property();
        Value::Null
    }

    // ─── Deferred / Dynamic ──────────────────────────────────────────

    fn deferred(
        &self,
        node: &ConfigNode,
        schema: &DeferredSchema,
        cx: &mut TraversalContext,
        default: Value,
    ) -> Value {
        match schema.resolve() {
            Some(inner) => self.deserialize_in(node, inner, cx, default),
            None => {
                tracing::warn!(key = schema.key(), path = %cx.path(), "unresolved schema reference");
                Value::Null
            }
        }
    }

    fn dynamic(
        &self,
        node: &ConfigNode,
        schema: &DynamicSchema,
        cx: &mut TraversalContext,
        default: Value,
    ) -> Value {
        let selected = {
            let dynamic_cx = DynamicContext {
                user: self.user.as_deref(),
                traversal: cx,
            };
            schema.select(node, &dynamic_cx)
        };
        match selected {
            Ok(selected) => self.deserialize_in(node, &selected, cx, default),
            Err(message) => {
                cx.add_error(IssueKind::SelectionFailed, message);
                default
            }
        }
    }
}

/// The `default` placeholder for an absent scalar slot.
fn synthesize(allowed: &[kdlconf_core::ValueType], cx: &mut TraversalContext) -> Value {
    match types::default_for(allowed) {
        Ok(value) => Value::from(value),
        Err(e) => {
            cx.add_error(IssueKind::InvalidSchema, e.to_string());
            Value::Null
        }
    }
}
