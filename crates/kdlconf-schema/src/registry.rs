//! # Schema Registry
//!
//! Explicit mapping from a type key to its schema, populated once at
//! startup. A key can be referenced before it is defined: `reference`
//! hands out a `Schema::Deferred` bound to a slot that `define` fills
//! later, so self-referential and mutually recursive type graphs can be
//! declared in any order.
//!
//! ## Typed Registration
//!
//! `define_type::<T>()` keys the schema by `std::any::type_name::<T>()` and
//! captures `T::default()` as the Object prototype, so the type's own
//! defaults become field fallbacks during resolution.
//!
//! ## Thread Safety
//!
//! The slot map sits behind a `parking_lot::RwLock`; slots are `OnceLock`s
//! and are never replaced once filled. The registry is cheap to clone and
//! clones share state.
//!
//! ## Lifetime
//!
//! A self-referential schema holds a strong reference to its own slot, so
//! its slot is never freed. Registries are built once and live for the
//! whole program.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use kdlconf_core::Value;
use parking_lot::RwLock;
use serde::Serialize;

use crate::builder::ObjectBuilder;
use crate::error::SchemaError;
use crate::schema::{DeferredSchema, IntoSchema, Schema};

type Slot = Arc<OnceLock<Schema>>;

/// Type key → lazily-filled schema slot.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    slots: Arc<RwLock<BTreeMap<String, Slot>>>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(key) {
            return Arc::clone(slot);
        }
        let mut guard = self.slots.write();
        Arc::clone(guard.entry(key.to_string()).or_default())
    }

    /// A deferred reference to `key`, valid before and after definition.
    pub fn reference(&self, key: &str) -> Schema {
        Schema::Deferred(DeferredSchema {
            key: Arc::from(key),
            slot: self.slot(key),
        })
    }

    /// Fill the slot for `key` and return a reference to it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::AlreadyDefined` if `key` already has a schema.
    pub fn define(&self, key: &str, schema: impl IntoSchema) -> Result<Schema, SchemaError> {
        let slot = self.slot(key);
        slot.set(schema.into_schema())
            .map_err(|_| SchemaError::AlreadyDefined {
                key: key.to_string(),
            })?;
        tracing::debug!(key, "schema defined");
        Ok(self.reference(key))
    }

    /// The schema defined for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Schema> {
        self.slots.read().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Define the Object schema for `T`, with `T::default()` as prototype.
    ///
    /// `describe` receives a builder already carrying the prototype. It may
    /// call [`reference_type`](Self::reference_type) for `T` itself.
    ///
    /// # Errors
    ///
    /// - `SchemaError::Prototype` if `T::default()` fails to serialize.
    /// - `SchemaError::PrototypeNotObject` if it serializes to a non-object.
    /// - `SchemaError::AlreadyDefined` if `T` was defined before.
    pub fn define_type<T>(
        &self,
        describe: impl FnOnce(ObjectBuilder) -> ObjectBuilder,
    ) -> Result<Schema, SchemaError>
    where
        T: Default + Serialize + 'static,
    {
        let key = std::any::type_name::<T>();
        let short = short_type_name(key).to_string();

        let mut prototype = match Value::from_serialize(&T::default()) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                return Err(SchemaError::PrototypeNotObject {
                    type_name: short,
                    found: value_kind(&other),
                })
            }
            Err(source) => {
                return Err(SchemaError::Prototype {
                    type_name: short,
                    source,
                })
            }
        };
        prototype.type_name = Some(short);

        // Runs without holding the lock: `describe` may take references.
        let schema = describe(ObjectBuilder::with_prototype(prototype)).build();
        self.define(key, schema)
    }

    /// A deferred reference to `T`'s schema.
    pub fn reference_type<T: 'static>(&self) -> Schema {
        self.reference(std::any::type_name::<T>())
    }

    /// Keys that were referenced but never defined.
    pub fn unresolved(&self) -> Vec<String> {
        self.slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.get().is_none())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of known keys, defined or not.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Whether no key is known.
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

/// Last path segment of a type name, generics stripped.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::List(_) => "list",
        Value::Object(_) => "object",
        Value::Node(_) => "node",
    }
}
