//! # kdlconf-schema — Schema Model & Deserialization Engine
//!
//! Turns a parsed `ConfigNode` tree into a `Value` tree (and from there
//! into typed application structs) under the direction of an explicitly
//! declared `Schema`.
//!
//! ## Declaring Schemas (`builder`, `registry`)
//!
//! ```ignore
//! let registry = SchemaRegistry::new();
//! registry.define_type::<Dependency>(|b| {
//!     b.field("name", tag())
//!         .field("version", value_of(0, [ValueType::String]))
//!         .field("dev", property_of("dev", [ValueType::Boolean]))
//!         .optional("dev")
//! })?;
//! ```
//!
//! Types that refer to themselves, or to types declared later, use
//! [`SchemaRegistry::reference_type`], which resolves lazily.
//!
//! ## Running the Engine (`de`)
//!
//! [`Deserializer::deserialize`] walks the tree once, records every problem
//! with its structural path (`top() > role[nth(0)] > path[nth(1)][prop(x)]`),
//! and returns them together as [`DeserializeError::Failed`].
//!
//! ## Crate Policy
//!
//! - Depends only on `kdlconf-core` internally.
//! - Schemas are immutable and `Send + Sync`; per-call state lives in a
//!   `TraversalContext` owned by one call.
//! - Document problems never abort resolution of sibling branches.

pub mod builder;
pub mod config;
pub mod context;
pub mod de;
pub mod error;
pub mod registry;
pub mod schema;
pub mod types;

pub use builder::{
    child, children, dynamic, node, object, property, property_of, tag, value, value_of, values,
    values_of, ObjectBuilder,
};
pub use config::{DeserializerConfig, DEFAULT_ROOT_LABEL};
pub use context::TraversalContext;
pub use de::{Deserializer, UserContext};
pub use error::{DeserializeError, Issue, IssueKind, Issues, SchemaError};
pub use registry::SchemaRegistry;
pub use schema::{
    schema_of, ChildrenSchema, DeferredSchema, DynamicContext, DynamicSchema, IntoSchema,
    IntoTagSchemas, ObjectSchema, Primitive, PropertySchema, Schema, SchemaFactory, TagFactory,
    TagKey, TagMap, TagSchemas, ValuesSchema,
};
pub use types::{default_for, validate, TypeMismatch};
