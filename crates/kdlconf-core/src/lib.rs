//! # kdlconf-core — Foundational Types for kdlconf
//!
//! This crate defines the shapes every other kdlconf crate agrees on:
//!
//! 1. **The document model.** `ConfigNode` and `ConfigValue` describe the
//!    tree an external parser hands to the deserialization engine: a node
//!    name, ordered positional values, named properties, and ordered
//!    children. The engine only ever reads this tree.
//!
//! 2. **The value-type taxonomy.** `ValueType` is the closed set of scalar
//!    kinds a schema slot may accept. Exhaustive `match` on it is expected
//!    everywhere.
//!
//! 3. **The output tree.** `Value` is what the engine produces. It converts
//!    into strongly-typed application structs through `serde`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kdlconf-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use document::{ConfigDocument, ConfigNode, ConfigValue, NodeTags, ValueType};
pub use error::CoreError;
pub use value::{ObjectValue, Value};
