//! # kdlconf-format — Format Adapters & Loading
//!
//! The boundary between configuration text and the deserialization engine.
//! A [`ConfigFormat`] turns text into a `ConfigDocument`; [`load_str`]
//! wraps that document in the synthetic root node and runs the engine
//! against it.
//!
//! ## Crate Policy
//!
//! - No file I/O: callers read files and pick a format with
//!   [`FormatRegistry::for_path`].
//! - Parse failures and schema mismatches stay distinct
//!   (`FormatError::Parse` vs `FormatError::Deserialize`).

pub mod adapters;
pub mod error;
pub mod registry;

pub use adapters::{ConfigFormat, JsonFormat, YamlFormat};
pub use error::FormatError;
pub use registry::FormatRegistry;

use kdlconf_core::Value;
use kdlconf_schema::{Deserializer, Schema};
use serde::de::DeserializeOwned;

/// Parse `text` with `format` and deserialize it against `schema` using a
/// default engine.
///
/// # Errors
///
/// - `FormatError::Parse` if the text is malformed.
/// - `FormatError::Deserialize` if the document does not fit the schema.
pub fn load_str(format: &dyn ConfigFormat, text: &str, schema: &Schema) -> Result<Value, FormatError> {
    load_str_with(&Deserializer::new(), format, text, schema)
}

/// Same as [`load_str`] with a caller-configured engine.
///
/// # Errors
///
/// Same as [`load_str`].
pub fn load_str_with(
    engine: &Deserializer,
    format: &dyn ConfigFormat,
    text: &str,
    schema: &Schema,
) -> Result<Value, FormatError> {
    let document = format.parse(text)?;
    Ok(engine.deserialize_document(document, schema)?)
}

/// Parse, deserialize, and convert into `T`.
///
/// # Errors
///
/// Same as [`load_str`], plus `FormatError::Deserialize` wrapping a
/// conversion error if the result does not fit `T`.
pub fn load_typed<T: DeserializeOwned>(
    format: &dyn ConfigFormat,
    text: &str,
    schema: &Schema,
) -> Result<T, FormatError> {
    let value = load_str(format, text, schema)?;
    value
        .into_typed()
        .map_err(|e| FormatError::Deserialize(e.into()))
}
