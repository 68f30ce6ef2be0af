//! # Error Types

use kdlconf_schema::DeserializeError;
use thiserror::Error;

/// Error from parsing or loading a configuration text.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The text is not a valid document in the adapter's format.
    #[error("{format} parse error: {reason}")]
    Parse {
        /// Name of the adapter that rejected the text.
        format: &'static str,
        /// Parser diagnostic.
        reason: String,
    },

    /// No registered adapter accepts the extension.
    #[error("no format registered for extension '{extension}'")]
    UnknownExtension {
        /// The extension as given by the caller.
        extension: String,
    },

    /// The parsed document does not fit the schema.
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

impl FormatError {
    /// The document issues, when the failure was a schema mismatch.
    pub fn issues(&self) -> Option<&kdlconf_schema::Issues> {
        match self {
            Self::Deserialize(e) => e.issues(),
            _ => None,
        }
    }
}
