//! # Deserializer Configuration
//!
//! Knobs for the engine. Deserializable from JSON or YAML so embedding
//! applications can ship them next to their own settings; every field has a
//! default.

use serde::{Deserialize, Serialize};

/// Label of the root frame in rendered paths.
pub const DEFAULT_ROOT_LABEL: &str = "top()";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeserializerConfig {
    /// How the outermost frame renders in issue paths.
    pub root_label: String,
    /// Record an issue for every child that no child selector claimed.
    pub report_unexpected_children: bool,
}

impl Default for DeserializerConfig {
    fn default() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            report_unexpected_children: true,
        }
    }
}

impl DeserializerConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the text is not a valid configuration.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
