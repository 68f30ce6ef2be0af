//! # Format Adapters
//!
//! A format turns raw text into a `ConfigDocument`. The engine never sees
//! the text itself.
//!
//! The two adapters shipped here read the document model directly: a list
//! of nodes, each `{name, values, properties, children}`, encoded as JSON or
//! YAML. Grammar-level parsers for other configuration languages implement
//! the same trait outside this crate.
//!
//! ```yaml
//! - name: remote
//!   values: [backup]
//!   properties: { address: 10.0.0.2, port: 8080 }
//! ```

use kdlconf_core::ConfigDocument;

use crate::error::FormatError;

/// The parse contract every format adapter fulfils.
pub trait ConfigFormat: Send + Sync {
    /// Short adapter name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this adapter handles files with `extension`.
    ///
    /// The comparison ignores case and a leading dot.
    fn accepts(&self, extension: &str) -> bool;

    /// Parse `text` into a document.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::Parse` if `text` is not a valid document.
    fn parse(&self, text: &str) -> Result<ConfigDocument, FormatError>;
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// JSON node-tree adapter (`.json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl ConfigFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn accepts(&self, extension: &str) -> bool {
        normalize(extension) == "json"
    }

    fn parse(&self, text: &str) -> Result<ConfigDocument, FormatError> {
        if text.trim().is_empty() {
            return Ok(ConfigDocument::default());
        }
        let document: ConfigDocument =
            serde_json::from_str(text).map_err(|e| FormatError::Parse {
                format: self.name(),
                reason: e.to_string(),
            })?;
        tracing::debug!(format = self.name(), nodes = document.len(), "document parsed");
        Ok(document)
    }
}

/// YAML node-tree adapter (`.yaml`, `.yml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl ConfigFormat for YamlFormat {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn accepts(&self, extension: &str) -> bool {
        matches!(normalize(extension).as_str(), "yaml" | "yml")
    }

    fn parse(&self, text: &str) -> Result<ConfigDocument, FormatError> {
        if text.trim().is_empty() {
            return Ok(ConfigDocument::default());
        }
        let document: ConfigDocument =
            serde_yaml::from_str(text).map_err(|e| FormatError::Parse {
                format: self.name(),
                reason: e.to_string(),
            })?;
        tracing::debug!(format = self.name(), nodes = document.len(), "document parsed");
        Ok(document)
    }
}
