//! # Format Registry
//!
//! Picks an adapter by file extension. Adapters are consulted in
//! registration order; the first that accepts the extension wins.

use std::fmt;
use std::path::Path;

use crate::adapters::{ConfigFormat, JsonFormat, YamlFormat};
use crate::error::FormatError;

/// Ordered set of format adapters.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn ConfigFormat>>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.formats.iter().map(|format| format.name()))
            .finish()
    }
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the JSON and YAML adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonFormat);
        registry.register(YamlFormat);
        registry
    }

    /// Append an adapter.
    pub fn register(&mut self, format: impl ConfigFormat + 'static) {
        self.formats.push(Box::new(format));
    }

    /// The first adapter accepting `extension`.
    pub fn for_extension(&self, extension: &str) -> Option<&dyn ConfigFormat> {
        self.formats
            .iter()
            .find(|format| format.accepts(extension))
            .map(|format| format.as_ref())
    }

    /// The adapter for `path`'s extension.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::UnknownExtension` if the path has no extension
    /// or no adapter accepts it.
    pub fn for_path(&self, path: &Path) -> Result<&dyn ConfigFormat, FormatError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.for_extension(extension)
            .ok_or_else(|| FormatError::UnknownExtension {
                extension: extension.to_string(),
            })
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether no adapter is registered.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
