//! # Error Types — Schema Errors and Aggregated Deserialization Issues
//!
//! Two distinct failure channels exist:
//!
//! - `SchemaError` — the schema itself is wrong (empty allowed-type set,
//!   duplicate registry definition, unusable prototype). These are
//!   programming errors in the schema declaration.
//! - `DeserializeError` — the document does not fit the schema. Every
//!   problem found during one top-level call is collected as an `Issue`
//!   carrying its full structural path, and surfaced together.

use std::fmt;

use colored::Colorize;
use kdlconf_core::CoreError;
use thiserror::Error;

/// Error in a schema declaration.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A default was requested for a slot that allows no value type.
    #[error("Invalid types, cannot produce default.")]
    EmptyTypeSet,

    /// A registry key was defined twice.
    #[error("schema '{key}' is already defined")]
    AlreadyDefined {
        /// The duplicated registry key.
        key: String,
    },

    /// A typed prototype did not serialize to an object.
    #[error("prototype for '{type_name}' must serialize to an object, got {found}")]
    PrototypeNotObject {
        /// Type whose `Default` value was captured.
        type_name: String,
        /// What the prototype serialized to instead.
        found: &'static str,
    },

    /// A typed prototype failed to serialize.
    #[error("prototype for '{type_name}' failed to serialize: {source}")]
    Prototype {
        /// Type whose `Default` value was captured.
        type_name: String,
        /// Underlying conversion failure.
        #[source]
        source: CoreError,
    },
}

/// Classification of a recorded deserialization issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// A required property, value slot, or child tag set was absent.
    MissingMandatory,
    /// A present value's runtime kind is not in the allowed set.
    TypeMismatch,
    /// A child node was never claimed by any child selector in its scope.
    UnexpectedChild,
    /// The schema cannot be applied (e.g. default for an empty type set).
    InvalidSchema,
    /// A dynamic factory rejected the node it was given.
    SelectionFailed,
}

/// One problem found while walking the document, with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Category of the problem.
    pub kind: IssueKind,
    /// Rendered structural path, e.g. `top() > role[nth(0)] > user[nth(1)][val(1)]`.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t-{}\n\t  {}", self.message, self.path)
    }
}

/// Every issue recorded during one top-level deserialization call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues {
    issues: Vec<Issue>,
}

impl Issues {
    pub(crate) fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns a slice of all issues, in the order they were recorded.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Iterate over `(path, message)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.issues
            .iter()
            .map(|i| (i.path.as_str(), i.message.as_str()))
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Issue> {
        self.issues
    }

    /// Terminal-oriented rendering: one colored `ERROR` entry per issue.
    pub fn pretty(&self) -> String {
        self.issues
            .iter()
            .map(|i| {
                format!(
                    "{} {}\n      in {}",
                    "ERROR".red(),
                    i.message,
                    i.path.bright_black()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deserialization failed with the following errors:")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "\n{issue}")?;
        }
        Ok(())
    }
}

/// Error returned by a top-level deserialization call.
#[derive(Error, Debug)]
pub enum DeserializeError {
    /// The document did not fit the schema.
    #[error("{0}")]
    Failed(Issues),

    /// The output tree could not be converted into the requested type.
    #[error("{0}")]
    Conversion(#[from] CoreError),
}

impl DeserializeError {
    /// The collected issues, when the document did not fit the schema.
    pub fn issues(&self) -> Option<&Issues> {
        match self {
            Self::Failed(issues) => Some(issues),
            Self::Conversion(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(message: &str, path: &str) -> Issue {
        Issue {
            kind: IssueKind::MissingMandatory,
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_issues_display_format() {
        let issues = Issues::new(vec![
            issue("Mandatory property missing", "top() > remote[nth(0)][prop(port)]"),
            issue("Unexpected child x", "top() > remote[nth(0)]"),
        ]);
        assert_eq!(
            issues.to_string(),
            "Deserialization failed with the following errors:\n\
             \t-Mandatory property missing\n\t  top() > remote[nth(0)][prop(port)]\n\
             \n\
             \t-Unexpected child x\n\t  top() > remote[nth(0)]"
        );
    }

    #[test]
    fn test_pretty_one_entry_per_issue() {
        colored::control::set_override(false);
        let issues = Issues::new(vec![issue("a", "p1"), issue("b", "p2")]);
        assert_eq!(issues.pretty(), "ERROR a\n      in p1\nERROR b\n      in p2");
    }

    #[test]
    fn test_pairs_expose_path_and_message() {
        let issues = Issues::new(vec![issue("m", "p")]);
        let pairs: Vec<_> = issues.pairs().collect();
        assert_eq!(pairs, vec![("p", "m")]);
    }

    #[test]
    fn test_empty_type_set_message() {
        assert_eq!(
            SchemaError::EmptyTypeSet.to_string(),
            "Invalid types, cannot produce default."
        );
    }
}
