//! Namespaced identifier type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing a malformed identifier string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The string has no `namespace:path` separator
    #[error("identifier {0:?} is missing a ':' separator")]
    MissingSeparator(String),
    /// Namespace or path segment is empty
    #[error("identifier {0:?} has an empty segment")]
    EmptySegment(String),
}

/// A namespaced identifier such as `core:marker`.
///
/// Identifiers name externally defined resources (structures, markers,
/// registry entries) without this crate knowing what they refer to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Creates an identifier from its two segments.
    #[must_use]
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Parses a `namespace:path` string.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let (namespace, path) = s
            .split_once(':')
            .ok_or_else(|| IdentifierError::MissingSeparator(s.to_owned()))?;
        if namespace.is_empty() || path.is_empty() {
            return Err(IdentifierError::EmptySegment(s.to_owned()));
        }
        Ok(Self::new(namespace, path))
    }

    /// Returns the namespace segment.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the path segment.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
