//! Canonical component identifiers.
//!
//! Every component in a parse result is addressed by a [`ComponentId`]
//! deterministically derived from the document-native key (`bom-ref`, `purl`,
//! or `SPDXID`). The mapping is pure string normalization: repeated parses of
//! the same document yield identical ids across runs and across processes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier for a component, unique within one parse result.
///
/// The mapping from a native key is, precisely:
/// 1. trim leading and trailing ASCII whitespace;
/// 2. replace every remaining whitespace or ASCII control character with `-`.
///
/// An empty result means the native key is unusable; callers fall back to the
/// next key in their tier (see [`ComponentId::from_native`] and
/// [`ComponentId::synthetic`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Derive an id from a document-native key.
    ///
    /// Returns `None` when the key normalizes to the empty string.
    pub fn from_native(key: &str) -> Option<Self> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return None;
        }
        let value: String = trimmed
            .chars()
            .map(|c| {
                if c.is_whitespace() || c.is_ascii_control() {
                    '-'
                } else {
                    c
                }
            })
            .collect();
        Some(Self(value))
    }

    /// Last-resort id from component name and version (`name@version`, or the
    /// bare name when no version is known).
    ///
    /// Used only when a component carries none of the native keys; callers
    /// record a warning since synthetic ids are weaker than document keys.
    pub fn synthetic(name: &str, version: Option<&str>) -> Option<Self> {
        let base = match version {
            Some(v) if !v.trim().is_empty() => format!("{}@{}", name.trim(), v.trim()),
            _ => name.trim().to_string(),
        };
        Self::from_native(&base)
    }

    /// The normalized identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for ComponentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ComponentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
