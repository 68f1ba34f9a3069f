//! Core canonical data structures: [`Component`] and [`ParseResult`].
//!
//! Both CycloneDX and SPDX documents normalize into these structures; every
//! downstream consumer (analytics, audit, export) reads this model and never
//! the source formats. Optional fields serialize as absent — never as null —
//! so CSV column semantics stay consistent for the export subsystem.

use super::ComponentId;
use super::Vulnerability;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SBOM source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SbomFormat {
    Cyclonedx,
    Spdx,
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cyclonedx => write!(f, "cyclonedx"),
            Self::Spdx => write!(f, "spdx"),
        }
    }
}

/// Component type classification.
///
/// SPDX packages carry no type taxonomy; they default to `Library`.
/// CycloneDX types outside this set (e.g. `operating-system`) map to `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    #[default]
    Library,
    Framework,
    Application,
    Container,
    Other,
}

impl ComponentType {
    /// Map a CycloneDX `type` token into the canonical taxonomy.
    pub fn from_token(token: &str) -> Self {
        match token {
            "library" => Self::Library,
            "framework" => Self::Framework,
            "application" => Self::Application,
            "container" => Self::Container,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Framework => write!(f, "framework"),
            Self::Application => write!(f, "application"),
            Self::Container => write!(f, "container"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Cryptographic hash entry; algorithm names pass through unmodified
/// (e.g. `SHA-256`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HashEntry {
    pub algorithm: String,
    pub digest: String,
}

/// A software unit discovered in an SBOM document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Canonical identifier, unique within the parse result.
    pub id: ComponentId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Normalized license tokens, alphabetically ordered.
    pub licenses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Vec<HashEntry>>,
    /// Ids of nested/declared sub-components, in discovery order.
    ///
    /// Every entry resolves to another component in the same result; dangling
    /// edges are dropped during parsing with a recorded warning. `dependents`
    /// is not stored — consumers derive it by inverting this list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ComponentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Component {
    /// Create a component with the minimal required fields.
    pub fn new(id: ComponentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            version: None,
            component_type: ComponentType::default(),
            licenses: Vec::new(),
            purl: None,
            cpe: None,
            hash: None,
            dependencies: Vec::new(),
            description: None,
        }
    }

    /// Display name with version when known (`express@4.18.0`).
    pub fn display_name(&self) -> String {
        match &self.version {
            Some(v) => format!("{}@{}", self.name, v),
            None => self.name.clone(),
        }
    }
}

/// Aggregate metadata over a parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub format: SbomFormat,
    pub format_version: String,
    /// Always equals `components.len()` — consumers rely on this invariant.
    pub component_count: usize,
    /// SPDX `dataLicense`, recorded for the validator; absent for CycloneDX.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_license: Option<String>,
}

/// The pipeline's terminal artifact.
///
/// Created fresh per parse call and immutable once returned; downstream
/// consumers derive new views rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub components: Vec<Component>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub metadata: ResultMetadata,
    /// Per-entry recovery notes (skipped entries, dropped edges, bad values).
    #[serde(skip)]
    #[schemars(skip)]
    pub warnings: Vec<String>,
    /// Vulnerability references that could not be mapped to a canonical id.
    #[serde(skip)]
    #[schemars(skip)]
    pub unresolved_refs: usize,
    /// xxh3 hash over the normalized content, for cheap equality checks.
    #[serde(skip)]
    #[schemars(skip)]
    pub content_hash: u64,
}

impl ParseResult {
    /// Look up a component by canonical id.
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| &c.id == id)
    }

    /// Ids of components that depend on `id`, derived by inverting
    /// `dependencies`.
    pub fn dependents_of(&self, id: &ComponentId) -> Vec<&ComponentId> {
        self.components
            .iter()
            .filter(|c| c.dependencies.contains(id))
            .map(|c| &c.id)
            .collect()
    }

    /// Count vulnerabilities per canonical severity.
    pub fn severity_counts(&self) -> super::SeverityCounts {
        let mut counts = super::SeverityCounts::default();
        for vuln in &self.vulnerabilities {
            counts.record(vuln.severity);
        }
        counts
    }
}
