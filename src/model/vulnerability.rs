//! Vulnerability records and severity normalization.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical severity, normalized from rating tokens of either format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Normalize a severity token (case-insensitive).
    ///
    /// Unrecognized tokens map to the supplied fallback; the pipeline default
    /// fallback is [`Severity::None`].
    pub fn from_token(token: &str, fallback: Severity) -> Self {
        match token.to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            "none" => Self::None,
            _ => fallback,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::None => write!(f, "none"),
        }
    }
}

/// External reference attached to a vulnerability (advisory, source URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VulnerabilityReference {
    pub source: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A known security issue extracted from a CycloneDX document.
///
/// SPDX documents carry no vulnerability section, so SPDX parse results
/// always have an empty vulnerability list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    /// Advisory identifier, e.g. a CVE id.
    pub id: String,
    /// Advisory source name (`NVD`, `GHSA`, …); `unknown` when absent.
    pub source: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvss_vector: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<VulnerabilityReference>,
    /// Canonical component ids, or raw native refs where resolution failed.
    /// Linkage is best-effort, never silently lossy.
    pub affected_components: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Weakness classifiers, rendered as `CWE-n`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Vulnerability {
    /// Create a vulnerability with the minimal required fields.
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            severity: Severity::None,
            cvss_score: None,
            cvss_vector: None,
            description: String::new(),
            references: Vec::new(),
            affected_components: Vec::new(),
            published_at: None,
            modified_at: None,
            cwes: Vec::new(),
            recommendation: None,
        }
    }
}

/// Vulnerability counts per severity, consumed by the metrics engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::None => self.none += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.none
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_tokens_normalize_case_insensitively() {
        assert_eq!(Severity::from_token("HIGH", Severity::None), Severity::High);
        assert_eq!(Severity::from_token("Critical", Severity::None), Severity::Critical);
        assert_eq!(Severity::from_token("low", Severity::None), Severity::Low);
    }

    #[test]
    fn unrecognized_token_uses_fallback() {
        assert_eq!(Severity::from_token("moderate", Severity::None), Severity::None);
        assert_eq!(
            Severity::from_token("moderate", Severity::Medium),
            Severity::Medium
        );
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Severity::High).unwrap(), "high");
        assert_eq!(serde_json::to_value(Severity::None).unwrap(), "none");
    }

    #[test]
    fn optional_vulnerability_fields_serialize_as_absent() {
        let vuln = Vulnerability::new("CVE-2023-12345", "NVD");
        let json = serde_json::to_value(&vuln).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("cvssScore"));
        assert!(!obj.contains_key("cvssVector"));
        assert!(!obj.contains_key("publishedAt"));
        assert!(!obj.contains_key("recommendation"));
        assert_eq!(json["affectedComponents"], serde_json::json!([]));
    }

    #[test]
    fn counts_accumulate() {
        let mut counts = SeverityCounts::default();
        counts.record(Severity::High);
        counts.record(Severity::High);
        counts.record(Severity::Low);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.total(), 3);
    }
}
