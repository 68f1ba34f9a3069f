//! Parser trait, error types, and detection confidence scoring.

use crate::model::{Component, SbomFormat, Vulnerability};
use crate::resolve::RefTable;
use std::fmt;
use thiserror::Error;

/// Fatal parse failures. No partial result is ever returned alongside one of
/// these — partial graphs are more dangerous than an explicit failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unsupported SBOM format: {0}")]
    UnsupportedFormat(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid XML: {0}")]
    InvalidXml(String),
}

/// Stable error classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidJson,
    UnsupportedFormat,
    MissingRequiredField,
    VersionUnsupported,
}

impl ParseError {
    /// Classify this error for callers that branch on error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidJson(_) | Self::InvalidXml(_) => ErrorKind::InvalidJson,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::MissingField(_) => ErrorKind::MissingRequiredField,
            Self::UnsupportedVersion(_) => ErrorKind::VersionUnsupported,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "invalid-json"),
            Self::UnsupportedFormat => write!(f, "unsupported-format"),
            Self::MissingRequiredField => write!(f, "missing-required-field"),
            Self::VersionUnsupported => write!(f, "version-unsupported"),
        }
    }
}

/// Confidence level for format detection.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// Definitely not this format.
    pub const NONE: Self = Self(0.0);
    /// Weak signal only (e.g. filename suffix) — not enough to parse.
    pub const LOW: Self = Self(0.25);
    /// Structural hints without explicit markers.
    pub const MEDIUM: Self = Self(0.5);
    /// Explicit format markers present.
    pub const CERTAIN: Self = Self(1.0);

    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }
}

impl Default for FormatConfidence {
    fn default() -> Self {
        Self::NONE
    }
}

/// Detection result from a single parser.
#[derive(Debug, Clone, Default)]
pub struct FormatDetection {
    pub confidence: FormatConfidence,
    pub version: Option<String>,
    pub warnings: Vec<String>,
}

impl FormatDetection {
    #[must_use]
    pub fn no_match() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_confidence(confidence: FormatConfidence) -> Self {
        Self {
            confidence,
            version: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Raw parser output, before normalization and reference resolution.
///
/// Components may contain duplicate ids and unsorted license tokens; the
/// normalizer canonicalizes both. The ref table maps every native key seen
/// during parsing to its canonical id for the resolver.
#[derive(Debug, Default)]
pub struct RawParse {
    pub format_version: String,
    pub data_license: Option<String>,
    pub components: Vec<Component>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub refs: RefTable,
    pub warnings: Vec<String>,
}

/// Trait for format-specific SBOM parsers.
pub trait SbomParser {
    /// Parse document text into the raw component/vulnerability set.
    ///
    /// The filename is a hint only; it never changes parse semantics.
    fn parse_str(&self, content: &str, filename: &str) -> Result<RawParse, ParseError>;

    /// Lightweight detection against the probed top-level fields of a
    /// structurally valid JSON document.
    fn detect_probe(&self, probe: &crate::parsers::detection::DocumentProbe) -> FormatDetection;

    fn format(&self) -> SbomFormat;

    fn format_name(&self) -> &'static str;

    fn supported_versions(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_display_kebab_case() {
        assert_eq!(
            ParseError::InvalidJson("x".into()).kind().to_string(),
            "invalid-json"
        );
        assert_eq!(
            ParseError::UnsupportedFormat("x".into()).kind().to_string(),
            "unsupported-format"
        );
        assert_eq!(
            ParseError::MissingField("bomFormat".into()).kind().to_string(),
            "missing-required-field"
        );
        assert_eq!(
            ParseError::UnsupportedVersion("1.0".into()).kind().to_string(),
            "version-unsupported"
        );
    }

    #[test]
    fn confidence_ordering() {
        assert!(FormatConfidence::CERTAIN.value() > FormatConfidence::MEDIUM.value());
        assert!(FormatConfidence::MEDIUM.value() > FormatConfidence::LOW.value());
        assert!(FormatConfidence::LOW.value() > FormatConfidence::NONE.value());
    }
}
