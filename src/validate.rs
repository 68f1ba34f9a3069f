//! Non-fatal structural and spec-conformance validation.
//!
//! Validation never throws: parse failures, missing required fields, and
//! conformance violations all land in the report as violations. Callers
//! decide whether to keep using a failing document's parse output.

use crate::model::SbomFormat;
use crate::parsers::{self, ParseError};
use serde::Serialize;

/// A single conformance violation, naming the offending field.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Detailed validation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// Classification label: `cyclonedx`, `spdx`, or `unknown`.
    pub format: String,
    pub violations: Vec<Violation>,
}

/// Validate SBOM text. Returns `false` if any check fails; never errors.
pub fn validate(content: &str, filename: &str) -> bool {
    validate_report(content, filename).valid
}

/// Validate SBOM text with a detailed violation list.
///
/// Checks, per detected format:
/// - required top-level fields are present (via a full parse);
/// - for SPDX, `dataLicense` equals exactly `"CC0-1.0"`;
/// - `metadata.componentCount` equals the component array length.
pub fn validate_report(content: &str, filename: &str) -> ValidationReport {
    let detection = parsers::detect_format(content, filename);
    let format = detection.format_label().to_string();
    let mut violations = Vec::new();

    if !detection.can_parse() {
        violations.push(Violation::new(
            "format",
            "document is not recognizable as CycloneDX or SPDX",
        ));
        return ValidationReport {
            valid: false,
            format,
            violations,
        };
    }

    match parsers::parse_sbom_str(content, filename) {
        Err(error) => {
            violations.push(violation_for_parse_error(&error));
        }
        Ok(result) => {
            if result.metadata.component_count != result.components.len() {
                violations.push(Violation::new(
                    "componentCount",
                    format!(
                        "metadata.componentCount is {} but {} components are present",
                        result.metadata.component_count,
                        result.components.len()
                    ),
                ));
            }
            if result.metadata.format == SbomFormat::Spdx {
                match result.metadata.data_license.as_deref() {
                    Some("CC0-1.0") => {}
                    Some(other) => violations.push(Violation::new(
                        "dataLicense",
                        format!("dataLicense must be 'CC0-1.0', found '{other}'"),
                    )),
                    None => violations.push(Violation::new(
                        "dataLicense",
                        "dataLicense is missing".to_string(),
                    )),
                }
            }
        }
    }

    ValidationReport {
        valid: violations.is_empty(),
        format,
        violations,
    }
}

fn violation_for_parse_error(error: &ParseError) -> Violation {
    match error {
        ParseError::MissingField(field) => Violation::new(field.clone(), error.to_string()),
        ParseError::UnsupportedVersion(_) => Violation::new("spdxVersion", error.to_string()),
        _ => Violation::new("document", error.to_string()),
    }
}
