//! Centralized format detection.
//!
//! Detection is purely informative and never fails: any text that cannot be
//! classified degrades to an unknown result. Classification follows strict
//! priority: structural parse, explicit CycloneDX markers (`bomFormat` +
//! `specVersion`), the SPDX marker (`spdxVersion` starting with `SPDX-`),
//! then unknown. The filename suffix is a weak signal only — it is surfaced
//! in warnings but never strong enough to select a parser by itself.

use crate::model::SbomFormat;
use crate::parsers::traits::{FormatConfidence, SbomParser};
use crate::parsers::{CycloneDxParser, SpdxParser};
use serde::Deserialize;

/// Minimum confidence for detection to commit to a parser.
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Top-level fields probed during detection.
///
/// Field values are kept as raw JSON so a document with an oddly-typed
/// marker still probes cleanly; the probe itself only fails when the text is
/// not a JSON object.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProbe {
    bom_format: Option<serde_json::Value>,
    spec_version: Option<serde_json::Value>,
    spdx_version: Option<serde_json::Value>,
}

impl DocumentProbe {
    pub fn bom_format(&self) -> Option<&str> {
        self.bom_format.as_ref().and_then(|v| v.as_str())
    }

    pub fn spec_version(&self) -> Option<&str> {
        self.spec_version.as_ref().and_then(|v| v.as_str())
    }

    pub fn spdx_version(&self) -> Option<&str> {
        self.spdx_version.as_ref().and_then(|v| v.as_str())
    }
}

/// Structural classification of raw input text.
pub(crate) enum Structure {
    /// A JSON object; top-level markers probed.
    Object(DocumentProbe),
    /// Valid JSON, but not an object.
    OtherJson,
    /// Looks like an XML document.
    Xml,
    /// Not parseable as JSON at all.
    Invalid(String),
}

/// Classify the text structurally without building a full document tree.
///
/// Runs with serde_json's recursion cap lifted (stack grown on demand) so
/// deeply nested but valid documents are not misclassified as invalid.
pub(crate) fn probe_structure(content: &str) -> Structure {
    if content.trim_start().starts_with('<') {
        return Structure::Xml;
    }

    let mut de = serde_json::Deserializer::from_str(content);
    de.disable_recursion_limit();
    let probed = DocumentProbe::deserialize(serde_stacker::Deserializer::new(&mut de));
    let probed = match probed {
        Ok(probe) => de.end().map(|()| probe),
        Err(err) => Err(err),
    };

    match probed {
        Ok(probe) => Structure::Object(probe),
        Err(object_err) => {
            // Valid JSON that is not an object still probes clean as "other".
            let mut de = serde_json::Deserializer::from_str(content);
            de.disable_recursion_limit();
            let ignored =
                serde::de::IgnoredAny::deserialize(serde_stacker::Deserializer::new(&mut de));
            let valid = match ignored {
                Ok(_) => de.end(),
                Err(err) => Err(err),
            };
            match valid {
                Ok(()) => Structure::OtherJson,
                Err(_) => Structure::Invalid(object_err.to_string()),
            }
        }
    }
}

/// Result of format detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The detected format, if any signal matched (may be below the parse
    /// threshold — check [`DetectionResult::can_parse`]).
    pub format: Option<SbomFormat>,
    pub confidence: FormatConfidence,
    /// Detected format version, verbatim from the document.
    pub version: Option<String>,
    pub warnings: Vec<String>,
    /// Structural-parse failure message, when the text was not valid JSON.
    pub(crate) invalid_json: Option<String>,
}

impl DetectionResult {
    fn unknown(reason: &str) -> Self {
        Self {
            format: None,
            confidence: FormatConfidence::NONE,
            version: None,
            warnings: vec![reason.to_string()],
            invalid_json: None,
        }
    }

    /// Whether detection is confident enough to commit to a parser.
    pub fn can_parse(&self) -> bool {
        self.format.is_some() && self.confidence.value() >= MIN_CONFIDENCE_THRESHOLD
    }

    /// The classification label: `cyclonedx`, `spdx`, or `unknown`.
    pub fn format_label(&self) -> &'static str {
        if !self.can_parse() {
            return "unknown";
        }
        match self.format {
            Some(SbomFormat::Cyclonedx) => "cyclonedx",
            Some(SbomFormat::Spdx) => "spdx",
            None => "unknown",
        }
    }
}

/// Format detector shared by the pipeline and the validator.
pub struct FormatDetector {
    cyclonedx: CycloneDxParser,
    spdx: SpdxParser,
    min_confidence: f32,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatDetector {
    pub fn new() -> Self {
        Self {
            cyclonedx: CycloneDxParser::new(),
            spdx: SpdxParser::new(),
            min_confidence: MIN_CONFIDENCE_THRESHOLD,
        }
    }

    /// Detect the format of `content`. Never fails.
    pub fn detect(&self, content: &str, filename: &str) -> DetectionResult {
        match probe_structure(content) {
            Structure::Xml => {
                if content.contains("cyclonedx.org/schema/bom") {
                    DetectionResult {
                        format: Some(SbomFormat::Cyclonedx),
                        confidence: FormatConfidence::CERTAIN,
                        version: super::cyclonedx::extract_namespace_version(content),
                        warnings: Vec::new(),
                        invalid_json: None,
                    }
                } else {
                    DetectionResult::unknown("XML document lacks a recognized SBOM namespace")
                }
            }
            Structure::Invalid(err) => {
                let mut result =
                    DetectionResult::unknown("text is not structurally parseable as a document");
                result.invalid_json = Some(err);
                result
            }
            Structure::OtherJson => {
                DetectionResult::unknown("top-level JSON value is not an object")
            }
            Structure::Object(probe) => self.select_parser(&probe, filename),
        }
    }

    fn select_parser(&self, probe: &DocumentProbe, filename: &str) -> DetectionResult {
        let cdx = self.cyclonedx.detect_probe(probe);
        let spdx = self.spdx.detect_probe(probe);

        tracing::debug!(
            cyclonedx = cdx.confidence.value(),
            spdx = spdx.confidence.value(),
            "format detection"
        );

        if cdx.confidence.value() >= self.min_confidence
            && cdx.confidence.value() > spdx.confidence.value()
        {
            return DetectionResult {
                format: Some(SbomFormat::Cyclonedx),
                confidence: cdx.confidence,
                version: cdx.version,
                warnings: cdx.warnings,
                invalid_json: None,
            };
        }
        if spdx.confidence.value() >= self.min_confidence {
            return DetectionResult {
                format: Some(SbomFormat::Spdx),
                confidence: spdx.confidence,
                version: spdx.version,
                warnings: spdx.warnings,
                invalid_json: None,
            };
        }

        // Weak filename hint: recorded, but never strong enough to parse.
        let lower = filename.to_lowercase();
        if lower.ends_with(".spdx.json") {
            return DetectionResult {
                format: Some(SbomFormat::Spdx),
                confidence: FormatConfidence::LOW,
                version: None,
                warnings: vec![
                    "filename suggests SPDX but content lacks an spdxVersion marker".to_string(),
                ],
                invalid_json: None,
            };
        }
        if lower.ends_with(".cdx.json") {
            return DetectionResult {
                format: Some(SbomFormat::Cyclonedx),
                confidence: FormatConfidence::LOW,
                version: None,
                warnings: vec![
                    "filename suggests CycloneDX but content lacks a bomFormat marker".to_string(),
                ],
                invalid_json: None,
            };
        }

        DetectionResult::unknown("no CycloneDX or SPDX markers found")
    }
}
