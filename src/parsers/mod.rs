//! SBOM format parsers and the parse pipeline.
//!
//! The pipeline is strictly sequential and forward-only:
//! Detect → Parse (format-specific) → Normalize → Resolve. A failure during
//! Parse aborts the whole pipeline — no partial result is ever returned.
//! Each invocation is a pure function over its input text with no shared
//! state, so the host may parse many documents concurrently with no
//! coordination; callers batching very large workloads should place any
//! cancellation check between `parse_sbom_str` calls.
//!
//! ## Usage
//!
//! ```
//! use sbom_ingest::parsers::{parse_sbom_str, detect_format};
//!
//! let content = r#"{"bomFormat": "CycloneDX", "specVersion": "1.5", "components": []}"#;
//! let detection = detect_format(content, "sbom.json");
//! assert_eq!(detection.format_label(), "cyclonedx");
//!
//! let result = parse_sbom_str(content, "sbom.json").unwrap();
//! assert_eq!(result.metadata.component_count, 0);
//! ```

pub(crate) mod cyclonedx;
mod detection;
mod spdx;
mod traits;

pub use cyclonedx::CycloneDxParser;
pub use detection::{DetectionResult, DocumentProbe, FormatDetector, MIN_CONFIDENCE_THRESHOLD};
pub use spdx::SpdxParser;
pub use traits::{
    ErrorKind, FormatConfidence, FormatDetection, ParseError, RawParse, SbomParser,
};

use crate::error::SbomError;
use crate::model::{ParseResult, SbomFormat};
use std::path::Path;

/// Detect the SBOM format of `content` without parsing.
///
/// Purely informative and never fails; unclassifiable text yields an
/// unknown-format result.
pub fn detect_format(content: &str, filename: &str) -> DetectionResult {
    FormatDetector::new().detect(content, filename)
}

/// Parse SBOM text into the canonical [`ParseResult`].
///
/// The filename is only a weak classification signal; parse semantics are
/// entirely content-driven.
pub fn parse_sbom_str(content: &str, filename: &str) -> Result<ParseResult, ParseError> {
    let detection = detect_format(content, filename);
    for warning in &detection.warnings {
        tracing::warn!("{warning}");
    }

    let (format, raw) = match detection.format {
        Some(SbomFormat::Cyclonedx) if detection.can_parse() => (
            SbomFormat::Cyclonedx,
            CycloneDxParser::new().parse_str(content, filename)?,
        ),
        Some(SbomFormat::Spdx) if detection.can_parse() => (
            SbomFormat::Spdx,
            SpdxParser::new().parse_str(content, filename)?,
        ),
        _ => {
            return Err(match detection.invalid_json {
                Some(err) => ParseError::InvalidJson(err),
                None => ParseError::UnsupportedFormat(
                    "could not detect SBOM format; expected CycloneDX or SPDX markers".to_string(),
                ),
            })
        }
    };

    let (mut result, refs) = crate::normalize::normalize(format, raw);
    result.unresolved_refs =
        crate::resolve::resolve_references(&mut result.vulnerabilities, &refs, &mut result.warnings);
    crate::normalize::seal(&mut result);
    Ok(result)
}

/// Maximum SBOM file size (512 MB); larger files are rejected to prevent OOM.
const MAX_SBOM_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Read and parse an SBOM file.
pub fn parse_sbom(path: &Path) -> Result<ParseResult, SbomError> {
    let metadata =
        std::fs::metadata(path).map_err(|e| SbomError::io(path, e))?;
    if metadata.len() > MAX_SBOM_FILE_SIZE {
        return Err(SbomError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: MAX_SBOM_FILE_SIZE,
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| SbomError::io(path, e))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_sbom_str(&content, &filename).map_err(|source| SbomError::Parse {
        path: path.display().to_string(),
        source,
    })
}
