//! **SBOM ingestion and normalization engine.**
//!
//! `sbom-ingest` parses machine-generated software bill-of-materials
//! documents in two mutually incompatible schemas — **CycloneDX** and
//! **SPDX** — and produces one canonical graph of software components and
//! known vulnerabilities. Downstream features (analytics, audit logging,
//! export) consume only this canonical model and never the source formats.
//!
//! The engine reconciles divergent field names, nested/recursive component
//! trees, inconsistent license encodings, and cross-document identifier
//! schemes (`bom-ref`, `SPDXID`, package URLs, CPEs) into one stable data
//! model, while tolerating malformed or partial real-world input: a single
//! non-conforming entry is skipped with a recorded warning instead of
//! aborting the document.
//!
//! ## Pipeline
//!
//! Processing is strictly sequential and forward-only:
//!
//! ```text
//! Detect → Parse (format-specific) → Normalize → Resolve → (optional) Validate
//! ```
//!
//! - **Detect** ([`parsers::detect_format`]) classifies text as CycloneDX,
//!   SPDX, or unknown. It never fails.
//! - **Parse** ([`parsers::parse_sbom_str`]) converts the document into the
//!   raw component/vulnerability set. A structural failure here is fatal —
//!   no partial result is ever returned.
//! - **Normalize** ([`normalize`]) deduplicates components, orders license
//!   tokens, and computes aggregate metadata.
//! - **Resolve** ([`resolve`]) links vulnerability references to canonical
//!   component ids, best-effort.
//! - **Validate** ([`validate`]) runs advisory conformance checks and never
//!   throws.
//!
//! ## Getting started
//!
//! ```
//! use sbom_ingest::parse_sbom_str;
//!
//! let content = r#"{
//!     "bomFormat": "CycloneDX",
//!     "specVersion": "1.5",
//!     "components": [
//!         {"type": "library", "bom-ref": "pkg:npm/express@4.18.0",
//!          "name": "express", "version": "4.18.0"}
//!     ]
//! }"#;
//!
//! let result = parse_sbom_str(content, "sbom.json").unwrap();
//! assert_eq!(result.metadata.component_count, 1);
//! assert_eq!(result.components[0].name, "express");
//! ```
//!
//! Each invocation is a pure function over its input text — no I/O, no
//! shared mutable state — so documents may be parsed concurrently by the
//! host with no coordination. For very large batches, place caller-level
//! cancellation checks between parse calls.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]

pub mod cli;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parsers;
pub mod resolve;
pub mod utils;
pub mod validate;

// Re-export main types for convenience
pub use error::{Result, SbomError};
pub use model::{
    Component, ComponentId, ComponentType, HashEntry, ParseResult, ResultMetadata, SbomFormat,
    Severity, SeverityCounts, Vulnerability, VulnerabilityReference,
};
pub use parsers::{
    detect_format, parse_sbom, parse_sbom_str, DetectionResult, ErrorKind, ParseError, SbomParser,
};
pub use validate::{validate, validate_report, ValidationReport, Violation};
