//! Integration tests for sbom-ingest
//!
//! These tests verify end-to-end behavior of the parse pipeline:
//! detection, format-specific parsing, normalization, reference resolution,
//! and validation.

use sbom_ingest::{
    detect_format, normalize::renormalize, parse_sbom, parse_sbom_str, validate, validate_report,
    ErrorKind, SbomFormat, Severity,
};
use std::path::Path;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture should exist")
}

// ============================================================================
// CycloneDX pipeline
// ============================================================================

mod cyclonedx_tests {
    use super::*;

    #[test]
    fn parse_reports_cyclonedx_format_and_consistent_count() {
        let result = parse_sbom_str(&fixture("cyclonedx/minimal.cdx.json"), "minimal.cdx.json")
            .expect("should parse");

        assert_eq!(result.metadata.format, SbomFormat::Cyclonedx);
        assert_eq!(result.metadata.format_version, "1.5");
        assert_eq!(result.metadata.component_count, result.components.len());
        // metadata.component root + express + lodash
        assert_eq!(result.components.len(), 3);
        assert!(result.components.iter().any(|c| c.name == "my-app"));
        assert!(result.components.iter().any(|c| c.name == "express"));
        assert!(result.components.iter().any(|c| c.name == "lodash"));
    }

    #[test]
    fn nested_tree_flattens_completely_with_parent_edges() {
        let result = parse_sbom_str(&fixture("cyclonedx/nested.cdx.json"), "nested.cdx.json")
            .expect("should parse");

        // Full flattened tree size.
        assert_eq!(result.components.len(), 3);
        assert_eq!(result.metadata.component_count, 3);

        // Every nested child's id appears in its parent's dependencies.
        let app = result
            .components
            .iter()
            .find(|c| c.name == "my-app")
            .expect("root should be present");
        let express = result.components.iter().find(|c| c.name == "express").unwrap();
        let lodash = result.components.iter().find(|c| c.name == "lodash").unwrap();
        assert!(app.dependencies.contains(&express.id));
        assert!(app.dependencies.contains(&lodash.id));
    }

    #[test]
    fn vulnerability_links_to_canonical_component_id() {
        let result = parse_sbom_str(
            &fixture("cyclonedx/with-vulnerabilities.cdx.json"),
            "with-vulnerabilities.cdx.json",
        )
        .expect("should parse");

        // Concrete scenario: two components, one vulnerability.
        assert_eq!(result.components.len(), 2);
        assert_eq!(result.vulnerabilities.len(), 1);

        let vuln = &result.vulnerabilities[0];
        assert_eq!(vuln.id, "CVE-2023-12345");
        assert_eq!(vuln.source, "NVD");
        assert_eq!(vuln.severity, Severity::High);
        assert_eq!(vuln.cvss_score, Some(7.5));

        // The affects ref resolved to express's canonical id — not the raw
        // ref string bypassing the id mapping.
        let express = result.components.iter().find(|c| c.name == "express").unwrap();
        assert_eq!(vuln.affected_components, vec![express.id.as_str().to_string()]);
        assert_eq!(result.unresolved_refs, 0);
    }

    #[test]
    fn resolution_yields_the_canonical_id_not_the_raw_ref() {
        // The bom-ref contains whitespace, so its canonical id differs from
        // the raw ref string; resolution must produce the mapped id.
        let content = r#"{
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "components": [
                {"type": "library", "bom-ref": "acme widget 1.0", "name": "widget"}
            ],
            "vulnerabilities": [
                {"id": "CVE-2024-2", "affects": [{"ref": "acme widget 1.0"}]}
            ]
        }"#;
        let result = parse_sbom_str(content, "bom.json").expect("should parse");
        assert_eq!(result.components[0].id.as_str(), "acme-widget-1.0");
        assert_eq!(
            result.vulnerabilities[0].affected_components,
            vec!["acme-widget-1.0"]
        );
        assert_eq!(result.unresolved_refs, 0);
    }

    #[test]
    fn unresolved_vulnerability_ref_is_retained_raw() {
        let content = r#"{
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "components": [
                {"type": "library", "bom-ref": "present", "name": "present"}
            ],
            "vulnerabilities": [
                {"id": "CVE-2024-1", "affects": [{"ref": "absent-component"}]}
            ]
        }"#;
        let result = parse_sbom_str(content, "bom.json").expect("should parse");
        assert_eq!(
            result.vulnerabilities[0].affected_components,
            vec!["absent-component"]
        );
        assert_eq!(result.unresolved_refs, 1);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn invalid_json_fails_with_invalid_json_kind() {
        let err = parse_sbom_str("{ this is not valid json }", "invalid.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJson);
    }

    #[test]
    fn unknown_document_fails_with_unsupported_format_kind() {
        let err = parse_sbom_str(r#"{"totally": "unrelated"}"#, "data.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn missing_required_fields_fail_with_missing_field_kind() {
        let err = parse_sbom_str(r#"{"bomFormat": "CycloneDX"}"#, "bom.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    }
}

// ============================================================================
// SPDX pipeline
// ============================================================================

mod spdx_tests {
    use super::*;

    #[test]
    fn parse_reports_spdx_format_and_no_vulnerabilities() {
        let result = parse_sbom_str(&fixture("spdx/minimal.spdx.json"), "minimal.spdx.json")
            .expect("should parse");

        assert_eq!(result.metadata.format, SbomFormat::Spdx);
        assert!(result.vulnerabilities.is_empty());
        assert_eq!(result.components.len(), 2);
        assert_eq!(result.metadata.component_count, 2);
        assert_eq!(result.metadata.data_license.as_deref(), Some("CC0-1.0"));

        let express = result.components.iter().find(|c| c.name == "express").unwrap();
        assert_eq!(express.id.as_str(), "SPDXRef-Package-1");
        assert_eq!(express.purl.as_deref(), Some("pkg:npm/express@4.18.0"));
        assert_eq!(express.version.as_deref(), Some("4.18.0"));
    }

    #[test]
    fn five_packages_without_external_refs_have_no_purl_or_cpe() {
        let packages: Vec<String> = (0..5)
            .map(|i| {
                format!(
                    r#"{{"SPDXID": "SPDXRef-Package-{i}", "name": "package-{i}",
                        "versionInfo": "{}.0.0", "downloadLocation": "https://example.com",
                        "filesAnalyzed": false, "licenseConcluded": "MIT"}}"#,
                    i + 1
                )
            })
            .collect();
        let content = format!(
            r#"{{"spdxVersion": "SPDX-2.3", "dataLicense": "CC0-1.0",
                "SPDXID": "SPDXRef-DOCUMENT", "name": "multi-package-project",
                "packages": [{}]}}"#,
            packages.join(",")
        );

        let result = parse_sbom_str(&content, "bom-5-packages.spdx.json").expect("should parse");
        assert_eq!(result.components.len(), 5);
        for component in &result.components {
            assert!(component.purl.is_none());
            assert!(component.cpe.is_none());
        }

        // Serialized form must omit absent optionals entirely, not emit null.
        let json = serde_json::to_value(&result).unwrap();
        for component in json["components"].as_array().unwrap() {
            let obj = component.as_object().unwrap();
            assert!(!obj.contains_key("purl"));
            assert!(!obj.contains_key("cpe"));
        }
    }

    #[test]
    fn spdx_components_default_to_library_type() {
        let result = parse_sbom_str(&fixture("spdx/minimal.spdx.json"), "minimal.spdx.json")
            .expect("should parse");
        let json = serde_json::to_value(&result).unwrap();
        for component in json["components"].as_array().unwrap() {
            assert_eq!(component["type"], "library");
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

mod detection_tests {
    use super::*;

    #[test]
    fn detection_never_throws_and_degrades_to_unknown() {
        for content in [
            "",
            "garbage",
            "{ broken json",
            "[1, 2, 3]",
            "<not-an-sbom/>",
            "\u{0}\u{1}\u{2}",
        ] {
            let detection = detect_format(content, "whatever.json");
            assert_eq!(detection.format_label(), "unknown");
        }
    }

    #[test]
    fn detection_reports_versions() {
        let cdx = detect_format(&fixture("cyclonedx/minimal.cdx.json"), "minimal.cdx.json");
        assert_eq!(cdx.format_label(), "cyclonedx");
        assert_eq!(cdx.version.as_deref(), Some("1.5"));

        let spdx = detect_format(&fixture("spdx/minimal.spdx.json"), "minimal.spdx.json");
        assert_eq!(spdx.format_label(), "spdx");
        assert_eq!(spdx.version.as_deref(), Some("SPDX-2.3"));
    }
}

// ============================================================================
// Normalization
// ============================================================================

mod normalization_tests {
    use super::*;

    #[test]
    fn renormalizing_a_normalized_result_is_identity() {
        let result = parse_sbom_str(&fixture("cyclonedx/minimal.cdx.json"), "minimal.cdx.json")
            .expect("should parse");

        let once = renormalize(result.clone());
        let twice = renormalize(once.clone());

        assert_eq!(once.components, twice.components);
        assert_eq!(once.metadata, twice.metadata);
        assert_eq!(once.content_hash, twice.content_hash);
        // And matches the pipeline's own output.
        assert_eq!(result.components, once.components);
    }

    #[test]
    fn licenses_are_sorted_in_output() {
        let content = r#"{
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "components": [
                {"type": "library", "bom-ref": "x", "name": "x",
                 "licenses": [{"expression": "MIT OR Apache-2.0 OR BSD-3-Clause"}]}
            ]
        }"#;
        let result = parse_sbom_str(content, "bom.json").expect("should parse");
        assert_eq!(
            result.components[0].licenses,
            vec!["Apache-2.0", "BSD-3-Clause", "MIT"]
        );
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn valid_documents_validate_true() {
        assert!(validate(
            &fixture("cyclonedx/minimal.cdx.json"),
            "minimal.cdx.json"
        ));
        assert!(validate(&fixture("spdx/minimal.spdx.json"), "minimal.spdx.json"));
    }

    #[test]
    fn wrong_data_license_fails_validation_naming_data_license() {
        let content = fixture("spdx/wrong-datalicense.spdx.json");
        assert!(!validate(&content, "wrong-datalicense.spdx.json"));

        let report = validate_report(&content, "wrong-datalicense.spdx.json");
        assert!(report.violations.iter().any(|v| v.field == "dataLicense"));

        // The same document still parses: validation is advisory only.
        let result =
            parse_sbom_str(&content, "wrong-datalicense.spdx.json").expect("should parse");
        assert_eq!(result.metadata.data_license.as_deref(), Some("Apache-2.0"));
    }

    #[test]
    fn validation_never_panics_on_garbage() {
        assert!(!validate("", "empty.json"));
        assert!(!validate("{}", "object.json"));
        assert!(!validate("%%%", "noise.json"));
    }
}

// ============================================================================
// File-level API
// ============================================================================

mod file_tests {
    use super::*;

    #[test]
    fn parse_sbom_reads_fixture_files() {
        let result =
            parse_sbom(&fixture_path("cyclonedx/minimal.cdx.json")).expect("should parse");
        assert_eq!(result.metadata.format, SbomFormat::Cyclonedx);
    }

    #[test]
    fn parse_sbom_reports_missing_files_as_io_errors() {
        let err = parse_sbom(Path::new("/nonexistent/sbom.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sbom.json"));
    }

    #[test]
    fn parse_sbom_works_from_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("generated.cdx.json");
        std::fs::write(
            &path,
            r#"{"bomFormat": "CycloneDX", "specVersion": "1.6", "components": []}"#,
        )
        .expect("write");

        let result = parse_sbom(&path).expect("should parse");
        assert_eq!(result.metadata.format_version, "1.6");
        assert_eq!(result.metadata.component_count, 0);
    }
}
