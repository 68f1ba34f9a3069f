//! SPDX SBOM parser.
//!
//! Supports SPDX 2.2 and 2.3 JSON documents. One component per `packages[]`
//! entry; SPDX carries no vulnerability section, so the vulnerability list is
//! always empty. `dataLicense` is recorded in metadata for the validator but
//! never fails the parse on its own.

use crate::model::{Component, ComponentId, LicenseDecl, SbomFormat};
use crate::parsers::detection::DocumentProbe;
use crate::parsers::traits::{
    FormatConfidence, FormatDetection, ParseError, RawParse, SbomParser,
};
use serde::Deserialize;

/// Parser for the SPDX format.
pub struct SpdxParser;

impl SpdxParser {
    pub fn new() -> Self {
        Self
    }

    fn convert(&self, doc: SpdxDocument) -> Result<RawParse, ParseError> {
        let spdx_version = doc
            .spdx_version
            .ok_or_else(|| ParseError::MissingField("spdxVersion".to_string()))?;
        if !spdx_version.starts_with("SPDX-") {
            return Err(ParseError::UnsupportedVersion(spdx_version));
        }
        let data_license = doc
            .data_license
            .ok_or_else(|| ParseError::MissingField("dataLicense".to_string()))?;

        let mut raw = RawParse {
            format_version: spdx_version,
            data_license: Some(data_license),
            ..RawParse::default()
        };

        for package in doc.packages.unwrap_or_default() {
            if let Some(component) = self.convert_package(package, &mut raw) {
                raw.components.push(component);
            }
        }

        self.apply_relationships(doc.relationships.unwrap_or_default(), &mut raw);

        Ok(raw)
    }

    /// Convert one package entry; malformed entries are skipped with a
    /// recorded warning.
    fn convert_package(&self, package: SpdxPackage, raw: &mut RawParse) -> Option<Component> {
        let Some(name) = package.name.filter(|n| !n.trim().is_empty()) else {
            let message = format!(
                "skipping package entry without a name (SPDXID: {})",
                package.spdx_id.as_deref().unwrap_or("<none>")
            );
            tracing::warn!("{message}");
            raw.warnings.push(message);
            return None;
        };

        let id = package
            .spdx_id
            .as_deref()
            .and_then(ComponentId::from_native)
            .or_else(|| {
                let synthetic = ComponentId::synthetic(&name, package.version_info.as_deref());
                if synthetic.is_some() {
                    let message =
                        format!("package '{name}' has no SPDXID; using synthetic id");
                    tracing::warn!("{message}");
                    raw.warnings.push(message);
                }
                synthetic
            })?;

        if let Some(spdx_id) = &package.spdx_id {
            raw.refs.insert(spdx_id.clone(), id.clone());
        }

        // SPDX packages carry no type taxonomy; everything is a library.
        let mut component = Component::new(id, name);
        component.version = package.version_info.filter(|v| !v.is_empty());
        component.description = package.description;

        for expr in [package.license_concluded, package.license_declared]
            .into_iter()
            .flatten()
        {
            component
                .licenses
                .extend(LicenseDecl::Expression(expr).tokens());
        }

        for ext_ref in package.external_refs.unwrap_or_default() {
            match ext_ref.reference_type.as_deref() {
                Some("purl") => {
                    if component.purl.is_none() {
                        if let Some(locator) = ext_ref.reference_locator {
                            raw.refs
                                .insert(locator.clone(), component.id.clone());
                            component.purl = Some(locator);
                        }
                    }
                }
                Some("cpe23Type") | Some("cpe22Type") => {
                    if component.cpe.is_none() {
                        component.cpe = ext_ref.reference_locator;
                    }
                }
                _ => {}
            }
        }

        let checksums: Vec<crate::model::HashEntry> = package
            .checksums
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| {
                Some(crate::model::HashEntry {
                    algorithm: c.algorithm?,
                    digest: c.checksum_value?,
                })
            })
            .collect();
        if !checksums.is_empty() {
            component.hash = Some(checksums);
        }

        Some(component)
    }

    /// Merge `DEPENDS_ON` relationships into component dependency edges.
    ///
    /// A relationship endpoint that matches no package is dropped with a
    /// recorded warning, honoring the dangling-edge invariant.
    fn apply_relationships(&self, relationships: Vec<SpdxRelationship>, raw: &mut RawParse) {
        for rel in relationships {
            if rel.relationship_type.as_deref() != Some("DEPENDS_ON") {
                continue;
            }
            let (Some(from), Some(to)) = (rel.spdx_element_id, rel.related_spdx_element) else {
                continue;
            };
            let Some(from_id) = raw.refs.resolve(&from).cloned() else {
                // The document root commonly DESCRIBES/DEPENDS_ON from the
                // document SPDXID, which is not a package.
                continue;
            };
            match raw.refs.resolve(&to).cloned() {
                Some(to_id) => {
                    if let Some(owner) = raw.components.iter_mut().find(|c| c.id == from_id) {
                        if !owner.dependencies.contains(&to_id) {
                            owner.dependencies.push(to_id);
                        }
                    }
                }
                None => {
                    let message =
                        format!("dropping dangling relationship edge {from} -> {to}");
                    tracing::warn!("{message}");
                    raw.warnings.push(message);
                }
            }
        }
    }
}

impl Default for SpdxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomParser for SpdxParser {
    fn parse_str(&self, content: &str, _filename: &str) -> Result<RawParse, ParseError> {
        let mut de = serde_json::Deserializer::from_str(content);
        de.disable_recursion_limit();
        let doc = SpdxDocument::deserialize(serde_stacker::Deserializer::new(&mut de))
            .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        de.end().map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        self.convert(doc)
    }

    fn detect_probe(&self, probe: &DocumentProbe) -> FormatDetection {
        match probe.spdx_version() {
            Some(version) if version.starts_with("SPDX-") => {
                FormatDetection::with_confidence(FormatConfidence::CERTAIN).version(version)
            }
            Some(version) => FormatDetection::with_confidence(FormatConfidence::MEDIUM)
                .version(version)
                .warning("spdxVersion present but does not start with 'SPDX-'"),
            None => FormatDetection::no_match(),
        }
    }

    fn format(&self) -> SbomFormat {
        SbomFormat::Spdx
    }

    fn format_name(&self) -> &'static str {
        "SPDX"
    }

    fn supported_versions(&self) -> &'static [&'static str] {
        &["SPDX-2.2", "SPDX-2.3"]
    }
}

// ============================================================================
// SPDX JSON document shapes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_version: Option<String>,
    data_license: Option<String>,
    packages: Option<Vec<SpdxPackage>>,
    relationships: Option<Vec<SpdxRelationship>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: Option<String>,
    name: Option<String>,
    version_info: Option<String>,
    license_concluded: Option<String>,
    license_declared: Option<String>,
    description: Option<String>,
    external_refs: Option<Vec<SpdxExternalRef>>,
    checksums: Option<Vec<SpdxChecksum>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    reference_type: Option<String>,
    reference_locator: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxChecksum {
    algorithm: Option<String>,
    checksum_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship {
    spdx_element_id: Option<String>,
    relationship_type: Option<String>,
    related_spdx_element: Option<String>,
}
