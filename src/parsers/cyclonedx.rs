//! CycloneDX SBOM parser.
//!
//! Supports CycloneDX 1.4, 1.5, and 1.6 in JSON and XML. The component tree
//! is recursive — an entry may carry a nested `components` collection — and
//! is flattened with an explicit work-list so arbitrarily deep documents
//! cannot exhaust the stack. Parent→child edges are recorded in the parent's
//! `dependencies`.

use crate::model::{
    Component, ComponentId, ComponentType, HashEntry, LicenseDecl, SbomFormat, Severity,
    Vulnerability, VulnerabilityReference,
};
use crate::parsers::detection::DocumentProbe;
use crate::parsers::traits::{
    FormatConfidence, FormatDetection, ParseError, RawParse, SbomParser,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

/// Parser for the CycloneDX format.
pub struct CycloneDxParser {
    /// Severity assigned when a rating token is unrecognized.
    fallback_severity: Severity,
}

impl CycloneDxParser {
    pub fn new() -> Self {
        Self {
            fallback_severity: Severity::None,
        }
    }

    /// Override the severity used for unrecognized rating tokens.
    pub fn with_fallback_severity(fallback_severity: Severity) -> Self {
        Self { fallback_severity }
    }

    fn parse_json(&self, content: &str) -> Result<RawParse, ParseError> {
        // Nested component trees can exceed serde_json's recursion cap, so
        // deserialization runs with the limit lifted and the stack grown on
        // demand; the flatten pass below dismantles the tree iteratively.
        let mut de = serde_json::Deserializer::from_str(content);
        de.disable_recursion_limit();
        let bom = CdxBom::deserialize(serde_stacker::Deserializer::new(&mut de))
            .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        de.end().map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        self.convert(bom)
    }

    fn parse_xml(&self, content: &str) -> Result<RawParse, ParseError> {
        if !content.contains("cyclonedx.org/schema/bom") {
            return Err(ParseError::UnsupportedFormat(
                "XML document lacks the CycloneDX namespace".to_string(),
            ));
        }
        let xml: CdxXmlBom =
            quick_xml::de::from_str(content).map_err(|e| ParseError::InvalidXml(e.to_string()))?;
        let spec_version = extract_namespace_version(content);
        self.convert(xml.into_bom(spec_version))
    }

    fn convert(&self, bom: CdxBom) -> Result<RawParse, ParseError> {
        match bom.bom_format.as_deref() {
            None => return Err(ParseError::MissingField("bomFormat".to_string())),
            Some("CycloneDX") => {}
            Some(other) => {
                return Err(ParseError::UnsupportedFormat(format!(
                    "bomFormat is '{other}', expected 'CycloneDX'"
                )))
            }
        }
        let format_version = bom
            .spec_version
            .ok_or_else(|| ParseError::MissingField("specVersion".to_string()))?;

        let mut raw = RawParse {
            format_version,
            ..RawParse::default()
        };

        // metadata.component is the document root: first in document order.
        let mut roots = Vec::new();
        if let Some(meta) = bom.metadata {
            if let Some(root) = meta.component {
                roots.push(*root);
            }
        }
        roots.extend(bom.components.unwrap_or_default());
        self.flatten_components(roots, &mut raw);

        self.apply_dependency_section(bom.dependencies.unwrap_or_default(), &mut raw);

        for entry in bom.vulnerabilities.unwrap_or_default() {
            self.convert_vulnerability(entry, &mut raw);
        }

        Ok(raw)
    }

    /// Flatten the recursive component tree in document (pre-order) order.
    ///
    /// Uses an explicit LIFO work-list instead of recursion so deeply nested
    /// real-world documents stay within bounded stack usage. Children of a
    /// skipped (malformed) entry are re-attached to the skipped entry's
    /// parent.
    fn flatten_components(&self, roots: Vec<CdxComponent>, raw: &mut RawParse) {
        let mut stack: Vec<(CdxComponent, Option<usize>)> = Vec::new();
        for root in roots.into_iter().rev() {
            stack.push((root, None));
        }

        while let Some((mut entry, parent)) = stack.pop() {
            let children = entry.components.take().unwrap_or_default();
            let converted = self.convert_component(entry, raw);
            let next_parent = match converted {
                Some(component) => {
                    let index = raw.components.len();
                    if let Some(parent_index) = parent {
                        let child_id = component.id.clone();
                        let deps = &mut raw.components[parent_index].dependencies;
                        if !deps.contains(&child_id) {
                            deps.push(child_id);
                        }
                    }
                    raw.components.push(component);
                    Some(index)
                }
                None => parent,
            };
            for child in children.into_iter().rev() {
                stack.push((child, next_parent));
            }
        }
    }

    /// Convert a single raw entry, registering its native keys.
    ///
    /// Returns `None` (with a recorded warning) for malformed entries so one
    /// bad component never aborts the whole document.
    fn convert_component(&self, entry: CdxComponent, raw: &mut RawParse) -> Option<Component> {
        let Some(name) = entry.name.filter(|n| !n.trim().is_empty()) else {
            let message = format!(
                "skipping component entry without a name (bom-ref: {})",
                entry.bom_ref.as_deref().unwrap_or("<none>")
            );
            tracing::warn!("{message}");
            raw.warnings.push(message);
            return None;
        };

        let id = entry
            .bom_ref
            .as_deref()
            .and_then(ComponentId::from_native)
            .or_else(|| entry.purl.as_deref().and_then(ComponentId::from_native))
            .or_else(|| {
                let synthetic = ComponentId::synthetic(&name, entry.version.as_deref());
                if synthetic.is_some() {
                    let message = format!(
                        "component '{name}' has no bom-ref or purl; using synthetic id"
                    );
                    tracing::warn!("{message}");
                    raw.warnings.push(message);
                }
                synthetic
            })?;

        if let Some(bom_ref) = &entry.bom_ref {
            raw.refs.insert(bom_ref.clone(), id.clone());
        }
        if let Some(purl) = &entry.purl {
            raw.refs.insert(purl.clone(), id.clone());
            if packageurl::PackageUrl::from_str(purl).is_err() {
                let message = format!("component '{name}' carries a malformed purl: {purl}");
                tracing::warn!("{message}");
                raw.warnings.push(message);
            }
        }

        let mut component = Component::new(id, name);
        component.component_type = entry
            .component_type
            .as_deref()
            .map(ComponentType::from_token)
            .unwrap_or_default();
        component.version = entry.version.filter(|v| !v.is_empty());
        component.purl = entry.purl;
        component.cpe = entry.cpe;
        component.description = entry.description;

        for choice in entry.licenses.unwrap_or_default() {
            let decl = if let Some(expression) = choice.expression {
                Some(LicenseDecl::Expression(expression))
            } else if let Some(license) = choice.license {
                license
                    .id
                    .or(license.name)
                    .map(LicenseDecl::Named)
            } else {
                None
            };
            if let Some(decl) = decl {
                component.licenses.extend(decl.tokens());
            }
        }

        let hashes: Vec<HashEntry> = entry
            .hashes
            .unwrap_or_default()
            .into_iter()
            .map(|h| HashEntry {
                algorithm: h.alg,
                digest: h.content,
            })
            .collect();
        if !hashes.is_empty() {
            component.hash = Some(hashes);
        }

        Some(component)
    }

    /// Merge the top-level `dependencies[]` section into component edges.
    ///
    /// A `ref` or `dependsOn` value that matches no component in the document
    /// is dropped with a recorded warning — dangling edges must never produce
    /// an out-of-range reference.
    fn apply_dependency_section(&self, section: Vec<CdxDependency>, raw: &mut RawParse) {
        for dep in section {
            let Some(owner_id) = raw.refs.resolve(&dep.ref_field).cloned() else {
                let message = format!(
                    "dependency entry references unknown component '{}'",
                    dep.ref_field
                );
                tracing::warn!("{message}");
                raw.warnings.push(message);
                continue;
            };
            let Some(owner_index) = raw.components.iter().position(|c| c.id == owner_id) else {
                continue;
            };
            for target in dep.depends_on.unwrap_or_default() {
                match raw.refs.resolve(&target).cloned() {
                    Some(target_id) => {
                        let deps = &mut raw.components[owner_index].dependencies;
                        if !deps.contains(&target_id) {
                            deps.push(target_id);
                        }
                    }
                    None => {
                        let message = format!(
                            "dropping dangling dependency edge {} -> {}",
                            dep.ref_field, target
                        );
                        tracing::warn!("{message}");
                        raw.warnings.push(message);
                    }
                }
            }
        }
    }

    /// Convert one vulnerability entry; malformed entries are skipped with a
    /// recorded warning.
    fn convert_vulnerability(&self, entry: CdxVulnerability, raw: &mut RawParse) {
        let Some(id) = entry.id.filter(|v| !v.trim().is_empty()) else {
            let message = "skipping vulnerability entry without an id".to_string();
            tracing::warn!("{message}");
            raw.warnings.push(message);
            return;
        };

        let source_name = entry
            .source
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let mut vuln = Vulnerability::new(id, source_name);
        vuln.description = entry.description.unwrap_or_default();
        vuln.recommendation = entry.recommendation;

        // Severity is chosen by rating-method priority:
        // CVSSv31 > CVSSv3 > CVSSv2 > source-provided severity string.
        // First entry wins among equal-priority ratings.
        let ratings = entry.ratings.unwrap_or_default();
        let chosen = ratings.iter().fold(None::<(&CdxRating, u8)>, |best, r| {
            let rank = rating_rank(r.method.as_deref());
            match best {
                Some((_, best_rank)) if rank <= best_rank => best,
                _ => Some((r, rank)),
            }
        });
        if let Some((rating, _)) = chosen {
            vuln.severity = rating
                .severity
                .as_deref()
                .map(|token| Severity::from_token(token, self.fallback_severity))
                .unwrap_or(self.fallback_severity);
            vuln.cvss_score = rating.score;
            vuln.cvss_vector = rating.vector.clone();
        }

        if let Some(source) = &entry.source {
            if let Some(url) = &source.url {
                vuln.references.push(VulnerabilityReference {
                    source: vuln.source.clone(),
                    url: url.clone(),
                    tags: Vec::new(),
                });
            }
        }
        for reference in entry.references.unwrap_or_default() {
            if let Some(source) = reference.source {
                if let Some(url) = source.url {
                    vuln.references.push(VulnerabilityReference {
                        source: source.name.unwrap_or_else(|| "unknown".to_string()),
                        url,
                        tags: Vec::new(),
                    });
                }
            }
        }
        for advisory in entry.advisories.unwrap_or_default() {
            if let Some(url) = advisory.url {
                vuln.references.push(VulnerabilityReference {
                    source: advisory.title.unwrap_or_else(|| "advisory".to_string()),
                    url,
                    tags: vec!["advisory".to_string()],
                });
            }
        }

        vuln.cwes = entry
            .cwes
            .unwrap_or_default()
            .into_iter()
            .map(|n| format!("CWE-{n}"))
            .collect();

        vuln.published_at = parse_timestamp(entry.published.as_deref(), &vuln.id, raw);
        vuln.modified_at = parse_timestamp(entry.updated.as_deref(), &vuln.id, raw);

        // Raw refs are carried through here; the resolver maps them to
        // canonical ids after normalization.
        vuln.affected_components = entry
            .affects
            .unwrap_or_default()
            .into_iter()
            .map(|a| a.ref_field)
            .collect();

        raw.vulnerabilities.push(vuln);
    }
}

impl Default for CycloneDxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomParser for CycloneDxParser {
    fn parse_str(&self, content: &str, _filename: &str) -> Result<RawParse, ParseError> {
        if content.trim_start().starts_with('<') {
            self.parse_xml(content)
        } else {
            self.parse_json(content)
        }
    }

    fn detect_probe(&self, probe: &DocumentProbe) -> FormatDetection {
        match (probe.bom_format(), probe.spec_version()) {
            (Some("CycloneDX"), Some(version)) => {
                FormatDetection::with_confidence(FormatConfidence::CERTAIN).version(version)
            }
            (Some("CycloneDX"), None) => {
                FormatDetection::with_confidence(FormatConfidence::MEDIUM)
                    .warning("bomFormat present but specVersion missing")
            }
            _ => FormatDetection::no_match(),
        }
    }

    fn format(&self) -> SbomFormat {
        SbomFormat::Cyclonedx
    }

    fn format_name(&self) -> &'static str {
        "CycloneDX"
    }

    fn supported_versions(&self) -> &'static [&'static str] {
        &["1.4", "1.5", "1.6"]
    }
}

/// Rating-method priority rank; higher wins.
fn rating_rank(method: Option<&str>) -> u8 {
    match method {
        Some("CVSSv31") => 3,
        Some("CVSSv3") => 2,
        Some("CVSSv2") => 1,
        _ => 0,
    }
}

fn parse_timestamp(value: Option<&str>, vuln_id: &str, raw: &mut RawParse) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            let message = format!("vulnerability {vuln_id}: ignoring unparsable timestamp '{value}'");
            tracing::warn!("{message}");
            raw.warnings.push(message);
            None
        }
    }
}

/// Recover the spec version from the `cyclonedx.org/schema/bom/<ver>`
/// namespace of an XML document.
pub(crate) fn extract_namespace_version(content: &str) -> Option<String> {
    let marker = "cyclonedx.org/schema/bom/";
    let start = content.find(marker)? + marker.len();
    let rest = &content[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let version = &rest[..end];
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

// ============================================================================
// CycloneDX JSON document shapes
//
// Per-entry required fields are Options here: a malformed entry must be
// skipped with a warning, not abort the whole document.
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxBom {
    bom_format: Option<String>,
    spec_version: Option<String>,
    metadata: Option<CdxMetadata>,
    components: Option<Vec<CdxComponent>>,
    dependencies: Option<Vec<CdxDependency>>,
    vulnerabilities: Option<Vec<CdxVulnerability>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxMetadata {
    component: Option<Box<CdxComponent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxComponent {
    #[serde(rename = "type")]
    component_type: Option<String>,
    #[serde(alias = "bom-ref")]
    bom_ref: Option<String>,
    name: Option<String>,
    version: Option<String>,
    purl: Option<String>,
    cpe: Option<String>,
    description: Option<String>,
    licenses: Option<Vec<CdxLicenseChoice>>,
    #[serde(alias = "hash")]
    hashes: Option<Vec<CdxHash>>,
    /// Nested sub-component tree.
    components: Option<Vec<CdxComponent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxLicenseChoice {
    license: Option<CdxLicense>,
    expression: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxLicense {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxHash {
    alg: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxDependency {
    #[serde(rename = "ref")]
    ref_field: String,
    depends_on: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxVulnerability {
    id: Option<String>,
    source: Option<CdxVulnSource>,
    description: Option<String>,
    recommendation: Option<String>,
    ratings: Option<Vec<CdxRating>>,
    cwes: Option<Vec<u32>>,
    affects: Option<Vec<CdxAffects>>,
    references: Option<Vec<CdxVulnReference>>,
    advisories: Option<Vec<CdxAdvisory>>,
    published: Option<String>,
    #[serde(alias = "modified")]
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxVulnSource {
    name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxRating {
    score: Option<f32>,
    severity: Option<String>,
    method: Option<String>,
    vector: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxAffects {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxVulnReference {
    source: Option<CdxVulnSource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxAdvisory {
    title: Option<String>,
    url: Option<String>,
}

// ============================================================================
// CycloneDX XML document shapes
//
// XML wraps collections in container elements and moves scalar fields to
// attributes; everything converts into the JSON shapes above so both
// variants share one conversion path.
// ============================================================================

#[derive(Debug, Deserialize)]
struct CdxXmlBom {
    metadata: Option<CdxXmlMetadata>,
    components: Option<CdxXmlComponents>,
    dependencies: Option<CdxXmlDependencies>,
    vulnerabilities: Option<CdxXmlVulnerabilities>,
}

impl CdxXmlBom {
    fn into_bom(self, spec_version: Option<String>) -> CdxBom {
        CdxBom {
            bom_format: Some("CycloneDX".to_string()),
            spec_version: Some(spec_version.unwrap_or_else(|| "1.4".to_string())),
            metadata: self.metadata.map(|m| CdxMetadata {
                component: m.component.map(|c| Box::new(c.into_component())),
            }),
            components: self
                .components
                .map(|c| c.component.into_iter().map(CdxXmlComponent::into_component).collect()),
            dependencies: self.dependencies.map(|d| {
                d.dependency
                    .into_iter()
                    .map(|dep| CdxDependency {
                        ref_field: dep.ref_field,
                        depends_on: Some(
                            dep.dependency.into_iter().map(|c| c.ref_field).collect(),
                        ),
                    })
                    .collect()
            }),
            vulnerabilities: self.vulnerabilities.map(|v| {
                v.vulnerability
                    .into_iter()
                    .map(CdxXmlVulnerability::into_vulnerability)
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CdxXmlMetadata {
    component: Option<CdxXmlComponent>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlComponents {
    #[serde(rename = "component", default)]
    component: Vec<CdxXmlComponent>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlComponent {
    #[serde(rename = "@type")]
    component_type: Option<String>,
    #[serde(rename = "@bom-ref")]
    bom_ref: Option<String>,
    name: Option<String>,
    version: Option<String>,
    purl: Option<String>,
    cpe: Option<String>,
    description: Option<String>,
    licenses: Option<CdxXmlLicenses>,
    hashes: Option<CdxXmlHashes>,
    components: Option<Box<CdxXmlComponents>>,
}

impl CdxXmlComponent {
    fn into_component(self) -> CdxComponent {
        CdxComponent {
            component_type: self.component_type,
            bom_ref: self.bom_ref,
            name: self.name,
            version: self.version,
            purl: self.purl,
            cpe: self.cpe,
            description: self.description,
            licenses: self.licenses.map(|l| {
                let mut choices: Vec<CdxLicenseChoice> = l
                    .license
                    .into_iter()
                    .map(|lic| CdxLicenseChoice {
                        license: Some(CdxLicense {
                            id: lic.id,
                            name: lic.name,
                        }),
                        expression: None,
                    })
                    .collect();
                choices.extend(l.expression.into_iter().map(|e| CdxLicenseChoice {
                    license: None,
                    expression: Some(e),
                }));
                choices
            }),
            hashes: self.hashes.map(|h| {
                h.hash
                    .into_iter()
                    .map(|x| CdxHash {
                        alg: x.alg,
                        content: x.content,
                    })
                    .collect()
            }),
            components: self
                .components
                .map(|c| c.component.into_iter().map(CdxXmlComponent::into_component).collect()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CdxXmlLicenses {
    #[serde(rename = "license", default)]
    license: Vec<CdxXmlLicense>,
    #[serde(rename = "expression", default)]
    expression: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlLicense {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlHashes {
    #[serde(rename = "hash", default)]
    hash: Vec<CdxXmlHash>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlHash {
    #[serde(rename = "@alg")]
    alg: String,
    #[serde(rename = "$text")]
    content: String,
}

#[derive(Debug, Deserialize)]
struct CdxXmlDependencies {
    #[serde(rename = "dependency", default)]
    dependency: Vec<CdxXmlDependency>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlDependency {
    #[serde(rename = "@ref")]
    ref_field: String,
    #[serde(rename = "dependency", default)]
    dependency: Vec<CdxXmlDependencyRef>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlDependencyRef {
    #[serde(rename = "@ref")]
    ref_field: String,
}

#[derive(Debug, Deserialize)]
struct CdxXmlVulnerabilities {
    #[serde(rename = "vulnerability", default)]
    vulnerability: Vec<CdxXmlVulnerability>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlVulnerability {
    id: Option<String>,
    source: Option<CdxXmlVulnSource>,
    description: Option<String>,
    recommendation: Option<String>,
    ratings: Option<CdxXmlRatings>,
    affects: Option<CdxXmlAffects>,
    published: Option<String>,
    updated: Option<String>,
}

impl CdxXmlVulnerability {
    fn into_vulnerability(self) -> CdxVulnerability {
        CdxVulnerability {
            id: self.id,
            source: self.source.map(|s| CdxVulnSource {
                name: s.name,
                url: s.url,
            }),
            description: self.description,
            recommendation: self.recommendation,
            ratings: self.ratings.map(|r| {
                r.rating
                    .into_iter()
                    .map(|x| CdxRating {
                        score: x.score,
                        severity: x.severity,
                        method: x.method,
                        vector: x.vector,
                    })
                    .collect()
            }),
            cwes: None,
            affects: self.affects.map(|a| {
                a.target
                    .into_iter()
                    .map(|t| CdxAffects { ref_field: t.ref_field })
                    .collect()
            }),
            references: None,
            advisories: None,
            published: self.published,
            updated: self.updated,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CdxXmlVulnSource {
    name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlRatings {
    #[serde(rename = "rating", default)]
    rating: Vec<CdxXmlRating>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlRating {
    score: Option<f32>,
    severity: Option<String>,
    method: Option<String>,
    vector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlAffects {
    #[serde(rename = "target", default)]
    target: Vec<CdxXmlAffectsTarget>,
}

#[derive(Debug, Deserialize)]
struct CdxXmlAffectsTarget {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> RawParse {
        CycloneDxParser::new()
            .parse_str(content, "test.cdx.json")
            .expect("parse should succeed")
    }

    #[test]
    fn parses_flat_component_list() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "library", "bom-ref": "pkg:npm/express@4.18.0",
                     "name": "express", "version": "4.18.0",
                     "purl": "pkg:npm/express@4.18.0",
                     "licenses": [{"expression": "MIT"}]},
                    {"type": "library", "bom-ref": "pkg:npm/lodash@4.17.21",
                     "name": "lodash", "version": "4.17.21",
                     "purl": "pkg:npm/lodash@4.17.21",
                     "licenses": [{"license": {"id": "MIT"}}]}
                ]
            }"#,
        );
        assert_eq!(raw.format_version, "1.5");
        assert_eq!(raw.components.len(), 2);
        assert_eq!(raw.components[0].id, "pkg:npm/express@4.18.0");
        assert_eq!(raw.components[0].licenses, vec!["MIT"]);
        assert_eq!(raw.components[1].licenses, vec!["MIT"]);
    }

    #[test]
    fn missing_bom_format_is_fatal() {
        let err = CycloneDxParser::new()
            .parse_str(r#"{"specVersion": "1.5"}"#, "x.json")
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingField(ref f) if f == "bomFormat"));
    }

    #[test]
    fn missing_spec_version_is_fatal() {
        let err = CycloneDxParser::new()
            .parse_str(r#"{"bomFormat": "CycloneDX"}"#, "x.json")
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingField(ref f) if f == "specVersion"));
    }

    #[test]
    fn invalid_json_is_fatal() {
        let err = CycloneDxParser::new()
            .parse_str("{ not json ", "x.json")
            .unwrap_err();
        assert_eq!(err.kind(), crate::parsers::ErrorKind::InvalidJson);
    }

    #[test]
    fn nested_components_flatten_with_parent_edges() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "application", "bom-ref": "app", "name": "my-app",
                     "components": [
                        {"type": "library", "bom-ref": "lib-a", "name": "a",
                         "components": [
                            {"type": "library", "bom-ref": "lib-b", "name": "b"}
                         ]}
                     ]}
                ]
            }"#,
        );
        assert_eq!(raw.components.len(), 3);
        // Pre-order document order.
        assert_eq!(raw.components[0].id, "app");
        assert_eq!(raw.components[1].id, "lib-a");
        assert_eq!(raw.components[2].id, "lib-b");
        assert_eq!(raw.components[0].dependencies, vec![raw.components[1].id.clone()]);
        assert_eq!(raw.components[1].dependencies, vec![raw.components[2].id.clone()]);
    }

    #[test]
    fn deep_nesting_does_not_overflow_the_stack() {
        // Far beyond serde_json's default recursion cap of 128.
        let depth = 10_000;
        let mut doc = String::from(r#"{"bomFormat": "CycloneDX", "specVersion": "1.5", "components": ["#);
        for level in 0..depth {
            doc.push_str(&format!(
                r#"{{"type": "library", "bom-ref": "n{level}", "name": "n{level}", "components": ["#
            ));
        }
        doc.push_str(r#"{"type": "library", "bom-ref": "leaf", "name": "leaf"}"#);
        for _ in 0..depth {
            doc.push_str("]}");
        }
        doc.push_str("]}");
        let raw = parse(&doc);
        assert_eq!(raw.components.len(), depth + 1);
        // Each nested child appears in its parent's dependencies.
        assert_eq!(raw.components[0].dependencies, vec![raw.components[1].id.clone()]);
        assert_eq!(
            raw.components[depth - 1].dependencies,
            vec![raw.components[depth].id.clone()]
        );
    }

    #[test]
    fn malformed_entry_is_skipped_with_warning() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "library", "bom-ref": "no-name"},
                    {"type": "library", "bom-ref": "ok", "name": "ok"}
                ]
            }"#,
        );
        assert_eq!(raw.components.len(), 1);
        assert_eq!(raw.components[0].id, "ok");
        assert!(!raw.warnings.is_empty());
    }

    #[test]
    fn children_of_skipped_entry_reattach_to_grandparent() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "application", "bom-ref": "root", "name": "root",
                     "components": [
                        {"type": "library", "bom-ref": "broken",
                         "components": [
                            {"type": "library", "bom-ref": "orphan", "name": "orphan"}
                         ]}
                     ]}
                ]
            }"#,
        );
        assert_eq!(raw.components.len(), 2);
        let root = &raw.components[0];
        assert_eq!(root.dependencies, vec![raw.components[1].id.clone()]);
    }

    #[test]
    fn metadata_component_becomes_document_root() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "metadata": {
                    "component": {"type": "application", "bom-ref": "pkg:npm/my-app@1.0.0",
                                  "name": "my-app", "version": "1.0.0"}
                },
                "components": [
                    {"type": "library", "bom-ref": "lib", "name": "lib"}
                ]
            }"#,
        );
        assert_eq!(raw.components.len(), 2);
        assert_eq!(raw.components[0].name, "my-app");
        assert_eq!(raw.components[0].component_type, ComponentType::Application);
    }

    #[test]
    fn dependency_section_merges_and_drops_dangling() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "application", "bom-ref": "app", "name": "app"},
                    {"type": "library", "bom-ref": "lib", "name": "lib"}
                ],
                "dependencies": [
                    {"ref": "app", "dependsOn": ["lib", "ghost"]}
                ]
            }"#,
        );
        assert_eq!(raw.components[0].dependencies.len(), 1);
        assert_eq!(raw.components[0].dependencies[0], "lib");
        assert!(raw
            .warnings
            .iter()
            .any(|w| w.contains("ghost")));
    }

    #[test]
    fn bom_ref_falls_back_to_purl_then_synthetic() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "library", "name": "a", "purl": "pkg:npm/a@1.0.0"},
                    {"type": "library", "name": "b", "version": "2.0.0"}
                ]
            }"#,
        );
        assert_eq!(raw.components[0].id, "pkg:npm/a@1.0.0");
        assert_eq!(raw.components[1].id, "b@2.0.0");
        assert!(raw.warnings.iter().any(|w| w.contains("synthetic id")));
    }

    #[test]
    fn rating_priority_prefers_cvss31() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [],
                "vulnerabilities": [
                    {"id": "CVE-2023-1", "ratings": [
                        {"severity": "LOW", "method": "CVSSv2", "score": 3.1},
                        {"severity": "HIGH", "method": "CVSSv31", "score": 7.5,
                         "vector": "CVSS:3.1/AV:N"},
                        {"severity": "MEDIUM", "method": "CVSSv3", "score": 5.0}
                    ]}
                ]
            }"#,
        );
        let vuln = &raw.vulnerabilities[0];
        assert_eq!(vuln.severity, Severity::High);
        assert_eq!(vuln.cvss_score, Some(7.5));
        assert_eq!(vuln.cvss_vector.as_deref(), Some("CVSS:3.1/AV:N"));
    }

    #[test]
    fn methodless_severity_string_is_last_resort() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "vulnerabilities": [
                    {"id": "CVE-2023-2", "ratings": [{"severity": "critical"}]}
                ]
            }"#,
        );
        assert_eq!(raw.vulnerabilities[0].severity, Severity::Critical);
    }

    #[test]
    fn unrecognized_severity_maps_to_none_by_default() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "vulnerabilities": [
                    {"id": "CVE-2023-3", "ratings": [{"severity": "moderate", "method": "CVSSv31"}]}
                ]
            }"#,
        );
        assert_eq!(raw.vulnerabilities[0].severity, Severity::None);

        let configured = CycloneDxParser::with_fallback_severity(Severity::Medium)
            .parse_str(
                r#"{
                    "bomFormat": "CycloneDX",
                    "specVersion": "1.5",
                    "vulnerabilities": [
                        {"id": "CVE-2023-3", "ratings": [{"severity": "moderate", "method": "CVSSv31"}]}
                    ]
                }"#,
                "x.json",
            )
            .unwrap();
        assert_eq!(configured.vulnerabilities[0].severity, Severity::Medium);
    }

    #[test]
    fn affects_refs_carry_through_raw() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "library", "bom-ref": "pkg:npm/express@4.18.0",
                     "name": "express", "version": "4.18.0"}
                ],
                "vulnerabilities": [
                    {"id": "CVE-2023-12345",
                     "source": {"name": "NVD", "url": "https://nvd.nist.gov/vuln/detail/CVE-2023-12345"},
                     "description": "A vulnerability in express",
                     "published": "2023-01-15T10:00:00Z",
                     "modified": "2023-01-20T10:00:00Z",
                     "affects": [{"ref": "pkg:npm/express@4.18.0"}]}
                ]
            }"#,
        );
        let vuln = &raw.vulnerabilities[0];
        assert_eq!(vuln.source, "NVD");
        assert_eq!(vuln.affected_components, vec!["pkg:npm/express@4.18.0"]);
        assert!(vuln.published_at.is_some());
        assert!(vuln.modified_at.is_some());
        assert_eq!(vuln.references.len(), 1);
    }

    #[test]
    fn hashes_pass_algorithm_through_unmodified() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "library", "bom-ref": "x", "name": "x",
                     "hashes": [{"alg": "SHA-256", "content": "abc123"}]}
                ]
            }"#,
        );
        let hash = raw.components[0].hash.as_ref().unwrap();
        assert_eq!(hash[0].algorithm, "SHA-256");
        assert_eq!(hash[0].digest, "abc123");
    }

    #[test]
    fn license_expression_splits_into_tokens() {
        let raw = parse(
            r#"{
                "bomFormat": "CycloneDX",
                "specVersion": "1.5",
                "components": [
                    {"type": "library", "bom-ref": "x", "name": "x",
                     "licenses": [{"expression": "MIT OR Apache-2.0"}]}
                ]
            }"#,
        );
        let licenses = &raw.components[0].licenses;
        assert!(licenses.contains(&"MIT".to_string()));
        assert!(licenses.contains(&"Apache-2.0".to_string()));
    }

    #[test]
    fn parses_xml_component_tree() {
        let raw = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<bom xmlns="http://cyclonedx.org/schema/bom/1.5" version="1">
  <components>
    <component type="library" bom-ref="pkg:npm/express@4.18.0">
      <name>express</name>
      <version>4.18.0</version>
      <purl>pkg:npm/express@4.18.0</purl>
    </component>
    <component type="library" bom-ref="pkg:npm/lodash@4.17.21">
      <name>lodash</name>
      <version>4.17.21</version>
    </component>
  </components>
</bom>"#,
        );
        assert_eq!(raw.format_version, "1.5");
        assert_eq!(raw.components.len(), 2);
        assert_eq!(raw.components[0].name, "express");
        assert_eq!(raw.components[1].version.as_deref(), Some("4.17.21"));
    }

    #[test]
    fn xml_without_namespace_is_unsupported() {
        let err = CycloneDxParser::new()
            .parse_str("<bom><components/></bom>", "x.xml")
            .unwrap_err();
        assert_eq!(err.kind(), crate::parsers::ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn namespace_version_extraction() {
        assert_eq!(
            extract_namespace_version(r#"xmlns="http://cyclonedx.org/schema/bom/1.6""#),
            Some("1.6".to_string())
        );
        assert_eq!(extract_namespace_version("no namespace here"), None);
    }
}
