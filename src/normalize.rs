//! Component normalization: deduplication, license ordering, and aggregate
//! metadata.
//!
//! This is a pure post-processing step over raw parser output. It guarantees
//! the invariants downstream consumers rely on: unique component ids (first
//! occurrence in document order wins), alphabetically sorted license tokens,
//! and `metadata.componentCount` exactly matching the component array length.
//! Normalization is idempotent — see [`renormalize`].

use crate::model::{Component, ComponentId, ParseResult, ResultMetadata, SbomFormat};
use crate::parsers::RawParse;
use crate::resolve::RefTable;
use crate::utils::content_hash;
use indexmap::IndexMap;

/// Normalize raw parser output into a canonical [`ParseResult`].
///
/// Returns the ref table alongside so the resolver can run as the next
/// pipeline stage.
pub fn normalize(format: SbomFormat, raw: RawParse) -> (ParseResult, RefTable) {
    let RawParse {
        format_version,
        data_license,
        components,
        vulnerabilities,
        refs,
        mut warnings,
    } = raw;

    let components = dedup_components(components, &mut warnings);

    let metadata = ResultMetadata {
        format,
        format_version,
        component_count: components.len(),
        data_license,
    };

    let result = ParseResult {
        components,
        vulnerabilities,
        metadata,
        warnings,
        unresolved_refs: 0,
        content_hash: 0,
    };
    (result, refs)
}

/// Re-run normalization over an already-canonical result.
///
/// Idempotent: a second pass yields an identical component set — same ids,
/// same license ordering, same content hash.
pub fn renormalize(mut result: ParseResult) -> ParseResult {
    let mut warnings = std::mem::take(&mut result.warnings);
    result.components = dedup_components(std::mem::take(&mut result.components), &mut warnings);
    result.metadata.component_count = result.components.len();
    result.warnings = warnings;
    seal(&mut result);
    result
}

/// Stamp the content hash over the serialized canonical form.
pub fn seal(result: &mut ParseResult) {
    result.content_hash = 0;
    result.content_hash = serde_json::to_vec(&*result)
        .map(|bytes| content_hash(&bytes))
        .unwrap_or_default();
}

fn dedup_components(components: Vec<Component>, warnings: &mut Vec<String>) -> Vec<Component> {
    let mut deduped: IndexMap<ComponentId, Component> = IndexMap::with_capacity(components.len());
    for component in components {
        if deduped.contains_key(&component.id) {
            let message = format!(
                "duplicate component id '{}' ({}); keeping first occurrence",
                component.id,
                component.display_name()
            );
            tracing::warn!("{message}");
            warnings.push(message);
        } else {
            deduped.insert(component.id.clone(), component);
        }
    }

    let mut components: Vec<Component> = deduped.into_values().collect();
    for component in &mut components {
        component.licenses.sort();
        component.licenses.dedup();
    }
    components
}
