//! Reference resolution: linking vulnerability records to canonical
//! component ids.
//!
//! Parsers register every document-native key they see (`bom-ref`, `purl`,
//! `SPDXID`) in a [`RefTable`]. After normalization, the resolver translates
//! each vulnerability's raw `affects` references through that table. A
//! reference that cannot be resolved — the component is absent from the
//! document, or a malformed entry was dropped — is retained verbatim rather
//! than discarded: linkage is best-effort, never silently lossy.

use crate::model::{ComponentId, Vulnerability};
use std::collections::HashMap;

/// Mapping from document-native identifier strings to canonical ids,
/// built during parsing.
#[derive(Debug, Default)]
pub struct RefTable {
    map: HashMap<String, ComponentId>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native key. The first registration wins, matching the
    /// normalizer's first-occurrence dedup rule.
    pub fn insert(&mut self, native: impl Into<String>, id: ComponentId) {
        self.map.entry(native.into()).or_insert(id);
    }

    /// Look up the canonical id for a native key.
    pub fn resolve(&self, native: &str) -> Option<&ComponentId> {
        self.map.get(native)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Translate every vulnerability's raw references into canonical ids.
///
/// Returns the number of references that stayed unresolved; each one also
/// records a warning for the validator to report.
pub fn resolve_references(
    vulnerabilities: &mut [Vulnerability],
    refs: &RefTable,
    warnings: &mut Vec<String>,
) -> usize {
    let mut unresolved = 0;
    for vuln in vulnerabilities.iter_mut() {
        for target in vuln.affected_components.iter_mut() {
            match refs.resolve(target) {
                Some(id) => *target = id.as_str().to_string(),
                None => {
                    unresolved += 1;
                    let message = format!(
                        "vulnerability {}: reference '{}' does not match any component; keeping raw ref",
                        vuln.id, target
                    );
                    tracing::warn!("{message}");
                    warnings.push(message);
                }
            }
        }
    }
    unresolved
}
