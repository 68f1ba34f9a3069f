#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the main parse entry point.
///
/// Feeds arbitrary UTF-8 strings to `parse_sbom_str`, which runs format
/// detection and dispatches to the appropriate parser, exercising every
/// detection heuristic and parser path.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = sbom_ingest::parse_sbom_str(s, "fuzz.json");
    }
});
