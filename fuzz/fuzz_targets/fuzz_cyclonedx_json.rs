#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_ingest::parsers::{CycloneDxParser, SbomParser};

/// Fuzz the CycloneDX parser directly, bypassing detection.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = CycloneDxParser::new().parse_str(s, "fuzz.cdx.json");
    }
});
