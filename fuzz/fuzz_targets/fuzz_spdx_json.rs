#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_ingest::parsers::{SbomParser, SpdxParser};

/// Fuzz the SPDX parser directly, bypassing detection.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = SpdxParser::new().parse_str(s, "fuzz.spdx.json");
    }
});
