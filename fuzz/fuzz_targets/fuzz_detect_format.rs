#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz format detection, which must never fail or panic — it degrades to
/// an unknown classification on any input.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let detection = sbom_ingest::detect_format(s, "fuzz.json");
        let _ = detection.format_label();
    }
});
