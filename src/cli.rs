//! CLI command handlers.

use crate::model::ParseResult;
use crate::parsers;
use crate::validate;
use anyhow::{Context, Result};
use std::path::Path;

/// Read a file and report the detected format as JSON on stdout.
pub fn run_detect(path: &Path) -> Result<()> {
    let content = read(path)?;
    let detection = parsers::detect_format(&content, &filename(path));
    for warning in &detection.warnings {
        tracing::warn!("{warning}");
    }
    let summary = serde_json::json!({
        "format": detection.format_label(),
        "version": detection.version,
    });
    println!("{summary}");
    Ok(())
}

/// Parse a file and write the canonical result as JSON on stdout.
///
/// Returns a non-zero exit code on parse failure so CI pipelines can gate
/// on it.
pub fn run_parse(path: &Path, pretty: bool) -> Result<i32> {
    let content = read(path)?;
    match parsers::parse_sbom_str(&content, &filename(path)) {
        Ok(result) => {
            tracing::info!(
                components = result.metadata.component_count,
                vulnerabilities = result.vulnerabilities.len(),
                warnings = result.warnings.len(),
                "parsed {}",
                path.display()
            );
            print_json(&result, pretty)?;
            Ok(0)
        }
        Err(error) => {
            tracing::error!("{}: {} ({})", path.display(), error, error.kind());
            Ok(1)
        }
    }
}

/// Validate a file and print the violation report as JSON on stdout.
pub fn run_validate(path: &Path, pretty: bool) -> Result<i32> {
    let content = read(path)?;
    let report = validate::validate_report(&content, &filename(path));
    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize validation report")?;
    println!("{json}");
    Ok(if report.valid { 0 } else { 1 })
}

/// Print the JSON Schema of [`ParseResult`] for export-facing consumers.
pub fn run_schema() -> Result<()> {
    let schema = schemars::schema_for!(ParseResult);
    let json = serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
    println!("{json}");
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read SBOM file: {}", path.display()))
}

fn filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_json(result: &ParseResult, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .context("failed to serialize parse result")?;
    println!("{json}");
    Ok(())
}
