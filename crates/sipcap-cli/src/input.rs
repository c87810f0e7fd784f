//! Capture path resolution: glob expansion, existence and format checks.

use std::path::{Path, PathBuf};

use crate::CliError;

const FORMAT_HINT: &str = "sipcap reads .pcap and .pcapng captures";
const LISTED_MATCHES: usize = 3;

const CAPTURE_EXTENSIONS: [&str; 2] = ["pcap", "pcapng"];

/// File-name check only; the container is detected from the magic bytes.
fn has_capture_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CAPTURE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Expand `input` when it is a glob, then require exactly one existing
/// capture file.
pub fn resolve_capture(input: &Path) -> Result<PathBuf, CliError> {
    let path = expand(input)?;
    if !path.exists() {
        return Err(CliError::with_hint(
            format!("capture not found: {}", path.display()),
            FORMAT_HINT,
        ));
    }
    if !path.is_file() {
        return Err(CliError::with_hint(
            format!("capture is not a regular file: {}", path.display()),
            FORMAT_HINT,
        ));
    }
    if !has_capture_extension(&path) {
        return Err(CliError::with_hint(
            format!("unsupported input format '{}'", path.display()),
            FORMAT_HINT,
        ));
    }
    Ok(path)
}

fn expand(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !pattern.contains(['*', '?', '[']) {
        return Ok(input.to_path_buf());
    }

    let bad_pattern = |reason: String| {
        CliError::with_hint(format!("invalid input pattern '{pattern}'"), reason)
    };
    let mut matches = Vec::new();
    for entry in glob::glob(&pattern).map_err(|err| bad_pattern(err.msg.to_string()))? {
        let path = entry.map_err(|err| bad_pattern(err.to_string()))?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.len() > 1 {
        let mut shown: Vec<String> = matches
            .iter()
            .take(LISTED_MATCHES)
            .map(|path| path.display().to_string())
            .collect();
        if matches.len() > LISTED_MATCHES {
            shown.push("...".to_string());
        }
        return Err(CliError::with_hint(
            format!(
                "multiple files match pattern '{pattern}' ({} matches: {})",
                matches.len(),
                shown.join(", ")
            ),
            "decode one capture per run",
        ));
    }
    matches.pop().ok_or_else(|| {
        CliError::with_hint(
            format!("no files match pattern '{pattern}'"),
            "quote the pattern so the shell does not expand it",
        )
    })
}
