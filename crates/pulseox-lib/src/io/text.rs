use anyhow::{Context, Result};
use std::path::Path;

/// Parse a newline-delimited series of raw intensities, ignoring blank and
/// comment lines.
pub fn parse_u32_series(text: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: u32 = trimmed
            .parse()
            .with_context(|| format!("line {} is not a sample value: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no samples found");
    }
    Ok(out)
}

/// Read a newline-delimited intensity series from disk.
pub fn read_u32_series(path: &Path) -> Result<Vec<u32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_u32_series(&text)
}
