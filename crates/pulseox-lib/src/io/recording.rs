use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Load a two-channel PPG recording from a headered CSV and return the
/// infrared and red series.
pub fn read_recording_csv(
    path: &Path,
    ir_column: &str,
    red_column: &str,
) -> Result<(Vec<u32>, Vec<u32>)> {
    let file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_recording_csv(file, ir_column, red_column)
}

/// Parse a two-channel recording from any CSV source with named columns.
pub fn parse_recording_csv<R: Read>(
    source: R,
    ir_column: &str,
    red_column: &str,
) -> Result<(Vec<u32>, Vec<u32>)> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);
    let headers = reader.headers()?.clone();
    let ir_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(ir_column))
        .context(format!("missing infrared column '{}'", ir_column))?;
    let red_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(red_column))
        .context(format!("missing red column '{}'", red_column))?;
    let mut ir = Vec::new();
    let mut red = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.context("reading record")?;
        let ir_str = record
            .get(ir_idx)
            .ok_or_else(|| anyhow::anyhow!("row {}: missing infrared field", row + 1))?;
        let red_str = record
            .get(red_idx)
            .ok_or_else(|| anyhow::anyhow!("row {}: missing red field", row + 1))?;
        ir.push(
            ir_str
                .trim()
                .parse::<u32>()
                .with_context(|| format!("row {}: parsing infrared value {}", row + 1, ir_str))?,
        );
        red.push(
            red_str
                .trim()
                .parse::<u32>()
                .with_context(|| format!("row {}: parsing red value {}", row + 1, red_str))?,
        );
    }
    if ir.is_empty() {
        anyhow::bail!("recording holds no samples");
    }
    Ok((ir, red))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_columns() {
        let csv = "t,ir,red\n0,1000,900\n1,1010,905\n2,1005,903\n";
        let (ir, red) = parse_recording_csv(csv.as_bytes(), "ir", "red").unwrap();
        assert_eq!(ir, vec![1000, 1010, 1005]);
        assert_eq!(red, vec![900, 905, 903]);
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let csv = "IR,RED\n1,2\n";
        let (ir, red) = parse_recording_csv(csv.as_bytes(), "ir", "red").unwrap();
        assert_eq!(ir, vec![1]);
        assert_eq!(red, vec![2]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "ir,green\n1,2\n";
        let err = parse_recording_csv(csv.as_bytes(), "ir", "red").unwrap_err();
        assert!(err.to_string().contains("missing red column"));
    }

    #[test]
    fn bad_value_reports_row() {
        let csv = "ir,red\n1000,900\nx,901\n";
        let err = parse_recording_csv(csv.as_bytes(), "ir", "red").unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }
}
