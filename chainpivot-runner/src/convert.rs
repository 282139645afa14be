//! Feather → CSV conversion for inspecting artifacts by hand.

use anyhow::{bail, Context, Result};
use polars::prelude::{CsvWriter, IpcReader, SerReader, SerWriter};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Convert one Feather file to CSV and return the CSV path.
///
/// Without an explicit output the CSV lands beside the input with the
/// extension swapped.
pub fn feather_to_csv(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if !input.is_file() {
        bail!("input file not found: {}", input.display());
    }
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("csv"));

    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let mut df = IpcReader::new(file)
        .finish()
        .with_context(|| format!("Failed to read Feather file {}", input.display()))?;

    let mut out = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    CsvWriter::new(&mut out)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV {}", output.display()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame, IpcWriter};
    use tempfile::TempDir;

    #[test]
    fn converts_beside_input_by_default() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("TCS_2025-10-31.feather");
        let mut df = DataFrame::new(vec![
            Column::new("Time".into(), ["09:15:59", "09:16:59"]),
            Column::new("FUT_I".into(), [Some(2601.0), None]),
        ])
        .unwrap();
        IpcWriter::new(&mut File::create(&input).unwrap())
            .finish(&mut df)
            .unwrap();

        let output = feather_to_csv(&input, None).unwrap();
        assert_eq!(output, dir.path().join("TCS_2025-10-31.csv"));
        let text = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Time,FUT_I");
        assert!(lines[1].starts_with("09:15:59,2601"));
        assert_eq!(lines[2], "09:16:59,");
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(feather_to_csv(&dir.path().join("nope.feather"), None).is_err());
    }
}
