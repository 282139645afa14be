//! Run manifest (`manifest.json`) written beside the artifacts.

use anyhow::{Context, Result};
use chainpivot_core::PivotStats;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::ingest::IngestStats;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Current schema version of `manifest.json`.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub created_at: NaiveDateTime,
    pub input: String,
    /// BLAKE3 of the input file bytes.
    pub input_hash: String,
    pub file_date: NaiveDate,
    pub mode: String,
    pub reference: Option<String>,
    pub format: String,
    pub ingest: IngestStats,
    pub catalog: CatalogCounters,
    pub pivot: PivotStats,
    pub symbols: Vec<SymbolEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogCounters {
    pub distinct_tickers: usize,
    pub unrecognized_tickers: usize,
    pub superseded_contracts: usize,
    /// Symbols seen in the input but not emitted.
    pub outside_universe: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    pub file: String,
    pub rows: usize,
    pub columns: usize,
    pub density: f64,
    pub dropped_columns: usize,
}

/// BLAKE3 hex digest of a file, streamed.
pub fn hash_file(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    hasher
        .update_reader(file)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn write_manifest(dir: &Path, manifest: &RunManifest) -> Result<()> {
    let path = dir.join(MANIFEST_FILE);
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize run manifest")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}

pub fn read_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    serde_json::from_str(&json).context("Failed to deserialize run manifest")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RunManifest {
        RunManifest {
            manifest_version: MANIFEST_VERSION,
            created_at: NaiveDate::from_ymd_opt(2025, 11, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            input: "nfo.csv".into(),
            input_hash: "abc".into(),
            file_date: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
            mode: "dynamic".into(),
            reference: None,
            format: "feather".into(),
            ingest: IngestStats::default(),
            catalog: CatalogCounters::default(),
            pivot: PivotStats::default(),
            symbols: vec![SymbolEntry {
                symbol: "TCS".into(),
                file: "TCS_2025-10-31.feather".into(),
                rows: 375,
                columns: 45,
                density: 0.8,
                dropped_columns: 0,
            }],
        }
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "Ticker,Date\n").unwrap();
        std::fs::write(&b, "Ticker,Time\n").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&a).unwrap());
        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
        assert_eq!(hash_file(&a).unwrap().len(), 64);
    }

    #[test]
    fn manifest_written_and_read_back() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), &sample()).unwrap();
        let back = read_manifest(dir.path()).unwrap();
        assert_eq!(back.symbols.len(), 1);
        assert_eq!(back.symbols[0].rows, 375);
        assert_eq!(back.file_date, NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
    }
}
