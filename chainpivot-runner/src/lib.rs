//! chainpivot runner: file I/O and orchestration around `chainpivot-core`.
//!
//! This crate provides:
//! - TOML run configuration with CLI-overridable sections
//! - Long-format CSV ingestion with row-level counters
//! - Reference schema loading (Feather, Parquet, CSV)
//! - Atomic Feather/Parquet/CSV emission, one file per symbol
//! - Run manifest with input hash and per-symbol density
//! - Output validation and Feather → CSV conversion

pub mod config;
pub mod convert;
pub mod emit;
pub mod ingest;
pub mod manifest;
pub mod reference;
pub mod runner;
pub mod universe;
pub mod validate;

pub use config::{
    ConfigError, FieldMapping, FuturesSetting, ModeSetting, PivotConfig,
};
pub use convert::feather_to_csv;
pub use emit::{artifact_name, to_dataframe, EmitError, Emitter, OutputFormat};
pub use ingest::{load_quotes, read_quotes, IngestError, IngestStats, Ingested};
pub use manifest::{read_manifest, RunManifest, SymbolEntry, MANIFEST_FILE};
pub use reference::load_reference;
pub use runner::{run, RunError, RunSummary};
pub use universe::{Universe, NIFTY50};
pub use validate::{validate_outputs, ArtifactIssue, Problem, ValidationReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<PivotConfig>();
        assert_sync::<PivotConfig>();
    }

    #[test]
    fn emitter_is_send_sync() {
        assert_send::<Emitter>();
        assert_sync::<Emitter>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
