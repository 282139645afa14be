//! Run orchestration: config → reference → ingest → catalog → pivot →
//! reconcile → emit → manifest.
//!
//! Nothing is written until the reference is loaded, the catalog has passed
//! the collision check and every symbol is reconciled.

use std::path::PathBuf;
use std::time::Instant;

use chainpivot_core::{
    pivot, reconcile, ColumnNamer, ContractCatalog, FutureNaming, NamingError, PivotStats,
    ReconciledTable, ReferenceError, SchemaMode, SymbolTable, TickerDecoder,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ModeSetting, PivotConfig};
use crate::emit::{EmitError, Emitter};
use crate::ingest::{load_quotes, IngestError, IngestStats};
use crate::manifest::{
    hash_file, write_manifest, CatalogCounters, RunManifest, SymbolEntry, MANIFEST_VERSION,
};
use crate::reference::load_reference;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    #[error("naming error: {0}")]
    Naming(#[from] NamingError),
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),
    #[error("manifest error: {0}")]
    Manifest(String),
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub file_date: NaiveDate,
    pub mode: &'static str,
    pub futures: FutureNaming,
    pub ingest: IngestStats,
    pub catalog: CatalogCounters,
    pub pivot: PivotStats,
    pub symbols: Vec<SymbolEntry>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn empty_symbols(&self) -> usize {
        self.symbols.iter().filter(|s| s.rows == 0).count()
    }
}

pub fn run(config: &PivotConfig) -> Result<RunSummary, RunError> {
    config.validate()?;
    let started = Instant::now();

    let mode = load_mode(config)?;
    let futures = resolve_futures(config, &mode);
    info!(mode = mode.name(), futures = ?futures, "schema resolved");

    let ingested = load_quotes(&config.input.path, &config.input)?;
    info!(
        input = %config.input.path.display(),
        rows = ingested.stats.rows_read,
        kept = ingested.stats.rows_kept,
        file_date = %ingested.file_date,
        "input loaded"
    );
    if ingested.stats.rows_malformed > 0 {
        warn!(rows = ingested.stats.rows_malformed, "malformed rows skipped");
    }
    if ingested.stats.values_non_finite > 0 {
        warn!(values = ingested.stats.values_non_finite, "non-finite values dropped");
    }

    let decoder = TickerDecoder::new(config.decoder.suffixes.iter().cloned());
    let catalog = ContractCatalog::build(
        ingested.quotes.iter().map(|q| q.ticker.as_str()),
        &decoder,
        config.policy.expiry,
    )?;
    for ticker in catalog.unrecognized() {
        debug!(%ticker, "unrecognized ticker");
    }
    if !catalog.unrecognized().is_empty() {
        warn!(tickers = catalog.unrecognized().len(), "unrecognized tickers skipped");
    }
    if catalog.superseded_count() > 0 {
        warn!(
            contracts = catalog.superseded_count(),
            "later-expiry contracts superseded by the nearest expiry"
        );
    }

    let namer = ColumnNamer::new(futures, config.schema.closing_field.as_str());
    let mut pivoted = pivot(&ingested.quotes, &catalog, &namer, config.policy.duplicates);
    info!(
        symbols = pivoted.tables.len(),
        cells = pivoted.stats.cells_written,
        "pivot complete"
    );
    let dups = pivoted.stats.cells_overwritten + pivoted.stats.cells_rejected;
    if dups > 0 {
        warn!(cells = dups, policy = ?config.policy.duplicates, "duplicate cell writes resolved");
    }

    let (symbols, outside_universe) = match config.universe() {
        Some(universe) => {
            let outside: Vec<String> = universe
                .outsiders(pivoted.tables.keys().map(String::as_str))
                .into_iter()
                .map(str::to_string)
                .collect();
            if !outside.is_empty() {
                warn!(symbols = ?outside, "observed symbols outside the universe are not emitted");
            }
            (universe.symbols().map(str::to_string).collect::<Vec<_>>(), outside)
        }
        None => (pivoted.tables.keys().cloned().collect(), Vec::new()),
    };
    if symbols.is_empty() {
        warn!("universe is empty; nothing to emit");
    }

    let tables: Vec<SymbolTable> = symbols.iter().map(|s| pivoted.take(s)).collect();
    let fill = config.policy.missing;
    let file_date = ingested.file_date;
    let reconciled: Vec<ReconciledTable> = if config.output.parallel {
        tables
            .into_par_iter()
            .map(|table| reconcile(table, &mode, fill, file_date))
            .collect()
    } else {
        tables
            .into_iter()
            .map(|table| reconcile(table, &mode, fill, file_date))
            .collect()
    };

    let input_hash =
        hash_file(&config.input.path).map_err(|e| RunError::Manifest(format!("{e:#}")))?;

    let emitter = Emitter::new(&config.output.dir, config.output.format)?;
    let entries: Vec<SymbolEntry> = if config.output.parallel {
        reconciled
            .par_iter()
            .map(|table| emit_one(&emitter, table))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        reconciled
            .iter()
            .map(|table| emit_one(&emitter, table))
            .collect::<Result<Vec<_>, _>>()?
    };

    let catalog_counters = CatalogCounters {
        distinct_tickers: catalog.len(),
        unrecognized_tickers: catalog.unrecognized().len(),
        superseded_contracts: catalog.superseded_count(),
        outside_universe,
    };

    if config.output.manifest {
        let manifest = RunManifest {
            manifest_version: MANIFEST_VERSION,
            created_at: chrono::Local::now().naive_local(),
            input: config.input.path.display().to_string(),
            input_hash,
            file_date,
            mode: mode.name().to_string(),
            reference: config
                .schema
                .reference
                .as_ref()
                .filter(|_| matches!(mode, SchemaMode::Strict(_)))
                .map(|p| p.display().to_string()),
            format: config.output.format.extension().to_string(),
            ingest: ingested.stats.clone(),
            catalog: catalog_counters.clone(),
            pivot: pivoted.stats.clone(),
            symbols: entries.clone(),
        };
        write_manifest(emitter.dir(), &manifest)
            .map_err(|e| RunError::Manifest(format!("{e:#}")))?;
    }

    let elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        files = entries.len(),
        dir = %emitter.dir().display(),
        elapsed_secs,
        "run complete"
    );

    Ok(RunSummary {
        output_dir: emitter.dir().to_path_buf(),
        file_date,
        mode: mode.name(),
        futures,
        ingest: ingested.stats,
        catalog: catalog_counters,
        pivot: pivoted.stats,
        symbols: entries,
        elapsed_secs,
    })
}

fn load_mode(config: &PivotConfig) -> Result<SchemaMode, RunError> {
    match config.schema.mode {
        ModeSetting::Dynamic => Ok(SchemaMode::Dynamic),
        ModeSetting::Strict => {
            let path = config
                .schema
                .reference
                .as_ref()
                .ok_or(ConfigError::MissingReference)?;
            let schema = load_reference(path)?;
            info!(reference = %path.display(), columns = schema.len(), "reference schema loaded");
            Ok(SchemaMode::Strict(schema))
        }
    }
}

/// Explicit setting wins; otherwise strict follows the reference and
/// dynamic uses bare names.
fn resolve_futures(config: &PivotConfig, mode: &SchemaMode) -> FutureNaming {
    config
        .schema
        .futures
        .explicit()
        .unwrap_or_else(|| match mode {
            SchemaMode::Strict(reference) => FutureNaming::from_reference(reference),
            SchemaMode::Dynamic => FutureNaming::Bare,
        })
}

fn emit_one(emitter: &Emitter, table: &ReconciledTable) -> Result<SymbolEntry, EmitError> {
    let path = emitter.emit(table)?;
    info!(
        symbol = table.symbol(),
        rows = table.height(),
        columns = table.width(),
        density_pct = (table.density() * 1000.0).round() / 10.0,
        "wrote artifact"
    );
    Ok(SymbolEntry {
        symbol: table.symbol().to_string(),
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        rows: table.height(),
        columns: table.width(),
        density: table.density(),
        dropped_columns: table.dropped_columns().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuturesSetting;
    use chainpivot_core::ReferenceSchema;

    fn reference(names: &[&str]) -> SchemaMode {
        SchemaMode::Strict(
            ReferenceSchema::new(names.iter().map(|s| s.to_string()).collect()).unwrap(),
        )
    }

    #[test]
    fn futures_naming_auto_follows_reference() {
        let config = PivotConfig::default();
        assert_eq!(
            resolve_futures(&config, &reference(&["Time", "FUT_I_Close"])),
            FutureNaming::FieldQualified
        );
        assert_eq!(
            resolve_futures(&config, &reference(&["Time", "FUT_I"])),
            FutureNaming::Bare
        );
        assert_eq!(resolve_futures(&config, &SchemaMode::Dynamic), FutureNaming::Bare);
    }

    #[test]
    fn explicit_futures_naming_wins() {
        let mut config = PivotConfig::default();
        config.schema.futures = FuturesSetting::FieldQualified;
        assert_eq!(resolve_futures(&config, &SchemaMode::Dynamic), FutureNaming::FieldQualified);
        config.schema.futures = FuturesSetting::Bare;
        assert_eq!(
            resolve_futures(&config, &reference(&["FUT_I_Close"])),
            FutureNaming::Bare
        );
    }
}
