//! Long-format CSV ingestion.
//!
//! Turns the input CSV into `RawQuote`s. Bad rows are skipped and counted;
//! only I/O failures and a missing identity header abort the load.

use chainpivot_core::{FieldLabel, RawQuote};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::InputConfig;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open input {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input has no '{0}' column")]
    MissingColumn(String),

    #[error("input has none of the configured field columns ({0})")]
    NoFieldColumns(String),

    #[error("input has no parseable rows")]
    NoRows,
}

/// Row-level counters from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows dropped for a blank ticker, bad timestamp or unparseable number.
    pub rows_malformed: usize,
    /// Kept rows whose date differs from the file date.
    pub rows_off_date: usize,
    /// NaN or infinite values dropped from otherwise valid rows.
    pub values_non_finite: usize,
    /// Configured field headers absent from the input.
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Ingested {
    pub quotes: Vec<RawQuote>,
    /// Date of the first parseable row.
    pub file_date: NaiveDate,
    pub stats: IngestStats,
}

pub fn load_quotes(path: &Path, input: &InputConfig) -> Result<Ingested, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_quotes(file, input)
}

pub fn read_quotes<R: Read>(reader: R, input: &InputConfig) -> Result<Ingested, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let layout = Layout::resolve(rdr.headers()?, input)?;

    let mut stats = IngestStats {
        missing_fields: layout.missing.clone(),
        ..IngestStats::default()
    };
    for header in &layout.missing {
        warn!(field = %header, "configured field column not found in input");
    }

    let mut quotes = Vec::new();
    let mut file_date: Option<NaiveDate> = None;
    let mut record = csv::StringRecord::new();

    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                stats.rows_read += 1;
                stats.rows_malformed += 1;
                debug!(error = %e, "skipping unreadable record");
                continue;
            }
        }
        stats.rows_read += 1;

        let Some(quote) = layout.parse(&record, input, &mut stats) else {
            stats.rows_malformed += 1;
            debug!(line = record.position().map(|p| p.line()), "skipping malformed row");
            continue;
        };

        let date = *file_date.get_or_insert(quote.date());
        if quote.date() != date {
            stats.rows_off_date += 1;
        }
        stats.rows_kept += 1;
        quotes.push(quote);
    }

    let file_date = file_date.ok_or(IngestError::NoRows)?;
    if stats.rows_off_date > 0 {
        warn!(
            rows = stats.rows_off_date,
            file_date = %file_date,
            "rows dated differently from the file date"
        );
    }

    Ok(Ingested {
        quotes,
        file_date,
        stats,
    })
}

/// Column positions resolved from the header row.
struct Layout {
    ticker: usize,
    date: usize,
    time: usize,
    /// (column index, interned output label)
    fields: Vec<(usize, FieldLabel)>,
    missing: Vec<String>,
}

impl Layout {
    fn resolve(headers: &csv::StringRecord, input: &InputConfig) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &str| find(name).ok_or_else(|| IngestError::MissingColumn(name.into()));

        let ticker = required(&input.ticker_column)?;
        let date = required(&input.date_column)?;
        let time = required(&input.time_column)?;

        let mut fields = Vec::with_capacity(input.fields.len());
        let mut missing = Vec::new();
        for mapping in &input.fields {
            match find(&mapping.header) {
                Some(idx) => fields.push((idx, FieldLabel::from(mapping.label.as_str()))),
                None => missing.push(mapping.header.clone()),
            }
        }
        if fields.is_empty() {
            return Err(IngestError::NoFieldColumns(missing.join(", ")));
        }

        Ok(Self {
            ticker,
            date,
            time,
            fields,
            missing,
        })
    }

    fn parse(
        &self,
        record: &csv::StringRecord,
        input: &InputConfig,
        stats: &mut IngestStats,
    ) -> Option<RawQuote> {
        let ticker = record.get(self.ticker).filter(|t| !t.is_empty())?;
        let date = NaiveDate::parse_from_str(record.get(self.date)?, &input.date_format).ok()?;
        let time = NaiveTime::parse_from_str(record.get(self.time)?, &input.time_format).ok()?;

        let mut quote = RawQuote::new(ticker, NaiveDateTime::new(date, time));
        for (idx, label) in &self.fields {
            let cell = record.get(*idx).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().ok()?;
            if !value.is_finite() {
                stats.values_non_finite += 1;
                continue;
            }
            quote.values.push((label.clone(), value));
        }
        Some(quote)
    }
}
