//! Columnar artifact writer.
//!
//! Layout: `{output_dir}/{SYMBOL}_{YYYY-MM-DD}.{ext}`
//!
//! Writes are atomic: the frame goes to `{file}.tmp` and is renamed into
//! place, so a crashed run never leaves a half-written artifact behind.

use chainpivot_core::{ColumnData, OutputColumn, ReconciledTable};
use chrono::NaiveDate;
use polars::prelude::{
    Column, CsvWriter, DataFrame, DataType, IpcWriter, ParquetWriter, PolarsError, SerWriter,
    TimeUnit,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot build frame for {symbol}: {source}")]
    Frame { symbol: String, source: PolarsError },

    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: PolarsError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Arrow IPC file, readable by pandas `read_feather`.
    #[default]
    Feather,
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Feather => "feather",
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "feather" | "arrow" | "ipc" => Ok(Self::Feather),
            "parquet" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}' (expected feather, parquet or csv)")),
        }
    }
}

/// `{SYMBOL}_{YYYY-MM-DD}.{ext}`
pub fn artifact_name(symbol: &str, date: NaiveDate, format: OutputFormat) -> String {
    format!("{symbol}_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Writes reconciled tables into one directory.
#[derive(Debug, Clone)]
pub struct Emitter {
    dir: PathBuf,
    format: OutputFormat,
}

impl Emitter {
    /// The directory is created if it does not exist.
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Result<Self, EmitError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| EmitError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, format })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn path_for(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.dir.join(artifact_name(symbol, date, self.format))
    }

    /// Write one table and return the final path.
    pub fn emit(&self, table: &ReconciledTable) -> Result<PathBuf, EmitError> {
        let mut df = to_dataframe(table).map_err(|source| EmitError::Frame {
            symbol: table.symbol().to_string(),
            source,
        })?;
        let path = self.path_for(table.symbol(), table.file_date());
        let tmp_path = path.with_extension(format!("{}.tmp", self.format.extension()));

        if let Err(e) = write_frame(&mut df, &tmp_path, self.format) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            EmitError::Io {
                path: path.clone(),
                source,
            }
        })?;
        Ok(path)
    }
}

fn write_frame(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<(), EmitError> {
    let mut file = File::create(path).map_err(|source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let written = match format {
        OutputFormat::Feather => IpcWriter::new(&mut file).finish(df),
        OutputFormat::Parquet => ParquetWriter::new(&mut file).finish(df).map(|_| ()),
        OutputFormat::Csv => CsvWriter::new(&mut file).include_header(true).finish(df),
    };
    written.map_err(|source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a reconciled table to a polars frame.
///
/// `Datetime` becomes datetime\[ms\], dates become `Date`, text stays
/// string and value columns are nullable f64.
pub fn to_dataframe(table: &ReconciledTable) -> Result<DataFrame, PolarsError> {
    let columns = table
        .columns()
        .iter()
        .map(to_column)
        .collect::<Result<Vec<_>, _>>()?;
    DataFrame::new(columns)
}

fn to_column(column: &OutputColumn) -> Result<Column, PolarsError> {
    let name = column.name.as_str().into();
    match &column.data {
        ColumnData::Datetime(values) => {
            let millis: Vec<i64> = values
                .iter()
                .map(|dt| dt.and_utc().timestamp_millis())
                .collect();
            Column::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        }
        ColumnData::Date(values) => {
            let epoch = NaiveDate::default();
            let days: Vec<i32> = values
                .iter()
                .map(|d| (*d - epoch).num_days() as i32)
                .collect();
            Column::new(name, days).cast(&DataType::Date)
        }
        ColumnData::Text(values) => Ok(Column::new(name, values.as_slice())),
        ColumnData::Values(values) => Ok(Column::new(name, values.as_slice())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpivot_core::{
        pivot, reconcile, ColumnNamer, ContractCatalog, DuplicatePolicy, ExpiryPolicy,
        MissingFill, RawQuote, ReferenceSchema, SchemaMode, SymbolTable, TickerDecoder,
    };
    use polars::prelude::{IpcReader, SerReader};
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
    }

    fn tcs(mode: &SchemaMode) -> ReconciledTable {
        let ts = day().and_hms_opt(9, 15, 59).unwrap();
        let quotes = vec![
            RawQuote::new("TCS25NOV252600CE.NFO", ts).with_value("Close", 467.0),
            RawQuote::new("TCS-I.NFO", ts).with_value("Close", 2601.0),
            RawQuote::new("TCS-I.NFO", ts + chrono::Duration::minutes(1)).with_value("Close", 2602.0),
        ];
        let catalog = ContractCatalog::build(
            quotes.iter().map(|q| q.ticker.as_str()),
            &TickerDecoder::default(),
            ExpiryPolicy::Reject,
        )
        .unwrap();
        let mut out = pivot(&quotes, &catalog, &ColumnNamer::default(), DuplicatePolicy::LastWins);
        reconcile(out.take("TCS"), mode, MissingFill::Null, day())
    }

    #[test]
    fn artifact_names_follow_symbol_and_date() {
        assert_eq!(artifact_name("M&M", day(), OutputFormat::Feather), "M&M_2025-10-31.feather");
        assert_eq!(artifact_name("TCS", day(), OutputFormat::Csv), "TCS_2025-10-31.csv");
    }

    #[test]
    fn dataframe_types_and_nulls() {
        let reference = ReferenceSchema::new(
            ["Datetime", "FileDate", "Time", "FUT_I", "2600CE_Close"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        let df = to_dataframe(&tcs(&SchemaMode::Strict(reference))).unwrap();

        assert_eq!(df.shape(), (2, 5));
        assert_eq!(
            df.column("Datetime").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(df.column("FileDate").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("Time").unwrap().dtype(), &DataType::String);
        let ce = df.column("2600CE_Close").unwrap().f64().unwrap();
        assert_eq!(ce.get(0), Some(467.0));
        assert_eq!(ce.get(1), None);
    }

    #[test]
    fn emits_feather_atomically() {
        let dir = TempDir::new().unwrap();
        let emitter = Emitter::new(dir.path().join("out"), OutputFormat::Feather).unwrap();
        let path = emitter.emit(&tcs(&SchemaMode::Dynamic)).unwrap();

        assert_eq!(path, dir.path().join("out").join("TCS_2025-10-31.feather"));
        let leftovers: Vec<_> = fs::read_dir(emitter.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let df = IpcReader::new(File::open(&path).unwrap()).finish().unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["FileDate", "Date", "Time", "FUT_I", "2600CE_Close"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn emits_empty_table_with_header_only() {
        let dir = TempDir::new().unwrap();
        let emitter = Emitter::new(dir.path(), OutputFormat::Csv).unwrap();
        let table = reconcile(
            SymbolTable::empty("WIPRO"),
            &SchemaMode::Dynamic,
            MissingFill::Null,
            day(),
        );
        let path = emitter.emit(&table).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.trim_end(), "FileDate,Date,Time");
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("Feather".parse::<OutputFormat>().unwrap(), OutputFormat::Feather);
        assert_eq!("parquet".parse::<OutputFormat>().unwrap(), OutputFormat::Parquet);
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }
}
