//! Reference schema loading for strict mode.

use chainpivot_core::{ReferenceError, ReferenceSchema};
use polars::prelude::{IpcReader, ParquetReader, SerReader};
use std::fs::File;
use std::path::Path;

/// On-disk layouts a reference artifact may use, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceFormat {
    Ipc,
    Parquet,
    Csv,
}

impl ReferenceFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "feather" | "arrow" | "ipc" => Some(Self::Ipc),
            "parquet" => Some(Self::Parquet),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Read the ordered column names of a sample artifact and validate them.
pub fn load_reference(path: &Path) -> Result<ReferenceSchema, ReferenceError> {
    let names = read_column_names(path)?;
    ReferenceSchema::new(names)
}

pub fn read_column_names(path: &Path) -> Result<Vec<String>, ReferenceError> {
    let format = ReferenceFormat::from_path(path)
        .ok_or_else(|| ReferenceError::UnsupportedFormat(path.to_path_buf()))?;
    let unreadable = |reason: String| ReferenceError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };

    match format {
        ReferenceFormat::Csv => {
            let mut rdr = csv::Reader::from_path(path).map_err(|e| unreadable(e.to_string()))?;
            let headers = rdr.headers().map_err(|e| unreadable(e.to_string()))?;
            Ok(headers.iter().map(str::to_string).collect())
        }
        ReferenceFormat::Ipc | ReferenceFormat::Parquet => {
            let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
            let df = match format {
                ReferenceFormat::Ipc => IpcReader::new(file).finish(),
                _ => ParquetReader::new(file).finish(),
            }
            .map_err(|e| unreadable(e.to_string()))?;
            Ok(df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame, IpcWriter, SerWriter};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_reference_feather(path: &Path, names: &[&str]) {
        let columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new((*n).into(), vec![1.0_f64]))
            .collect();
        let mut df = DataFrame::new(columns).unwrap();
        let mut file = File::create(path).unwrap();
        IpcWriter::new(&mut file).finish(&mut df).unwrap();
    }

    #[test]
    fn reads_feather_columns_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TCS_2025-10-30.feather");
        write_reference_feather(&path, &["FileDate", "Time", "FUT_I", "2600CE_Close"]);

        let schema = load_reference(&path).unwrap();
        assert_eq!(schema.columns(), &["FileDate", "Time", "FUT_I", "2600CE_Close"]);
    }

    #[test]
    fn reads_csv_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "Date,Time,FUT_I,2600PE_Close").unwrap();
        writeln!(f, "2025-10-30,09:15:59,1,2").unwrap();

        let schema = load_reference(&path).unwrap();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.position("2600PE_Close"), Some(3));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = load_reference(Path::new("/nonexistent/ref.feather")).unwrap_err();
        assert!(matches!(err, ReferenceError::Unreadable { .. }));
    }

    #[test]
    fn corrupt_feather_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.feather");
        std::fs::write(&path, b"not arrow").unwrap();
        assert!(matches!(
            load_reference(&path),
            Err(ReferenceError::Unreadable { .. })
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            load_reference(Path::new("ref.xlsx")),
            Err(ReferenceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn duplicate_csv_header_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.csv");
        std::fs::write(&path, "Time,FUT_I,FUT_I\n").unwrap();
        assert!(matches!(
            load_reference(&path),
            Err(ReferenceError::DuplicateColumn(c)) if c == "FUT_I"
        ));
    }
}
