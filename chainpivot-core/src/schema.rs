//! Reference schema for strict mode and the structural identity columns.

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Ordered column set of a sample wide-format artifact (strict mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSchema {
    columns: Vec<String>,
}

impl ReferenceSchema {
    /// Validate and wrap a column list. Empty lists and repeated names are rejected.
    pub fn new(columns: Vec<String>) -> Result<Self, ReferenceError> {
        if columns.is_empty() {
            return Err(ReferenceError::Empty);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if name.trim().is_empty() {
                return Err(ReferenceError::BlankColumn);
            }
            if !seen.insert(name.as_str()) {
                return Err(ReferenceError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Columns filled from the row structure rather than from quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityColumn {
    /// Full timestamp of the row.
    Datetime,
    /// Date of the input file, constant for the whole table.
    FileDate,
    /// Same value as `FileDate`, on every row.
    Date,
    /// `HH:MM:SS` text of the row.
    Time,
    /// Underlying symbol, constant for the whole table.
    Symbol,
}

impl IdentityColumn {
    pub const ALL: [Self; 5] = [
        Self::Datetime,
        Self::FileDate,
        Self::Date,
        Self::Time,
        Self::Symbol,
    ];

    /// Identity core of dynamic-mode tables.
    pub const DYNAMIC: [Self; 3] = [Self::FileDate, Self::Date, Self::Time];

    pub fn name(self) -> &'static str {
        match self {
            Self::Datetime => "Datetime",
            Self::FileDate => "FileDate",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Symbol => "Symbol",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference schema has no columns")]
    Empty,

    #[error("reference schema contains a blank column name")]
    BlankColumn,

    #[error("reference schema repeats column '{0}'")]
    DuplicateColumn(String),

    #[error("cannot read reference artifact {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("unsupported reference format: {0} (expected .feather, .arrow, .ipc, .parquet or .csv)")]
    UnsupportedFormat(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_order() {
        let schema = ReferenceSchema::new(cols(&["FileDate", "Date", "Time", "FUT_I_Close"])).unwrap();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.position("Time"), Some(2));
        assert!(schema.contains("FUT_I_Close"));
        assert!(!schema.contains("FUT_II_Close"));
    }

    #[test]
    fn rejects_malformed_schemas() {
        assert!(matches!(ReferenceSchema::new(vec![]), Err(ReferenceError::Empty)));
        assert!(matches!(
            ReferenceSchema::new(cols(&["Time", "Time"])),
            Err(ReferenceError::DuplicateColumn(c)) if c == "Time"
        ));
        assert!(matches!(
            ReferenceSchema::new(cols(&["Time", "  "])),
            Err(ReferenceError::BlankColumn)
        ));
    }

    #[test]
    fn identity_names_roundtrip() {
        for col in IdentityColumn::ALL {
            assert_eq!(IdentityColumn::from_name(col.name()), Some(col));
        }
        assert_eq!(IdentityColumn::from_name("2600CE_Close"), None);
    }
}
