//! Shapes a pivoted `SymbolTable` into its final column layout.
//!
//! Strict mode follows a reference schema column for column. Dynamic mode
//! emits the identity core followed by every observed column.

use crate::domain::ColumnKey;
use crate::pivot::SymbolTable;
use crate::schema::{IdentityColumn, ReferenceSchema};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaMode {
    Strict(ReferenceSchema),
    Dynamic,
}

impl SchemaMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strict(_) => "strict",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Marker written into value cells nobody populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFill {
    #[default]
    Null,
    Zero,
}

impl MissingFill {
    fn marker(self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Zero => Some(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Datetime(Vec<NaiveDateTime>),
    Date(Vec<NaiveDate>),
    Text(Vec<String>),
    Values(Vec<Option<f64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Datetime(v) => v.len(),
            Self::Date(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub data: ColumnData,
}

/// A symbol's table in its final layout, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledTable {
    symbol: String,
    file_date: NaiveDate,
    columns: Vec<OutputColumn>,
    height: usize,
    populated: usize,
    value_columns: usize,
    dropped_columns: Vec<String>,
}

impl ReconciledTable {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn file_date(&self) -> NaiveDate {
        self.file_date
    }

    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<OutputColumn> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&OutputColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Observed columns the reference had no place for (strict mode only).
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Share of value cells populated from quotes, before any fill.
    ///
    /// Identity columns are not counted. An empty table has density 0.
    pub fn density(&self) -> f64 {
        let total = self.value_columns * self.height;
        if total == 0 {
            0.0
        } else {
            self.populated as f64 / total as f64
        }
    }
}

/// Lay a pivoted table out according to `mode`.
pub fn reconcile(
    table: SymbolTable,
    mode: &SchemaMode,
    fill: MissingFill,
    file_date: NaiveDate,
) -> ReconciledTable {
    let mut builder = Builder::new(&table, fill, file_date);

    let dropped_columns = match mode {
        SchemaMode::Strict(reference) => {
            let by_name: HashMap<String, &ColumnKey> =
                table.columns().iter().map(|k| (k.to_string(), k)).collect();
            for name in reference.columns() {
                match IdentityColumn::from_name(name) {
                    Some(identity) => builder.push_identity(identity, name),
                    None => builder.push_values(name, by_name.get(name).copied()),
                }
            }
            let mut dropped: Vec<String> = by_name
                .into_keys()
                .filter(|name| !reference.contains(name))
                .collect();
            dropped.sort();
            dropped
        }
        SchemaMode::Dynamic => {
            for identity in IdentityColumn::DYNAMIC {
                builder.push_identity(identity, identity.name());
            }
            for key in table.columns() {
                builder.push_values(&key.to_string(), Some(key));
            }
            Vec::new()
        }
    };

    ReconciledTable {
        symbol: table.symbol().to_string(),
        file_date,
        height: table.height(),
        populated: builder.populated,
        value_columns: builder.value_columns,
        columns: builder.columns,
        dropped_columns,
    }
}

struct Builder<'a> {
    table: &'a SymbolTable,
    fill: MissingFill,
    file_date: NaiveDate,
    columns: Vec<OutputColumn>,
    populated: usize,
    value_columns: usize,
}

impl<'a> Builder<'a> {
    fn new(table: &'a SymbolTable, fill: MissingFill, file_date: NaiveDate) -> Self {
        Self {
            table,
            fill,
            file_date,
            columns: Vec::new(),
            populated: 0,
            value_columns: 0,
        }
    }

    fn push_identity(&mut self, identity: IdentityColumn, name: &str) {
        let rows = self.table.rows();
        let data = match identity {
            IdentityColumn::Datetime => {
                ColumnData::Datetime(rows.iter().map(|r| r.timestamp()).collect())
            }
            // Date carries the file date too, even on off-date rows.
            IdentityColumn::FileDate | IdentityColumn::Date => {
                ColumnData::Date(vec![self.file_date; rows.len()])
            }
            IdentityColumn::Time => ColumnData::Text(
                rows.iter()
                    .map(|r| r.timestamp().format(TIME_FORMAT).to_string())
                    .collect(),
            ),
            IdentityColumn::Symbol => {
                ColumnData::Text(vec![self.table.symbol().to_string(); rows.len()])
            }
        };
        self.columns.push(OutputColumn {
            name: name.to_string(),
            data,
        });
    }

    fn push_values(&mut self, name: &str, key: Option<&ColumnKey>) {
        let marker = self.fill.marker();
        let mut populated = 0;
        let values: Vec<Option<f64>> = match key {
            Some(key) => self
                .table
                .rows()
                .iter()
                .map(|row| match row.get(key) {
                    Some(v) => {
                        populated += 1;
                        Some(v)
                    }
                    None => marker,
                })
                .collect(),
            None => vec![marker; self.table.height()],
        };
        self.populated += populated;
        self.value_columns += 1;
        self.columns.push(OutputColumn {
            name: name.to_string(),
            data: ColumnData::Values(values),
        });
    }
}
