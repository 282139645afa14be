//! Long-to-wide pivot.
//!
//! One pass over the quotes, accumulating into a sparse map keyed by
//! symbol, then timestamp, then column. The engine owns everything it builds
//! and hands each finished `SymbolTable` out by value.

use crate::catalog::ContractCatalog;
use crate::domain::{ColumnKey, RawQuote};
use crate::naming::ColumnNamer;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{hash_map::Entry, BTreeMap, BTreeSet, HashMap};

/// Which value survives when one cell is written twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later quote in input order overwrites the cell.
    #[default]
    LastWins,
    /// The first value is kept; later writes are rejected.
    FirstWins,
}

/// One wide row: every column populated for a (symbol, timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct WideRecord {
    timestamp: NaiveDateTime,
    cells: HashMap<ColumnKey, f64>,
}

impl WideRecord {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            cells: HashMap::new(),
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn get(&self, key: &ColumnKey) -> Option<f64> {
        self.cells.get(key).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&ColumnKey, f64)> {
        self.cells.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn write(&mut self, key: ColumnKey, value: f64, policy: DuplicatePolicy, stats: &mut PivotStats) {
        match self.cells.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                stats.cells_written += 1;
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::LastWins => {
                    slot.insert(value);
                    stats.cells_overwritten += 1;
                }
                DuplicatePolicy::FirstWins => stats.cells_rejected += 1,
            },
        }
    }
}

/// Wide rows of one underlying, sorted by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    symbol: String,
    rows: Vec<WideRecord>,
    columns: BTreeSet<ColumnKey>,
}

impl SymbolTable {
    /// Table for a symbol that produced no recognized rows.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            rows: Vec::new(),
            columns: BTreeSet::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[WideRecord] {
        &self.rows
    }

    /// Every column populated at least once, in `ColumnKey` order.
    pub fn columns(&self) -> &BTreeSet<ColumnKey> {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at (timestamp, column), if populated.
    pub fn cell(&self, timestamp: NaiveDateTime, key: &ColumnKey) -> Option<f64> {
        self.rows
            .binary_search_by_key(&timestamp, WideRecord::timestamp)
            .ok()
            .and_then(|idx| self.rows[idx].get(key))
    }

    fn from_rows(symbol: String, rows: HashMap<NaiveDateTime, WideRecord>) -> Self {
        let mut rows: Vec<WideRecord> = rows.into_values().collect();
        rows.sort_unstable_by_key(WideRecord::timestamp);
        let columns = rows
            .iter()
            .flat_map(|row| row.cells.keys().cloned())
            .collect();
        Self {
            symbol,
            rows,
            columns,
        }
    }
}

/// Counters for one pivot pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotStats {
    pub quotes_seen: usize,
    pub quotes_pivoted: usize,
    /// Quotes whose ticker was unrecognized or superseded.
    pub quotes_skipped: usize,
    /// Field values with no column (non-closing futures fields under bare naming).
    pub fields_unnamed: usize,
    pub cells_written: usize,
    pub cells_overwritten: usize,
    pub cells_rejected: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PivotOutput {
    pub tables: BTreeMap<String, SymbolTable>,
    pub stats: PivotStats,
}

impl PivotOutput {
    /// Take a symbol's table out, or an empty one if it never appeared.
    pub fn take(&mut self, symbol: &str) -> SymbolTable {
        self.tables
            .remove(symbol)
            .unwrap_or_else(|| SymbolTable::empty(symbol))
    }
}

/// Pivot long-format quotes into one wide table per underlying.
///
/// Tickers the catalog does not resolve are skipped and counted. Repeated
/// writes to a cell follow `policy`.
pub fn pivot(
    quotes: &[RawQuote],
    catalog: &ContractCatalog,
    namer: &ColumnNamer,
    policy: DuplicatePolicy,
) -> PivotOutput {
    let mut stats = PivotStats::default();
    let mut acc: HashMap<String, HashMap<NaiveDateTime, WideRecord>> = HashMap::new();

    for quote in quotes {
        stats.quotes_seen += 1;
        let Some(descriptor) = catalog.resolve(&quote.ticker) else {
            stats.quotes_skipped += 1;
            continue;
        };
        let Some(symbol) = descriptor.underlying() else {
            stats.quotes_skipped += 1;
            continue;
        };
        stats.quotes_pivoted += 1;

        let record = acc
            .entry(symbol.to_owned())
            .or_default()
            .entry(quote.timestamp)
            .or_insert_with(|| WideRecord::new(quote.timestamp));

        for (field, value) in &quote.values {
            match namer.name_for(descriptor, field) {
                Some(key) => record.write(key, *value, policy, &mut stats),
                None => stats.fields_unnamed += 1,
            }
        }
    }

    let tables = acc
        .into_iter()
        .map(|(symbol, rows)| (symbol.clone(), SymbolTable::from_rows(symbol, rows)))
        .collect();

    PivotOutput { tables, stats }
}
