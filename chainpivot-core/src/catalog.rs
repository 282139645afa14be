//! Per-run catalog of every distinct ticker in the input.
//!
//! Each distinct ticker is decoded exactly once. The catalog also enforces
//! the naming collision rule before any row is pivoted: two different
//! contracts of one underlying may not share a column prefix.

use crate::decode::TickerDecoder;
use crate::domain::InstrumentDescriptor;
use crate::naming::{column_prefix, NamingError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What to do when an underlying has options on more than one expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Expiries that collide on a column name abort the run.
    #[default]
    Reject,
    /// Keep only the nearest expiry per underlying; later ones are superseded.
    NearestOnly,
}

/// Resolution of one distinct ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    Active(InstrumentDescriptor),
    Unrecognized,
    /// Option on a later expiry, dropped under `ExpiryPolicy::NearestOnly`.
    Superseded(InstrumentDescriptor),
}

/// Contract counts for one underlying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolContracts {
    pub futures: usize,
    pub options: usize,
    pub superseded: usize,
    /// Expiry kept for options, if any.
    pub expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ContractCatalog {
    entries: HashMap<String, CatalogEntry>,
    symbols: BTreeMap<String, SymbolContracts>,
    unrecognized: Vec<String>,
}

impl ContractCatalog {
    pub fn build<'a, I>(
        tickers: I,
        decoder: &TickerDecoder,
        policy: ExpiryPolicy,
    ) -> Result<Self, NamingError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = tickers.into_iter().collect();

        let mut decoded: Vec<(&str, InstrumentDescriptor)> = Vec::new();
        let mut entries = HashMap::with_capacity(distinct.len());
        let mut unrecognized = Vec::new();
        for ticker in distinct {
            match decoder.decode(ticker) {
                InstrumentDescriptor::Unrecognized { .. } => {
                    entries.insert(ticker.to_string(), CatalogEntry::Unrecognized);
                    unrecognized.push(ticker.to_string());
                }
                descriptor => decoded.push((ticker, descriptor)),
            }
        }

        let nearest = match policy {
            ExpiryPolicy::Reject => HashMap::new(),
            ExpiryPolicy::NearestOnly => nearest_expiries(&decoded),
        };

        let mut symbols: BTreeMap<String, SymbolContracts> = BTreeMap::new();
        // (symbol, prefix) -> (first ticker, descriptor)
        let mut claimed: HashMap<(String, String), (&str, InstrumentDescriptor)> = HashMap::new();

        for (ticker, descriptor) in decoded {
            let Some(symbol) = descriptor.underlying().map(str::to_string) else {
                continue;
            };
            let contracts = symbols.entry(symbol.clone()).or_default();

            if let Some(expiry) = descriptor.expiry() {
                let keep = nearest.get(symbol.as_str()).map_or(true, |d| *d == expiry.date());
                if !keep {
                    contracts.superseded += 1;
                    entries.insert(ticker.to_string(), CatalogEntry::Superseded(descriptor));
                    continue;
                }
            }

            if let Some(prefix) = column_prefix(&descriptor) {
                let key = (symbol.clone(), prefix);
                match claimed.get(&key) {
                    Some((first, existing)) if *existing != descriptor => {
                        return Err(NamingError::Collision {
                            symbol,
                            column: key.1,
                            first: first.to_string(),
                            second: ticker.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        match &descriptor {
                            InstrumentDescriptor::Option { expiry, .. } => {
                                contracts.options += 1;
                                contracts.expiry = Some(expiry.date());
                            }
                            InstrumentDescriptor::Future { .. } => contracts.futures += 1,
                            InstrumentDescriptor::Unrecognized { .. } => {}
                        }
                        claimed.insert(key, (ticker, descriptor.clone()));
                    }
                }
            }

            entries.insert(ticker.to_string(), CatalogEntry::Active(descriptor));
        }

        Ok(Self {
            entries,
            symbols,
            unrecognized,
        })
    }

    /// Descriptor to pivot a ticker under, or `None` if it is skipped.
    pub fn resolve(&self, ticker: &str) -> Option<&InstrumentDescriptor> {
        match self.entries.get(ticker)? {
            CatalogEntry::Active(descriptor) => Some(descriptor),
            CatalogEntry::Unrecognized | CatalogEntry::Superseded(_) => None,
        }
    }

    pub fn entry(&self, ticker: &str) -> Option<&CatalogEntry> {
        self.entries.get(ticker)
    }

    /// Underlyings with at least one decoded contract, sorted.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn contracts(&self, symbol: &str) -> Option<&SymbolContracts> {
        self.symbols.get(symbol)
    }

    /// Distinct tickers that matched no pattern, sorted.
    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn superseded_count(&self) -> usize {
        self.symbols.values().map(|c| c.superseded).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn nearest_expiries(decoded: &[(&str, InstrumentDescriptor)]) -> HashMap<String, NaiveDate> {
    let mut nearest: HashMap<String, NaiveDate> = HashMap::new();
    for (_, descriptor) in decoded {
        if let (Some(symbol), Some(expiry)) = (descriptor.underlying(), descriptor.expiry()) {
            nearest
                .entry(symbol.to_string())
                .and_modify(|d| *d = (*d).min(expiry.date()))
                .or_insert(expiry.date());
        }
    }
    nearest
}
