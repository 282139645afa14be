//! Symbol universe: the underlyings a run emits a file for.
//!
//! Every universe symbol gets an artifact, even when the input carried no
//! quotes for it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// NIFTY 50 constituents, as spelled in NFO tickers.
pub const NIFTY50: [&str; 50] = [
    "ADANIENT", "ADANIPORTS", "APOLLOHOSP", "ASIANPAINT", "AXISBANK", "BAJAJ-AUTO", "BAJAJFINSV",
    "BAJFINANCE", "BHARTIARTL", "BEL", "BPCL", "BRITANNIA", "CIPLA", "COALINDIA", "DIVISLAB",
    "DRREDDY", "EICHERMOT", "GRASIM", "HCLTECH", "HDFCBANK", "HDFCLIFE", "HEROMOTOCO", "HINDALCO",
    "HINDUNILVR", "ICICIBANK", "INDIGO", "INFY", "ITC", "JIOFIN", "JSWSTEEL", "KOTAKBANK", "LT",
    "M&M", "MARUTI", "NESTLEIND", "NTPC", "ONGC", "POWERGRID", "RELIANCE", "SBILIFE", "SBIN",
    "SUNPHARMA", "TATACONSUM", "TATAPOWER", "TATASTEEL", "TCS", "TITAN", "ULTRACEMCO", "UPL",
    "WIPRO",
];

/// Sorted, duplicate-free set of symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    symbols: BTreeSet<String>,
}

impl Universe {
    /// Blank entries are ignored; surrounding whitespace is trimmed.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|s| s.into().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn nifty50() -> Self {
        Self::new(NIFTY50)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Observed symbols outside the universe, sorted.
    pub fn outsiders<'a>(&self, observed: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let mut outside: Vec<&str> = observed
            .into_iter()
            .filter(|s| !self.contains(s))
            .collect();
        outside.sort_unstable();
        outside.dedup();
        outside
    }
}

impl<'a> FromIterator<&'a str> for Universe {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self::new(iter)
    }
}
