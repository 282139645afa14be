//! NFO ticker decoding.
//!
//! Two shapes are recognized after an optional exchange suffix (`.NFO`):
//! - futures: `<SYMBOL>-<ROMAN>`, e.g. `BAJAJ-AUTO-II`
//! - options: `<SYMBOL><DDMMMYY><STRIKE><CE|PE>`, e.g. `TCS25NOV252600CE`
//!
//! Decoding never fails: anything else becomes `Unrecognized`.

use crate::domain::{ExpiryToken, InstrumentDescriptor, OptionSide, OrdinalSeries};

const EXPIRY_LEN: usize = 7;
const SIDE_LEN: usize = 2;

/// Decode with the default `.NFO` suffix set.
pub fn decode(ticker: &str) -> InstrumentDescriptor {
    TickerDecoder::default().decode(ticker)
}

/// Ticker decoder parameterized by the exchange suffixes it strips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerDecoder {
    suffixes: Vec<String>,
}

impl TickerDecoder {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn decode(&self, ticker: &str) -> InstrumentDescriptor {
        let body = self.strip_suffix(ticker);
        decode_future(body)
            .or_else(|| decode_option(body))
            .unwrap_or_else(|| InstrumentDescriptor::Unrecognized {
                raw: ticker.to_string(),
            })
    }

    fn strip_suffix<'a>(&self, ticker: &'a str) -> &'a str {
        self.suffixes
            .iter()
            .find_map(|suffix| ticker.strip_suffix(suffix.as_str()))
            .unwrap_or(ticker)
    }
}

impl Default for TickerDecoder {
    fn default() -> Self {
        Self::new([".NFO"])
    }
}

fn decode_future(body: &str) -> Option<InstrumentDescriptor> {
    // Last hyphen: symbols such as BAJAJ-AUTO carry their own.
    let (symbol, roman) = body.rsplit_once('-')?;
    let series = OrdinalSeries::from_roman(roman)?;
    if !is_valid_symbol(symbol) {
        return None;
    }
    Some(InstrumentDescriptor::Future {
        underlying: symbol.to_string(),
        series,
    })
}

fn decode_option(body: &str) -> Option<InstrumentDescriptor> {
    if !body.is_ascii() || body.len() < 1 + EXPIRY_LEN + 1 + SIDE_LEN {
        return None;
    }
    let (rest, side_token) = body.split_at(body.len() - SIDE_LEN);
    let side = OptionSide::from_token(side_token)?;

    // Leftmost split where a real expiry date is followed by a numeric strike.
    for start in 1..=rest.len() - EXPIRY_LEN - 1 {
        let Some(expiry) = ExpiryToken::parse(&rest[start..start + EXPIRY_LEN]) else {
            continue;
        };
        let Some(strike) = parse_strike(&rest[start + EXPIRY_LEN..]) else {
            continue;
        };
        let symbol = &rest[..start];
        if !is_valid_symbol(symbol) {
            continue;
        }
        return Some(InstrumentDescriptor::Option {
            underlying: symbol.to_string(),
            expiry,
            strike,
            side,
        });
    }
    None
}

/// Parse `digits` or `digits.digits`, rounding to the nearest integer.
///
/// `"2600"` and `"2600.0"` both yield 2600.
fn parse_strike(text: &str) -> Option<u32> {
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (text, None),
    };
    let digits_only = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !frac.map_or(true, digits_only) {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    let rounded = value.round();
    if !rounded.is_finite() || rounded > f64::from(u32::MAX) {
        return None;
    }
    Some(rounded as u32)
}

fn is_valid_symbol(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && !symbol.ends_with('-')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '&' || c == '-')
}
