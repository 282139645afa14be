use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option side as encoded in NFO tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionSide {
    /// `CE`
    Call,
    /// `PE`
    Put,
}

impl OptionSide {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "CE" => Some(Self::Call),
            "PE" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

const ROMAN: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

/// Continuous futures series: `I` is the near month, `II` the next, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrdinalSeries(u8);

impl OrdinalSeries {
    pub const NEAR: Self = Self(1);

    /// 1-based ordinal. Returns `None` outside `1..=12`.
    pub fn new(ordinal: u8) -> Option<Self> {
        (1..=ROMAN.len() as u8).contains(&ordinal).then_some(Self(ordinal))
    }

    /// Parse a canonical upper-case roman numeral (`I` through `XII`).
    pub fn from_roman(token: &str) -> Option<Self> {
        ROMAN
            .iter()
            .position(|r| *r == token)
            .map(|idx| Self(idx as u8 + 1))
    }

    pub fn ordinal(self) -> u8 {
        self.0
    }

    pub fn roman(self) -> &'static str {
        ROMAN[self.0 as usize - 1]
    }
}

impl fmt::Display for OrdinalSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.roman())
    }
}

/// Option expiry in the `DDMMMYY` form used by NFO tickers (`25NOV25`).
///
/// Only tokens naming a real calendar date are accepted. The month is
/// normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpiryToken {
    text: String,
    date: NaiveDate,
}

impl ExpiryToken {
    pub fn parse(token: &str) -> Option<Self> {
        let bytes = token.as_bytes();
        if bytes.len() != 7 {
            return None;
        }
        let shape_ok = bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[2..5].iter().all(u8::is_ascii_alphabetic)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return None;
        }
        let text = token.to_ascii_uppercase();
        let date = NaiveDate::parse_from_str(&text, "%d%b%y").ok()?;
        Some(Self { text, date })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for ExpiryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Decoded identity of an instrument ticker.
///
/// The set of kinds is closed: adding one forces every `match` in the
/// namer and catalog to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentDescriptor {
    Option {
        underlying: String,
        expiry: ExpiryToken,
        strike: u32,
        side: OptionSide,
    },
    Future {
        underlying: String,
        series: OrdinalSeries,
    },
    /// Ticker matched no known pattern. Carries the original string.
    Unrecognized { raw: String },
}

impl InstrumentDescriptor {
    pub fn underlying(&self) -> Option<&str> {
        match self {
            Self::Option { underlying, .. } | Self::Future { underlying, .. } => Some(underlying),
            Self::Unrecognized { .. } => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }

    pub fn expiry(&self) -> Option<&ExpiryToken> {
        match self {
            Self::Option { expiry, .. } => Some(expiry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roman_series_roundtrip() {
        for ordinal in 1..=12u8 {
            let series = OrdinalSeries::new(ordinal).unwrap();
            assert_eq!(OrdinalSeries::from_roman(series.roman()), Some(series));
        }
        assert_eq!(OrdinalSeries::from_roman("III").unwrap().ordinal(), 3);
        assert!(OrdinalSeries::new(0).is_none());
        assert!(OrdinalSeries::new(13).is_none());
    }

    #[test]
    fn roman_parse_rejects_non_canonical() {
        assert!(OrdinalSeries::from_roman("IIII").is_none());
        assert!(OrdinalSeries::from_roman("ii").is_none());
        assert!(OrdinalSeries::from_roman("").is_none());
    }

    #[test]
    fn expiry_token_parses_real_dates() {
        let e = ExpiryToken::parse("25NOV25").unwrap();
        assert_eq!(e.date(), NaiveDate::from_ymd_opt(2025, 11, 25).unwrap());
        assert_eq!(e.as_str(), "25NOV25");

        let lower = ExpiryToken::parse("25nov25").unwrap();
        assert_eq!(lower, e);
    }

    #[test]
    fn expiry_token_rejects_bad_shapes() {
        assert!(ExpiryToken::parse("31FEB25").is_none());
        assert!(ExpiryToken::parse("25XYZ25").is_none());
        assert!(ExpiryToken::parse("2NOV25").is_none());
        assert!(ExpiryToken::parse("25NOV2025").is_none());
    }

    #[test]
    fn side_tokens() {
        assert_eq!(OptionSide::from_token("CE"), Some(OptionSide::Call));
        assert_eq!(OptionSide::from_token("PE"), Some(OptionSide::Put));
        assert_eq!(OptionSide::from_token("ce"), None);
        assert!(OptionSide::Call < OptionSide::Put);
    }
}
