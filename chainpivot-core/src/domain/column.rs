use super::instrument::{OptionSide, OrdinalSeries};
use super::quote::FieldLabel;
use std::fmt;

/// Canonical wide-table column for one instrument and measured field.
///
/// The derived ordering is the dynamic-mode column order: futures before
/// options, futures by series then field, options by strike, side, field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    /// `FUT_{roman}` when `field` is `None`, `FUT_{roman}_{field}` otherwise.
    Future {
        series: OrdinalSeries,
        field: Option<FieldLabel>,
    },
    /// `{strike}{CE|PE}_{field}`
    Option {
        strike: u32,
        side: OptionSide,
        field: FieldLabel,
    },
}

impl ColumnKey {
    pub fn future(series: OrdinalSeries) -> Self {
        Self::Future {
            series,
            field: None,
        }
    }

    pub fn future_field(series: OrdinalSeries, field: impl Into<FieldLabel>) -> Self {
        Self::Future {
            series,
            field: Some(field.into()),
        }
    }

    pub fn option(strike: u32, side: OptionSide, field: impl Into<FieldLabel>) -> Self {
        Self::Option {
            strike,
            side,
            field: field.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Future { field, .. } => field.as_deref(),
            Self::Option { field, .. } => Some(field),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Future { series, field: None } => write!(f, "FUT_{series}"),
            Self::Future {
                series,
                field: Some(field),
            } => write!(f, "FUT_{series}_{field}"),
            Self::Option {
                strike,
                side,
                field,
            } => write!(f, "{strike}{side}_{field}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: u8) -> OrdinalSeries {
        OrdinalSeries::new(n).unwrap()
    }

    #[test]
    fn display_forms() {
        assert_eq!(ColumnKey::future(series(1)).to_string(), "FUT_I");
        assert_eq!(
            ColumnKey::future_field(series(2), "Close").to_string(),
            "FUT_II_Close"
        );
        assert_eq!(
            ColumnKey::option(2600, OptionSide::Call, "close").to_string(),
            "2600CE_close"
        );
        assert_eq!(
            ColumnKey::option(95, OptionSide::Put, "Open_Interest").to_string(),
            "95PE_Open_Interest"
        );
    }

    #[test]
    fn ordering_puts_futures_first_then_strike_then_side() {
        let mut keys = vec![
            ColumnKey::option(2700, OptionSide::Call, "Close"),
            ColumnKey::option(2600, OptionSide::Put, "Close"),
            ColumnKey::future(series(2)),
            ColumnKey::option(2600, OptionSide::Call, "Open"),
            ColumnKey::option(2600, OptionSide::Call, "Close"),
            ColumnKey::future(series(1)),
        ];
        keys.sort();
        let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "FUT_I",
                "FUT_II",
                "2600CE_Close",
                "2600CE_Open",
                "2600PE_Close",
                "2700CE_Close",
            ]
        );
    }

    #[test]
    fn strike_renders_without_padding() {
        // 95 must not sort or render like "095"
        let low = ColumnKey::option(95, OptionSide::Call, "Close");
        let high = ColumnKey::option(1000, OptionSide::Call, "Close");
        assert!(low < high);
        assert_eq!(low.to_string(), "95CE_Close");
    }
}
