//! Column naming for decoded instruments.

use crate::domain::{ColumnKey, FieldLabel, InstrumentDescriptor, OrdinalSeries};
use crate::schema::ReferenceSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How futures columns are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureNaming {
    /// `FUT_I`: only the closing field is kept.
    #[default]
    Bare,
    /// `FUT_I_{field}`: every field gets its own column.
    FieldQualified,
}

impl FutureNaming {
    /// Infer the naming from a reference schema: any `FUT_<roman>_<field>`
    /// column means futures are field-qualified.
    pub fn from_reference(schema: &ReferenceSchema) -> Self {
        let qualified = schema.columns().iter().any(|name| {
            name.strip_prefix("FUT_")
                .and_then(|rest| rest.split_once('_'))
                .is_some_and(|(roman, field)| {
                    OrdinalSeries::from_roman(roman).is_some() && !field.is_empty()
                })
        });
        if qualified {
            Self::FieldQualified
        } else {
            Self::Bare
        }
    }
}

/// Maps (descriptor, field) pairs to output columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNamer {
    futures: FutureNaming,
    closing_field: String,
}

impl ColumnNamer {
    pub fn new(futures: FutureNaming, closing_field: impl Into<String>) -> Self {
        Self {
            futures,
            closing_field: closing_field.into(),
        }
    }

    pub fn futures(&self) -> FutureNaming {
        self.futures
    }

    pub fn closing_field(&self) -> &str {
        &self.closing_field
    }

    /// Case-insensitive, so `close` and `Close` both count as closing.
    pub fn is_closing(&self, field: &str) -> bool {
        field.eq_ignore_ascii_case(&self.closing_field)
    }

    /// Column for one measured field of an instrument.
    ///
    /// `None` for unrecognized instruments, and for non-closing futures
    /// fields under bare naming.
    pub fn name_for(&self, descriptor: &InstrumentDescriptor, field: &FieldLabel) -> Option<ColumnKey> {
        match descriptor {
            InstrumentDescriptor::Option { strike, side, .. } => {
                Some(ColumnKey::option(*strike, *side, field.clone()))
            }
            InstrumentDescriptor::Future { series, .. } => match self.futures {
                FutureNaming::Bare if self.is_closing(field) => Some(ColumnKey::future(*series)),
                FutureNaming::Bare => None,
                FutureNaming::FieldQualified => Some(ColumnKey::future_field(*series, field.clone())),
            },
            InstrumentDescriptor::Unrecognized { .. } => None,
        }
    }
}

impl Default for ColumnNamer {
    fn default() -> Self {
        Self::new(FutureNaming::Bare, "Close")
    }
}

/// Field-independent part of a column name (`2600CE`, `FUT_I`).
///
/// Two distinct descriptors of the same underlying that share a prefix would
/// write into the same columns.
pub fn column_prefix(descriptor: &InstrumentDescriptor) -> Option<String> {
    match descriptor {
        InstrumentDescriptor::Option { strike, side, .. } => Some(format!("{strike}{side}")),
        InstrumentDescriptor::Future { series, .. } => Some(format!("FUT_{series}")),
        InstrumentDescriptor::Unrecognized { .. } => None,
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NamingError {
    #[error(
        "column collision for {symbol}: '{first}' and '{second}' both map to '{column}' \
         (set policy.expiry = \"nearest_only\" to keep one expiry per symbol)"
    )]
    Collision {
        symbol: String,
        column: String,
        first: String,
        second: String,
    },
}
