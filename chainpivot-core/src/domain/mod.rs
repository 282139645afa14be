//! Domain types shared by every stage of the pivot.

pub mod column;
pub mod instrument;
pub mod quote;

pub use column::ColumnKey;
pub use instrument::{ExpiryToken, InstrumentDescriptor, OptionSide, OrdinalSeries};
pub use quote::{FieldLabel, RawQuote};
