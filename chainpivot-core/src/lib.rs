//! chainpivot core: ticker decoding, column naming, pivoting and schema reconciliation.
//!
//! This crate holds the whole reshaping logic and no file I/O:
//! - Domain types (quotes, instrument descriptors, column keys)
//! - Ticker decoder for NFO option and futures identifiers
//! - Column namer and the per-run contract catalog (collision checks)
//! - Long-to-wide pivot engine keyed by (symbol, timestamp, column)
//! - Schema reconciler for strict (reference) and dynamic column sets

pub mod catalog;
pub mod decode;
pub mod domain;
pub mod naming;
pub mod pivot;
pub mod reconcile;
pub mod schema;

pub use catalog::{CatalogEntry, ContractCatalog, ExpiryPolicy, SymbolContracts};
pub use decode::{decode, TickerDecoder};
pub use domain::{
    ColumnKey, ExpiryToken, FieldLabel, InstrumentDescriptor, OptionSide, OrdinalSeries, RawQuote,
};
pub use naming::{ColumnNamer, FutureNaming, NamingError};
pub use pivot::{pivot, DuplicatePolicy, PivotOutput, PivotStats, SymbolTable, WideRecord};
pub use reconcile::{
    reconcile, ColumnData, MissingFill, OutputColumn, ReconciledTable, SchemaMode,
};
pub use schema::{IdentityColumn, ReferenceError, ReferenceSchema};
