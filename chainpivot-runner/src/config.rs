//! TOML run configuration.
//!
//! Every section is optional and defaulted, so an empty file is a valid
//! dynamic-mode config once an input path is supplied (usually from the CLI).
//!
//! ```toml
//! [input]
//! path = "nfo_2025-10-31.csv"
//!
//! [schema]
//! mode = "strict"
//! reference = "sample/TCS_2025-10-30.feather"
//!
//! [policy]
//! duplicates = "last_wins"
//! expiry = "nearest_only"
//!
//! [output]
//! dir = "out"
//! format = "feather"
//! ```

use chainpivot_core::{DuplicatePolicy, ExpiryPolicy, FutureNaming, MissingFill};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::emit::OutputFormat;
use crate::universe::Universe;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no input CSV given (set [input] path or pass --input)")]
    MissingInput,

    #[error("strict mode needs a reference artifact (set [schema] reference or pass --reference)")]
    MissingReference,

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PivotConfig {
    pub input: InputConfig,
    pub schema: SchemaConfig,
    pub policy: PolicyConfig,
    pub universe: UniverseConfig,
    pub output: OutputConfig,
    pub decoder: DecoderConfig,
}

impl PivotConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check cross-field constraints. Called by the runner before any I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.schema.mode == ModeSetting::Strict && self.schema.reference.is_none() {
            return Err(ConfigError::MissingReference);
        }
        if self.input.fields.is_empty() {
            return Err(ConfigError::Invalid("[input] fields is empty".into()));
        }
        for (i, field) in self.input.fields.iter().enumerate() {
            if field.label.trim().is_empty() || field.header.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "[input] fields[{i}] has a blank header or label"
                )));
            }
        }
        let mut headers = HashSet::new();
        let mut labels = HashSet::new();
        for field in &self.input.fields {
            if !headers.insert(field.header.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "[input] fields maps header '{}' more than once",
                    field.header
                )));
            }
            // Two headers under one label would merge into the same columns.
            if !labels.insert(field.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "[input] fields uses label '{}' more than once",
                    field.label
                )));
            }
        }
        let closing = self
            .input
            .fields
            .iter()
            .filter(|f| f.label.eq_ignore_ascii_case(&self.schema.closing_field))
            .count();
        match closing {
            0 => {
                return Err(ConfigError::Invalid(format!(
                    "closing field '{}' is not one of the configured field labels",
                    self.schema.closing_field
                )))
            }
            1 => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "closing field '{}' matches {closing} field labels (compared ignoring case)",
                    self.schema.closing_field
                )))
            }
        }
        if !self.universe.observed && self.universe.symbols.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Invalid("[universe] symbols is empty".into()));
        }
        Ok(())
    }

    /// Symbols to emit, or `None` when the universe is whatever was observed.
    pub fn universe(&self) -> Option<Universe> {
        if self.universe.observed {
            return None;
        }
        Some(match &self.universe.symbols {
            Some(symbols) => Universe::new(symbols.iter().cloned()),
            None => Universe::nifty50(),
        })
    }
}

/// One measured field: the input CSV header and the label used in column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub header: String,
    pub label: String,
}

impl FieldMapping {
    pub fn new(header: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub path: PathBuf,
    pub ticker_column: String,
    pub date_column: String,
    pub time_column: String,
    pub date_format: String,
    pub time_format: String,
    pub fields: Vec<FieldMapping>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            ticker_column: "Ticker".into(),
            date_column: "Date".into(),
            time_column: "Time".into(),
            date_format: "%d/%m/%Y".into(),
            time_format: "%H:%M:%S".into(),
            fields: vec![
                FieldMapping::new("Open", "Open"),
                FieldMapping::new("High", "High"),
                FieldMapping::new("Low", "Low"),
                FieldMapping::new("Close", "Close"),
                FieldMapping::new("Volume", "Volume"),
                FieldMapping::new("Open Interest", "Open_Interest"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    Strict,
    #[default]
    Dynamic,
}

impl std::str::FromStr for ModeSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(ConfigError::Invalid(format!(
                "unknown mode '{other}' (expected strict or dynamic)"
            ))),
        }
    }
}

/// Futures naming as configured; `Auto` defers to the reference schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuturesSetting {
    #[default]
    Auto,
    Bare,
    FieldQualified,
}

impl FuturesSetting {
    pub fn explicit(self) -> Option<FutureNaming> {
        match self {
            Self::Auto => None,
            Self::Bare => Some(FutureNaming::Bare),
            Self::FieldQualified => Some(FutureNaming::FieldQualified),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub mode: ModeSetting,
    pub reference: Option<PathBuf>,
    pub futures: FuturesSetting,
    /// Field label kept for futures under bare naming.
    pub closing_field: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            mode: ModeSetting::default(),
            reference: None,
            futures: FuturesSetting::default(),
            closing_field: "Close".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub duplicates: DuplicatePolicy,
    pub missing: MissingFill,
    pub expiry: ExpiryPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniverseConfig {
    /// Explicit symbol list. `None` means the NIFTY 50 default.
    pub symbols: Option<Vec<String>>,
    /// Emit every symbol seen in the input instead of a fixed list.
    pub observed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
    pub parallel: bool,
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: OutputFormat::default(),
            parallel: true,
            manifest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    pub suffixes: Vec<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            suffixes: vec![".NFO".into()],
        }
    }
}
