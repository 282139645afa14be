//! Post-run check of an output directory.
//!
//! Every expected symbol must have an artifact for the date. In strict mode
//! each artifact must also carry exactly the reference columns, in order.

use chainpivot_core::ReferenceSchema;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::emit::{artifact_name, OutputFormat};
use crate::reference::read_column_names;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    Missing,
    Unreadable { reason: String },
    /// Column list differs from the reference.
    Columns {
        expected: usize,
        found: usize,
        /// First position where the names differ, if any.
        first_difference: Option<usize>,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("artifact missing"),
            Self::Unreadable { reason } => write!(f, "unreadable: {reason}"),
            Self::Columns {
                expected,
                found,
                first_difference,
            } => {
                write!(f, "expected {expected} columns, found {found}")?;
                if let Some(pos) = first_difference {
                    write!(f, " (first difference at position {pos})")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactIssue {
    pub symbol: String,
    pub problem: Problem,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub date: NaiveDate,
    pub checked: usize,
    pub issues: Vec<ArtifactIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn validate_outputs<'a>(
    dir: &Path,
    date: NaiveDate,
    symbols: impl IntoIterator<Item = &'a str>,
    format: OutputFormat,
    reference: Option<&ReferenceSchema>,
) -> ValidationReport {
    let mut checked = 0;
    let mut issues = Vec::new();

    for symbol in symbols {
        checked += 1;
        if let Some(problem) = check_artifact(dir, symbol, date, format, reference) {
            issues.push(ArtifactIssue {
                symbol: symbol.to_string(),
                problem,
            });
        }
    }

    ValidationReport {
        date,
        checked,
        issues,
    }
}

fn check_artifact(
    dir: &Path,
    symbol: &str,
    date: NaiveDate,
    format: OutputFormat,
    reference: Option<&ReferenceSchema>,
) -> Option<Problem> {
    let path = dir.join(artifact_name(symbol, date, format));
    if !path.is_file() {
        return Some(Problem::Missing);
    }
    let names = match read_column_names(&path) {
        Ok(names) => names,
        Err(e) => {
            return Some(Problem::Unreadable {
                reason: e.to_string(),
            })
        }
    };
    let reference = reference?;
    if names.as_slice() == reference.columns() {
        return None;
    }
    Some(Problem::Columns {
        expected: reference.len(),
        found: names.len(),
        first_difference: names
            .iter()
            .zip(reference.columns())
            .position(|(a, b)| a != b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
    }

    fn reference() -> ReferenceSchema {
        ReferenceSchema::new(vec!["Time".into(), "FUT_I".into(), "2600CE_Close".into()]).unwrap()
    }

    #[test]
    fn reports_missing_and_mismatched_artifacts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("TCS_2025-10-31.csv"), "Time,FUT_I,2600CE_Close\n").unwrap();
        std::fs::write(dir.path().join("INFY_2025-10-31.csv"), "Time,2600CE_Close,FUT_I\n").unwrap();
        std::fs::write(dir.path().join("LT_2025-10-31.csv"), "Time,FUT_I\n").unwrap();

        let reference = reference();
        let report = validate_outputs(
            dir.path(),
            day(),
            ["TCS", "INFY", "LT", "WIPRO"],
            OutputFormat::Csv,
            Some(&reference),
        );

        assert_eq!(report.checked, 4);
        assert!(!report.is_ok());
        let by_symbol = |s: &str| {
            report
                .issues
                .iter()
                .find(|i| i.symbol == s)
                .map(|i| i.problem.clone())
        };
        assert_eq!(by_symbol("TCS"), None);
        assert_eq!(
            by_symbol("INFY"),
            Some(Problem::Columns {
                expected: 3,
                found: 3,
                first_difference: Some(1)
            })
        );
        assert_eq!(
            by_symbol("LT"),
            Some(Problem::Columns {
                expected: 3,
                found: 2,
                first_difference: None
            })
        );
        assert_eq!(by_symbol("WIPRO"), Some(Problem::Missing));
    }

    #[test]
    fn dynamic_only_checks_presence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("TCS_2025-10-31.csv"), "FileDate,Date,Time\n").unwrap();
        let report = validate_outputs(dir.path(), day(), ["TCS"], OutputFormat::Csv, None);
        assert!(report.is_ok());
    }

    #[test]
    fn problem_messages() {
        let p = Problem::Columns {
            expected: 3,
            found: 2,
            first_difference: Some(1),
        };
        assert_eq!(
            p.to_string(),
            "expected 3 columns, found 2 (first difference at position 1)"
        );
    }
}
