//! Equity filter and normalizer
//!
//! Restricts the raw union to equity instruments, types the `Date` column and
//! coerces every ownership column to a number. Bad cells are data-quality
//! issues, not errors: rows with unparseable dates or no code are dropped and
//! non-numeric holdings become zero.

use crate::error::{OwnershipError, Result};
use crate::loader::{
    LoaderConfig, RawTable, CODE_COLUMN, DATE_COLUMN, SOURCE_FILE_COLUMN, TYPE_COLUMN,
};
use crate::types::{Code, ReportDate};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Columns never coerced to numbers
pub const IDENTIFIER_COLUMNS: [&str; 4] =
    [DATE_COLUMN, CODE_COLUMN, TYPE_COLUMN, SOURCE_FILE_COLUMN];

/// An equity row with a parsed date and numeric holdings
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub date: ReportDate,
    pub code: Code,
    pub instrument_type: String,
    pub source_file: String,
    values: HashMap<String, f64>,
}

impl CleanRecord {
    /// Numeric value of a column; absent columns read as zero
    pub fn value(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }

    pub fn has_value(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }
}

/// Row accounting for one normalisation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows whose `Type` is not an equity type (bonds, warrants, blanks)
    pub dropped_non_equity: usize,
    /// Equity rows with an unparseable date or a missing code
    pub dropped_invalid: usize,
}

/// Cleaned wide table, ready for reshaping
#[derive(Debug, Clone, Default)]
pub struct CleanTable {
    numeric_columns: Vec<String>,
    records: Vec<CleanRecord>,
    stats: NormalizeStats,
}

impl CleanTable {
    /// Every non-identifier column present in the input, in input order
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[CleanRecord] {
        &self.records
    }

    pub fn stats(&self) -> NormalizeStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Equity filter configured from a [`LoaderConfig`]
#[derive(Debug, Clone)]
pub struct Normalizer {
    date_format: String,
    equity_types: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&LoaderConfig::default())
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            date_format: config.date_format.clone(),
            equity_types: config
                .equity_types
                .iter()
                .map(|t| t.trim().to_uppercase())
                .collect(),
        }
    }

    /// Filter, type and coerce the raw union
    ///
    /// Fails only when `Date`, `Code` or `Type` is absent from every file.
    pub fn normalize(&self, raw: &RawTable) -> Result<CleanTable> {
        for required in [DATE_COLUMN, CODE_COLUMN, TYPE_COLUMN] {
            if !raw.has_column(required) {
                return Err(OwnershipError::schema(
                    required,
                    format!("input files [{}]", raw.files().join(", ")),
                ));
            }
        }

        let numeric_columns: Vec<String> = raw
            .columns()
            .into_iter()
            .filter(|c| !IDENTIFIER_COLUMNS.contains(c))
            .map(|c| c.to_string())
            .collect();

        let mut stats = NormalizeStats {
            rows_read: raw.len(),
            ..NormalizeStats::default()
        };
        let mut records = Vec::with_capacity(raw.len());

        for record in raw.records() {
            let instrument_type = record.get(TYPE_COLUMN).unwrap_or("").trim();
            if !is_equity_type(instrument_type, &self.equity_types) {
                stats.dropped_non_equity += 1;
                continue;
            }

            let date = record
                .get(DATE_COLUMN)
                .and_then(|d| parse_report_date(d, &self.date_format));
            let code = record
                .get(CODE_COLUMN)
                .map(str::trim)
                .filter(|c| !c.is_empty());

            let (date, code) = match (date, code) {
                (Some(date), Some(code)) => (date, code),
                _ => {
                    stats.dropped_invalid += 1;
                    continue;
                }
            };

            let values = numeric_columns
                .iter()
                .filter_map(|column| {
                    record
                        .get(column)
                        .map(|cell| (column.clone(), coerce_numeric(cell)))
                })
                .collect();

            records.push(CleanRecord {
                date,
                code: code.to_string(),
                instrument_type: instrument_type.to_string(),
                source_file: record.source_file.clone(),
                values,
            });
        }

        stats.rows_kept = records.len();
        log::debug!(
            "Normalized {} rows: kept {}, dropped {} non-equity, {} invalid",
            stats.rows_read,
            stats.rows_kept,
            stats.dropped_non_equity,
            stats.dropped_invalid
        );

        Ok(CleanTable {
            numeric_columns,
            records,
            stats,
        })
    }
}

/// Normalize with the default equity types and date format
pub fn normalize(raw: &RawTable) -> Result<CleanTable> {
    Normalizer::default().normalize(raw)
}

/// Case-insensitive membership test against upper-cased equity types
pub fn is_equity_type(instrument_type: &str, equity_types: &[String]) -> bool {
    let upper = instrument_type.trim().to_uppercase();
    equity_types.iter().any(|t| *t == upper)
}

/// Parse a reporting date such as `05-Jan-2024`
pub fn parse_report_date(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format).ok()
}

/// Parse a holding cell; anything that is not a finite number becomes 0
pub fn coerce_numeric(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RawRecord;

    fn columns() -> Vec<String> {
        ["Date", "Code", "Type", "Local ID", "Foreign ID", "Price"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(date: &str, code: &str, kind: &str, local: &str, foreign: &str) -> RawRecord {
        RawRecord::new(
            "Jan2024.txt",
            vec![
                ("Date", date),
                ("Code", code),
                ("Type", kind),
                ("Local ID", local),
                ("Foreign ID", foreign),
                ("Price", "9000"),
            ],
        )
    }

    #[test]
    fn test_equity_filter_drops_bonds() {
        let raw = RawTable::from_records(
            columns(),
            vec![
                row("01-Jan-2024", "BBCA", "EQ", "100", "50"),
                row("01-Jan-2024", "FR0091", "BOND", "10", "20"),
                row("01-Jan-2024", "TLKM", "equity", "1", "2"),
                row("01-Jan-2024", "ASII", "s", "3", "4"),
            ],
        );

        let clean = normalize(&raw).unwrap();
        let codes: Vec<&str> = clean.records().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["BBCA", "TLKM", "ASII"]);
        assert_eq!(clean.stats().dropped_non_equity, 1);
        assert_eq!(clean.stats().rows_kept, 3);
    }

    #[test]
    fn test_bad_dates_and_missing_codes_are_dropped() {
        let raw = RawTable::from_records(
            columns(),
            vec![
                row("2024-01-01", "BBCA", "EQ", "100", "50"),
                row("01-Jan-2024", "  ", "EQ", "100", "50"),
                row("31-Jan-2024", "BBRI", "EQ", "100", "50"),
            ],
        );

        let clean = normalize(&raw).unwrap();
        assert_eq!(clean.len(), 1);
        assert_eq!(clean.records()[0].code, "BBRI");
        assert_eq!(
            clean.records()[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert_eq!(clean.stats().dropped_invalid, 2);
    }

    #[test]
    fn test_numeric_coercion_zero_fills() {
        let raw = RawTable::from_records(
            columns(),
            vec![row("05-Jan-2024", "BBCA", "EQ", "1,000", " 250 ")],
        );

        let clean = normalize(&raw).unwrap();
        let record = &clean.records()[0];
        assert_eq!(record.value("Local ID"), 0.0);
        assert_eq!(record.value("Foreign ID"), 250.0);
        assert_eq!(record.value("Price"), 9000.0);
        assert_eq!(record.value("Local MF"), 0.0);
        assert!(!record.has_value("Local MF"));
    }

    #[test]
    fn test_identifier_columns_are_not_numeric() {
        let raw = RawTable::from_records(columns(), vec![]);
        let clean = normalize(&raw).unwrap();
        assert_eq!(clean.numeric_columns(), &["Local ID", "Foreign ID", "Price"]);
        assert!(clean.is_empty());
    }

    #[test]
    fn test_missing_type_column_is_schema_error() {
        let raw = RawTable::from_records(
            vec!["Date".to_string(), "Code".to_string(), "Local ID".to_string()],
            vec![RawRecord::new(
                "Jan2024.txt",
                vec![("Date", "01-Jan-2024"), ("Code", "BBCA"), ("Local ID", "1")],
            )],
        );

        let err = normalize(&raw).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("'Type'"));
        assert!(err.to_string().contains("Jan2024.txt"));
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("42"), 42.0);
        assert_eq!(coerce_numeric("-7.5"), -7.5);
        assert_eq!(coerce_numeric("1e3"), 1000.0);
        assert_eq!(coerce_numeric(""), 0.0);
        assert_eq!(coerce_numeric("n/a"), 0.0);
        assert_eq!(coerce_numeric("NaN"), 0.0);
        assert_eq!(coerce_numeric("inf"), 0.0);
    }

    #[test]
    fn test_parse_report_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_report_date("05-Jan-2024", "%d-%b-%Y"), expected);
        assert_eq!(parse_report_date(" 05-Jan-2024 ", "%d-%b-%Y"), expected);
        assert_eq!(parse_report_date("05-JAN-2024", "%d-%b-%Y"), expected);
        assert_eq!(parse_report_date("31-Feb-2024", "%d-%b-%Y"), None);
        assert_eq!(parse_report_date("", "%d-%b-%Y"), None);
    }
}
