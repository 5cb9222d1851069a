//! Wide-to-long reshape of ownership categories
//!
//! The disclosure files carry one column per `"<Region> <InvestorCode>"`
//! category. [`melt`] turns every (record, category) pair into an
//! [`OwnershipRow`], working against the closed set in
//! [`OWNERSHIP_CATEGORIES`] and reporting which of them the input carried.

use crate::cleaner::CleanTable;
use crate::types::OwnershipRow;
use serde::{Deserialize, Serialize};

/// Known ownership category columns, in output order
pub const OWNERSHIP_CATEGORIES: [&str; 18] = [
    "Local IS",
    "Local CP",
    "Local PF",
    "Local IB",
    "Local ID",
    "Local MF",
    "Local SC",
    "Local FD",
    "Local OT",
    "Foreign IS",
    "Foreign CP",
    "Foreign PF",
    "Foreign IB",
    "Foreign ID",
    "Foreign MF",
    "Foreign SC",
    "Foreign FD",
    "Foreign OT",
];

/// Which known categories an input batch carried
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCoverage {
    pub found: Vec<String>,
    pub missing: Vec<String>,
}

impl CategoryCoverage {
    /// Intersect the known categories with a table's columns
    pub fn of(table: &CleanTable) -> Self {
        let (found, missing): (Vec<&str>, Vec<&str>) = OWNERSHIP_CATEGORIES
            .iter()
            .copied()
            .partition(|category| table.has_column(category));

        Self {
            found: found.into_iter().map(String::from).collect(),
            missing: missing.into_iter().map(String::from).collect(),
        }
    }

    /// True when every known category was present
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Result of a reshape: the long rows plus category coverage
#[derive(Debug, Clone, Default)]
pub struct Reshaped {
    pub rows: Vec<OwnershipRow>,
    pub coverage: CategoryCoverage,
}

/// Melt the clean wide table into one row per (record, present category)
///
/// Rows are emitted category-major. Records from files lacking a present
/// category contribute zero shares for it.
pub fn melt(table: &CleanTable) -> Reshaped {
    let coverage = CategoryCoverage::of(table);
    if !coverage.is_complete() {
        log::info!(
            "{} of {} ownership categories absent from input: {}",
            coverage.missing.len(),
            OWNERSHIP_CATEGORIES.len(),
            coverage.missing.join(", ")
        );
    }

    let mut rows = Vec::with_capacity(table.len() * coverage.found.len());
    for category in &coverage.found {
        for record in table.records() {
            rows.push(OwnershipRow {
                date: record.date,
                code: record.code.clone(),
                category: category.clone(),
                shares: record.value(category),
            });
        }
    }

    Reshaped { rows, coverage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::normalize;
    use crate::loader::{RawRecord, RawTable};

    fn table(columns: &[&str], rows: Vec<Vec<(&str, &str)>>) -> CleanTable {
        let records = rows
            .into_iter()
            .map(|fields| RawRecord::new("t.txt", fields))
            .collect();
        let raw = RawTable::from_records(columns.iter().map(|c| c.to_string()).collect(), records);
        normalize(&raw).unwrap()
    }

    #[test]
    fn test_melt_scenario_single_row() {
        let clean = table(
            &["Date", "Code", "Type", "Local ID", "Foreign ID"],
            vec![vec![
                ("Date", "01-Jan-2024"),
                ("Code", "BBCA"),
                ("Type", "EQ"),
                ("Local ID", "100"),
                ("Foreign ID", "50"),
            ]],
        );

        let reshaped = melt(&clean);
        assert_eq!(reshaped.rows.len(), 2);
        assert_eq!(reshaped.rows[0].category, "Local ID");
        assert_eq!(reshaped.rows[0].shares, 100.0);
        assert_eq!(reshaped.rows[1].category, "Foreign ID");
        assert_eq!(reshaped.rows[1].shares, 50.0);
        assert!(reshaped.rows.iter().all(|r| r.code == "BBCA"));
        assert_eq!(reshaped.coverage.found, vec!["Local ID", "Foreign ID"]);
        assert_eq!(reshaped.coverage.missing.len(), 16);
    }

    #[test]
    fn test_melt_row_count_is_product() {
        let clean = table(
            &["Date", "Code", "Type", "Foreign MF", "Local CP", "Local OT", "Price"],
            vec![
                vec![("Date", "31-Jan-2024"), ("Code", "A"), ("Type", "EQ"), ("Foreign MF", "1")],
                vec![("Date", "31-Jan-2024"), ("Code", "B"), ("Type", "EQ"), ("Local CP", "2")],
                vec![("Date", "29-Feb-2024"), ("Code", "A"), ("Type", "EQ"), ("Local OT", "3")],
            ],
        );

        let reshaped = melt(&clean);
        // Price is not an ownership category
        assert_eq!(reshaped.rows.len(), 3 * 3);
        // Fixed category order, not input column order
        assert_eq!(reshaped.coverage.found, vec!["Local CP", "Local OT", "Foreign MF"]);
        // Category-major layout
        assert_eq!(reshaped.rows[0].category, "Local CP");
        assert_eq!(reshaped.rows[3].category, "Local OT");
        // Missing cells become zero shares
        assert_eq!(reshaped.rows[0].shares, 0.0);
        assert_eq!(reshaped.rows[1].shares, 2.0);
    }

    #[test]
    fn test_melt_without_categories_is_empty() {
        let clean = table(
            &["Date", "Code", "Type"],
            vec![vec![("Date", "31-Jan-2024"), ("Code", "A"), ("Type", "EQ")]],
        );

        let reshaped = melt(&clean);
        assert!(reshaped.rows.is_empty());
        assert_eq!(reshaped.coverage.missing.len(), OWNERSHIP_CATEGORIES.len());
    }

    #[test]
    fn test_full_coverage() {
        let mut columns = vec!["Date", "Code", "Type"];
        columns.extend(OWNERSHIP_CATEGORIES.iter());
        let clean = table(&columns, vec![]);

        let coverage = CategoryCoverage::of(&clean);
        assert!(coverage.is_complete());
        assert_eq!(coverage.found.len(), 18);
    }
}
