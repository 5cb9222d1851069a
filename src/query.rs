//! Selectors used by dashboard front-ends
//!
//! Plain filters and aggregations over labeled rows: the stock picker list,
//! category and month selections, and the per-label share totals behind the
//! monthly bar chart. Empty selections give empty tables.

use crate::types::{LabelShares, LabeledOwnershipRow, ReportDate, Shares};
use std::collections::{BTreeMap, BTreeSet};

/// Number of category labels pre-selected by default
pub const DEFAULT_LABEL_COUNT: usize = 4;

/// Anything carrying a code, a date and a category label
pub trait OwnershipFields {
    fn code(&self) -> &str;
    fn date(&self) -> ReportDate;
    fn category_label(&self) -> &str;
    fn shares(&self) -> Shares;
}

impl OwnershipFields for LabeledOwnershipRow {
    fn code(&self) -> &str {
        &self.code
    }

    fn date(&self) -> ReportDate {
        self.date
    }

    fn category_label(&self) -> &str {
        &self.category_label
    }

    fn shares(&self) -> Shares {
        self.shares
    }
}

impl OwnershipFields for crate::types::FlowRow {
    fn code(&self) -> &str {
        &self.code
    }

    fn date(&self) -> ReportDate {
        self.date
    }

    fn category_label(&self) -> &str {
        &self.category_label
    }

    fn shares(&self) -> Shares {
        self.shares
    }
}

/// Sorted distinct instrument codes
pub fn codes<R: OwnershipFields>(rows: &[R]) -> Vec<String> {
    rows.iter()
        .map(|r| r.code())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Rows for one instrument code
pub fn filter_code<R: OwnershipFields + Clone>(rows: &[R], code: &str) -> Vec<R> {
    rows.iter().filter(|r| r.code() == code).cloned().collect()
}

/// Sorted distinct category labels
pub fn available_labels<R: OwnershipFields>(rows: &[R]) -> Vec<String> {
    rows.iter()
        .map(|r| r.category_label())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// The first `count` available labels, the default category selection
pub fn default_labels<R: OwnershipFields>(rows: &[R], count: usize) -> Vec<String> {
    let mut labels = available_labels(rows);
    labels.truncate(count);
    labels
}

/// Rows whose label is in `labels`
pub fn filter_labels<R: OwnershipFields + Clone>(rows: &[R], labels: &[String]) -> Vec<R> {
    rows.iter()
        .filter(|r| labels.iter().any(|l| l == r.category_label()))
        .cloned()
        .collect()
}

/// Sorted distinct reporting dates
pub fn available_dates<R: OwnershipFields>(rows: &[R]) -> Vec<ReportDate> {
    rows.iter()
        .map(|r| r.date())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows whose date is in `dates`
pub fn filter_dates<R: OwnershipFields + Clone>(rows: &[R], dates: &[ReportDate]) -> Vec<R> {
    rows.iter()
        .filter(|r| dates.contains(&r.date()))
        .cloned()
        .collect()
}

/// Sum of shares per (Date, Category_Label), ordered by date then label
pub fn aggregate_by_label<R: OwnershipFields>(rows: &[R]) -> Vec<LabelShares> {
    let mut totals: BTreeMap<(ReportDate, &str), Shares> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.date(), row.category_label()))
            .or_insert(0.0) += row.shares();
    }

    totals
        .into_iter()
        .map(|((date, label), shares)| LabelShares {
            date,
            category_label: label.to_string(),
            shares,
        })
        .collect()
}
