//! Core row types shared by the pipeline stages
//!
//! Serialized field names follow the column names of the disclosure tables
//! (`Date`, `Code`, `Category`, ...), so JSON/CSV output lines up with what
//! chart layers and spreadsheets already expect.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reporting date (month-end disclosure date)
pub type ReportDate = NaiveDate;

/// Instrument identifier (ticker)
pub type Code = String;

/// Share count held by a category
pub type Shares = f64;

/// Signed change in shares between two reporting dates
pub type Flow = f64;

/// One instrument, date and ownership category (long form)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRow {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Code")]
    pub code: Code,
    /// Raw `"<Region> <InvestorCode>"` column name
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Shares")]
    pub shares: Shares,
}

/// [`OwnershipRow`] with its human-readable category label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledOwnershipRow {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Code")]
    pub code: Code,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Category_Label")]
    pub category_label: String,
    #[serde(rename = "Shares")]
    pub shares: Shares,
}

/// [`LabeledOwnershipRow`] with month-over-month net flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Code")]
    pub code: Code,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Category_Label")]
    pub category_label: String,
    #[serde(rename = "Shares")]
    pub shares: Shares,
    #[serde(rename = "NetFlow")]
    pub net_flow: Flow,
}

impl FlowRow {
    /// Attach a net flow to a labeled row
    pub fn from_labeled(row: LabeledOwnershipRow, net_flow: Flow) -> Self {
        Self {
            date: row.date,
            code: row.code,
            category: row.category,
            category_label: row.category_label,
            shares: row.shares,
            net_flow,
        }
    }

    /// Region token of the category (`Local`, `Foreign`, ...)
    pub fn investor_type(&self) -> Option<&str> {
        investor_type(&self.category)
    }
}

/// [`FlowRow`] with the change in net flow (second difference of shares)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerationRow {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Code")]
    pub code: Code,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Category_Label")]
    pub category_label: String,
    #[serde(rename = "Shares")]
    pub shares: Shares,
    #[serde(rename = "NetFlow")]
    pub net_flow: Flow,
    #[serde(rename = "Acceleration")]
    pub acceleration: Flow,
}

/// Market-wide net flow for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFlow {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Market_NetFlow")]
    pub market_net_flow: Flow,
}

/// Summed net flow of one code on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    #[serde(rename = "Code")]
    pub code: Code,
    #[serde(rename = "NetFlow")]
    pub net_flow: Flow,
}

/// Shares held per (Date, Category_Label), the bar-chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelShares {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Category_Label")]
    pub category_label: String,
    #[serde(rename = "Shares")]
    pub shares: Shares,
}

/// First whitespace-separated token of a category string
pub fn investor_type(category: &str) -> Option<&str> {
    category.split_whitespace().next()
}
