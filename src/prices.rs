//! Price overlay for aggregate ownership flow
//!
//! Prices are supplied by the caller (in memory or from a CSV file); this
//! module never fetches them. Joins are inner joins on date.

use crate::error::{OwnershipError, Result};
use crate::types::{Flow, MarketFlow, ReportDate};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Monthly closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Close")]
    pub close: f64,
}

/// Market net flow and closing price on one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowPrice {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Market_NetFlow")]
    pub market_net_flow: Flow,
    #[serde(rename = "Close")]
    pub close: f64,
}

/// Read a comma-separated `Date,Close` file (`YYYY-MM-DD` dates)
pub fn load_prices_csv(path: &Path) -> Result<Vec<PricePoint>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| OwnershipError::data_source(path, format!("failed to open: {}", e)))?;

    let mut prices = Vec::new();
    for result in rdr.deserialize::<PricePoint>() {
        let point = result
            .map_err(|e| OwnershipError::data_source(path, format!("invalid price row: {}", e)))?;
        prices.push(point);
    }

    log::debug!("Loaded {} prices from {}", prices.len(), path.display());
    Ok(prices)
}

/// Inner-join market flow with prices on date
///
/// Dates present on only one side are dropped. For duplicate price dates the
/// last one wins.
pub fn join_prices(flows: &[MarketFlow], prices: &[PricePoint]) -> Vec<FlowPrice> {
    let closes: BTreeMap<ReportDate, f64> = prices.iter().map(|p| (p.date, p.close)).collect();

    let mut joined: Vec<FlowPrice> = flows
        .iter()
        .filter_map(|flow| {
            closes.get(&flow.date).map(|&close| FlowPrice {
                date: flow.date,
                market_net_flow: flow.market_net_flow,
                close,
            })
        })
        .collect();
    joined.sort_by_key(|p| p.date);
    joined
}
