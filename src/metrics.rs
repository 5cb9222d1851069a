//! Flow metrics over labeled ownership rows
//!
//! Every function is a pure transformation: it takes the full table and
//! returns a new derived table. Differences are always taken along date
//! order inside one (Code, Category) series, never across series.

use crate::types::{
    investor_type, AccelerationRow, Flow, FlowRow, LabeledOwnershipRow, MarketFlow, Mover,
    ReportDate,
};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Region token for domestic investors
pub const LOCAL: &str = "Local";
/// Region token for foreign investors
pub const FOREIGN: &str = "Foreign";

/// Ordering key of a series row
fn series_order(a: (&str, &str, ReportDate), b: (&str, &str, ReportDate)) -> Ordering {
    a.cmp(&b)
}

/// First difference of `value` within consecutive runs of equal `key`
///
/// Input must already be sorted by key then date. The first row of each run
/// gets 0.
fn first_difference<T>(
    rows: &[T],
    key: impl Fn(&T) -> (&str, &str),
    value: impl Fn(&T) -> f64,
) -> Vec<f64> {
    let mut diffs = Vec::with_capacity(rows.len());
    let mut prev: Option<(&T, f64)> = None;

    for row in rows {
        let current = value(row);
        let diff = match prev {
            Some((p, prev_value)) if key(p) == key(row) => current - prev_value,
            _ => 0.0,
        };
        diffs.push(diff);
        prev = Some((row, current));
    }

    diffs
}

/// Month-over-month change in shares per (Code, Category)
///
/// Output is sorted by (Code, Category, Date). The sort is stable, so rows
/// sharing all three keys keep their input order.
pub fn net_flow(rows: &[LabeledOwnershipRow]) -> Vec<FlowRow> {
    let mut sorted: Vec<&LabeledOwnershipRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        series_order(
            (a.code.as_str(), a.category.as_str(), a.date),
            (b.code.as_str(), b.category.as_str(), b.date),
        )
    });

    let flows = first_difference(
        &sorted,
        |r| (r.code.as_str(), r.category.as_str()),
        |r| r.shares,
    );

    sorted
        .into_iter()
        .zip(flows)
        .map(|(row, flow)| FlowRow::from_labeled(row.clone(), flow))
        .collect()
}

/// Sum of net flow across all codes and categories, one row per date
pub fn monthly_total_flow(rows: &[FlowRow]) -> Vec<MarketFlow> {
    let mut totals: BTreeMap<ReportDate, Flow> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.date).or_insert(0.0) += row.net_flow;
    }

    totals
        .into_iter()
        .map(|(date, market_net_flow)| MarketFlow {
            date,
            market_net_flow,
        })
        .collect()
}

/// Local vs foreign net flow on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRatio {
    #[serde(rename = "Date")]
    pub date: ReportDate,
    #[serde(rename = "Local")]
    pub local: Flow,
    #[serde(rename = "Foreign")]
    pub foreign: Flow,
    /// Summed flow of every region other than Local and Foreign
    #[serde(rename = "Other", default)]
    pub other: Flow,
    /// `Foreign / (Foreign + Local)`, denominator floored to 1 when it is 0
    #[serde(rename = "Foreign_Ratio")]
    pub foreign_ratio: f64,
    /// Summed net flow for every region token seen on this date
    #[serde(skip)]
    pub investor_types: BTreeMap<String, Flow>,
}

impl FlowRatio {
    /// Regions outside Local and Foreign with their summed flow
    pub fn other_regions(&self) -> impl Iterator<Item = (&str, Flow)> + '_ {
        self.investor_types
            .iter()
            .filter(|(kind, _)| kind.as_str() != LOCAL && kind.as_str() != FOREIGN)
            .map(|(kind, flow)| (kind.as_str(), *flow))
    }

    /// Foreign share of the combined flow, or `None` when both sums are 0
    pub fn foreign_ratio_checked(&self) -> Option<f64> {
        let total = self.foreign + self.local;
        if total == 0.0 {
            None
        } else {
            Some(self.foreign / total)
        }
    }
}

/// Pivot summed net flow per date by investor type and derive the foreign ratio
pub fn flow_ratio(rows: &[FlowRow]) -> Vec<FlowRatio> {
    let mut pivot: BTreeMap<ReportDate, BTreeMap<String, Flow>> = BTreeMap::new();
    for row in rows {
        if let Some(kind) = investor_type(&row.category) {
            *pivot
                .entry(row.date)
                .or_default()
                .entry(kind.to_string())
                .or_insert(0.0) += row.net_flow;
        }
    }

    pivot
        .into_iter()
        .map(|(date, investor_types)| {
            let local = investor_types.get(LOCAL).copied().unwrap_or(0.0);
            let foreign = investor_types.get(FOREIGN).copied().unwrap_or(0.0);
            let total = foreign + local;
            let denominator = if total == 0.0 { 1.0 } else { total };

            let mut ratio = FlowRatio {
                date,
                local,
                foreign,
                other: 0.0,
                foreign_ratio: foreign / denominator,
                investor_types,
            };
            ratio.other = ratio.other_regions().map(|(_, flow)| flow).sum();
            ratio
        })
        .collect()
}

/// Change in net flow per (Code, Category), i.e. the second difference of shares
pub fn flow_acceleration(rows: &[FlowRow]) -> Vec<AccelerationRow> {
    let mut sorted: Vec<&FlowRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        series_order(
            (a.code.as_str(), a.category.as_str(), a.date),
            (b.code.as_str(), b.category.as_str(), b.date),
        )
    });

    let accelerations = first_difference(
        &sorted,
        |r| (r.code.as_str(), r.category.as_str()),
        |r| r.net_flow,
    );

    sorted
        .into_iter()
        .zip(accelerations)
        .map(|(row, acceleration)| AccelerationRow {
            date: row.date,
            code: row.code.clone(),
            category: row.category.clone(),
            category_label: row.category_label.clone(),
            shares: row.shares,
            net_flow: row.net_flow,
            acceleration,
        })
        .collect()
}

/// Ranking direction for [`top_movers`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Largest net inflow first
    #[default]
    Buy,
    /// Largest net outflow first
    Sell,
}

impl FromStr for Direction {
    type Err = Infallible;

    /// `"buy"` selects [`Direction::Buy`]; any other value means sell
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "buy" {
            Direction::Buy
        } else {
            Direction::Sell
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
        }
    }
}

/// The `n` codes with the largest inflow (buy) or outflow (sell) on `date`
///
/// Returns an empty table when no row matches `date`. Ties order by code.
pub fn top_movers(
    rows: &[FlowRow],
    date: ReportDate,
    n: usize,
    direction: Direction,
) -> Vec<Mover> {
    let mut sums: HashMap<&str, Flow> = HashMap::new();
    for row in rows.iter().filter(|r| r.date == date) {
        *sums.entry(row.code.as_str()).or_insert(0.0) += row.net_flow;
    }

    let mut movers: Vec<Mover> = sums
        .into_iter()
        .map(|(code, net_flow)| Mover {
            code: code.to_string(),
            net_flow,
        })
        .collect();

    movers.sort_by(|a, b| {
        let by_flow = match direction {
            Direction::Buy => b.net_flow.total_cmp(&a.net_flow),
            Direction::Sell => a.net_flow.total_cmp(&b.net_flow),
        };
        by_flow.then_with(|| a.code.cmp(&b.code))
    });
    movers.truncate(n);
    movers
}
