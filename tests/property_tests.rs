//! Property tests for the reshape and flow invariants

use chrono::NaiveDate;
use ownership_flow::cleaner::normalize;
use ownership_flow::labels::{label_category, CategoryLabeler};
use ownership_flow::loader::{RawRecord, RawTable};
use ownership_flow::metrics::{flow_acceleration, flow_ratio, net_flow};
use ownership_flow::reshape::{melt, OWNERSHIP_CATEGORIES};
use ownership_flow::types::{AccelerationRow, FlowRow, LabeledOwnershipRow, OwnershipRow};
use proptest::prelude::*;

fn month_end(index: u32) -> String {
    let date = NaiveDate::from_ymd_opt(2020 + (index / 12) as i32, index % 12 + 1, 1).unwrap();
    date.format("%d-%b-%Y").to_string()
}

fn labeled(code: &str, category: &str, month: u32, shares: f64) -> LabeledOwnershipRow {
    LabeledOwnershipRow {
        date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
        code: code.to_string(),
        category: category.to_string(),
        category_label: label_category(category),
        shares,
    }
}

proptest! {
    #[test]
    fn reshape_row_count_is_records_times_categories(
        category_mask in prop::collection::vec(any::<bool>(), 18),
        rows in prop::collection::vec((0u32..36, 0usize..4, -1_000i64..1_000_000), 0..40),
    ) {
        let categories: Vec<&str> = OWNERSHIP_CATEGORIES
            .iter()
            .zip(&category_mask)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| *c)
            .collect();

        let mut columns = vec!["Date".to_string(), "Code".to_string(), "Type".to_string()];
        columns.extend(categories.iter().map(|c| c.to_string()));

        let codes = ["BBCA", "TLKM", "ASII", "BBRI"];
        let records: Vec<RawRecord> = rows
            .iter()
            .map(|(month, code, shares)| {
                let mut fields = vec![
                    ("Date".to_string(), month_end(*month)),
                    ("Code".to_string(), codes[*code].to_string()),
                    ("Type".to_string(), "EQ".to_string()),
                ];
                fields.extend(categories.iter().map(|c| (c.to_string(), shares.to_string())));
                RawRecord::new("prop.txt", fields)
            })
            .collect();

        let clean = normalize(&RawTable::from_records(columns, records)).unwrap();
        let reshaped = melt(&clean);

        prop_assert_eq!(clean.len(), rows.len());
        prop_assert_eq!(reshaped.rows.len(), clean.len() * categories.len());
        prop_assert_eq!(reshaped.coverage.found.len() + reshaped.coverage.missing.len(), 18);
    }

    #[test]
    fn net_flow_is_discrete_derivative(
        shares in prop::collection::vec(0i64..10_000_000, 1..12),
        other in prop::collection::vec(0i64..10_000_000, 1..12),
    ) {
        let mut rows: Vec<LabeledOwnershipRow> = shares
            .iter()
            .enumerate()
            .map(|(i, s)| labeled("BBCA", "Local ID", i as u32 + 1, *s as f64))
            .collect();
        rows.extend(
            other
                .iter()
                .enumerate()
                .map(|(i, s)| labeled("BBCA", "Foreign MF", i as u32 + 1, *s as f64)),
        );
        rows.reverse();

        let flows = net_flow(&rows);
        let accel = flow_acceleration(&flows);

        let local: Vec<&FlowRow> = flows.iter().filter(|r| r.category == "Local ID").collect();
        prop_assert_eq!(local[0].net_flow, 0.0);
        for i in 1..local.len() {
            prop_assert!(local[i - 1].date < local[i].date);
            prop_assert_eq!(local[i].net_flow, local[i].shares - local[i - 1].shares);
        }

        for category in ["Local ID", "Foreign MF"] {
            let series: Vec<&AccelerationRow> =
                accel.iter().filter(|r| r.category == category).collect();
            prop_assert_eq!(series[0].net_flow, 0.0);
            prop_assert_eq!(series[0].acceleration, 0.0);
            for i in 1..series.len() {
                prop_assert_eq!(
                    series[i].acceleration,
                    series[i].net_flow - series[i - 1].net_flow
                );
            }
        }
    }

    #[test]
    fn flow_ratio_is_always_defined(
        flows in prop::collection::vec((1u32..4, any::<bool>(), -1_000i64..1_000), 0..30),
    ) {
        let rows: Vec<FlowRow> = flows
            .iter()
            .map(|(month, foreign, flow)| {
                let category = if *foreign { "Foreign ID" } else { "Local ID" };
                FlowRow::from_labeled(labeled("BBCA", category, *month, 0.0), *flow as f64)
            })
            .collect();

        for ratio in flow_ratio(&rows) {
            prop_assert!(ratio.foreign_ratio.is_finite());
            if ratio.local + ratio.foreign == 0.0 {
                prop_assert_eq!(ratio.foreign_ratio, ratio.foreign);
                prop_assert!(ratio.foreign_ratio_checked().is_none());
            }
        }
    }

    #[test]
    fn labeling_is_idempotent(region in "[A-Za-z]{1,8}", code in "[A-Z]{2}") {
        let labeler = CategoryLabeler::new();
        let category = format!("{} {}", region, code);
        let rows = vec![OwnershipRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            code: "BBCA".to_string(),
            category: category.clone(),
            shares: 1.0,
        }];

        let once = labeler.apply(rows);
        let mut twice = once.clone();
        labeler.relabel(&mut twice);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once[0].category_label.starts_with(&region));
    }
}
