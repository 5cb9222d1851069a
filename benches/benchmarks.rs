use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ownership_flow::{
    cleaner::normalize,
    labels::CategoryLabeler,
    loader::{RawRecord, RawTable},
    metrics::{flow_acceleration, flow_ratio, net_flow, top_movers, Direction},
    reshape::{melt, OWNERSHIP_CATEGORIES},
};

/// 200 codes x 24 months with every ownership category present
fn synthetic_table() -> RawTable {
    let mut columns = vec!["Date".to_string(), "Code".to_string(), "Type".to_string()];
    columns.extend(OWNERSHIP_CATEGORIES.iter().map(|c| c.to_string()));

    let start = NaiveDate::from_ymd_opt(2022, 1, 31).unwrap();
    let mut records = Vec::new();
    for month in 0..24 {
        let date = (start + Duration::days(30 * month)).format("%d-%b-%Y").to_string();
        for code in 0..200 {
            let mut fields = vec![
                ("Date".to_string(), date.clone()),
                ("Code".to_string(), format!("C{:03}", code)),
                ("Type".to_string(), "EQ".to_string()),
            ];
            for (i, category) in OWNERSHIP_CATEGORIES.iter().enumerate() {
                let shares = 1_000_000 + (code * 7919 + i as i64 * 104_729 + month * 31) % 50_000;
                fields.push((category.to_string(), shares.to_string()));
            }
            records.push(RawRecord::new("bench.txt", fields));
        }
    }

    RawTable::from_records(columns, records)
}

fn benchmark_reshape(c: &mut Criterion) {
    let raw = synthetic_table();
    let clean = normalize(&raw).unwrap();

    c.bench_function("normalize_4800_records", |b| {
        b.iter(|| normalize(black_box(&raw)).unwrap());
    });

    c.bench_function("melt_4800_records", |b| {
        b.iter(|| melt(black_box(&clean)));
    });
}

fn benchmark_flow_metrics(c: &mut Criterion) {
    let raw = synthetic_table();
    let clean = normalize(&raw).unwrap();
    let labeled = CategoryLabeler::new().apply(melt(&clean).rows);
    let flows = net_flow(&labeled);
    let last = flows.iter().map(|r| r.date).max().unwrap();

    c.bench_function("net_flow_86400_rows", |b| {
        b.iter(|| net_flow(black_box(&labeled)));
    });

    c.bench_function("flow_acceleration_86400_rows", |b| {
        b.iter(|| flow_acceleration(black_box(&flows)));
    });

    c.bench_function("flow_ratio_86400_rows", |b| {
        b.iter(|| flow_ratio(black_box(&flows)));
    });

    c.bench_function("top_movers_10", |b| {
        b.iter(|| top_movers(black_box(&flows), last, 10, Direction::Sell));
    });
}

criterion_group!(benches, benchmark_reshape, benchmark_flow_metrics);
criterion_main!(benches);
