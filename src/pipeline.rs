//! End-to-end ownership pipeline
//!
//! load → normalize → melt → label → net flow. Each run is a pure function of
//! the files on disk; nothing is kept between runs (see [`crate::cache`] for
//! caller-owned memoization).

use crate::cleaner::{NormalizeStats, Normalizer};
use crate::error::Result;
use crate::labels::CategoryLabeler;
use crate::loader::{LoaderConfig, RawTable, RecordLoader};
use crate::metrics::{self, Direction, FlowRatio};
use crate::query;
use crate::reshape::{self, CategoryCoverage};
use crate::types::{AccelerationRow, FlowRow, MarketFlow, Mover, ReportDate};
use std::path::Path;

/// Output of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PreparedData {
    rows: Vec<FlowRow>,
    coverage: CategoryCoverage,
    stats: NormalizeStats,
    files: Vec<String>,
}

impl PreparedData {
    /// Labeled rows with net flow, sorted by (Code, Category, Date)
    pub fn rows(&self) -> &[FlowRow] {
        &self.rows
    }

    /// Known categories found in / missing from the input
    pub fn coverage(&self) -> &CategoryCoverage {
        &self.coverage
    }

    pub fn stats(&self) -> NormalizeStats {
        self.stats
    }

    /// Base names of the loaded files
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn codes(&self) -> Vec<String> {
        query::codes(&self.rows)
    }

    pub fn dates(&self) -> Vec<ReportDate> {
        query::available_dates(&self.rows)
    }

    pub fn market_flow(&self) -> Vec<MarketFlow> {
        metrics::monthly_total_flow(&self.rows)
    }

    pub fn ratios(&self) -> Vec<FlowRatio> {
        metrics::flow_ratio(&self.rows)
    }

    pub fn acceleration(&self) -> Vec<AccelerationRow> {
        metrics::flow_acceleration(&self.rows)
    }

    pub fn top_movers(&self, date: ReportDate, n: usize, direction: Direction) -> Vec<Mover> {
        metrics::top_movers(&self.rows, date, n, direction)
    }
}

/// Configured pipeline stages
#[derive(Debug, Clone, Default)]
pub struct OwnershipPipeline {
    loader: RecordLoader,
    normalizer: Normalizer,
    labeler: CategoryLabeler,
}

impl OwnershipPipeline {
    /// Pipeline with the default file format and investor names
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with a custom file format
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            normalizer: Normalizer::from_config(&config),
            loader: RecordLoader::with_config(config),
            labeler: CategoryLabeler::new(),
        }
    }

    /// Replace the category labeler
    pub fn with_labeler(mut self, labeler: CategoryLabeler) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn loader(&self) -> &RecordLoader {
        &self.loader
    }

    /// Load every file in `dir` and run all stages
    pub fn run(&self, dir: &Path) -> Result<PreparedData> {
        let raw = self.loader.load_dir(dir)?;
        self.prepare(&raw)
    }

    /// Run the stages after loading on an already unioned raw table
    pub fn prepare(&self, raw: &RawTable) -> Result<PreparedData> {
        let clean = self.normalizer.normalize(raw)?;
        let reshaped = reshape::melt(&clean);
        let labeled = self.labeler.apply(reshaped.rows);
        let rows = metrics::net_flow(&labeled);

        log::info!(
            "Prepared {} ownership rows from {} equity records ({} categories)",
            rows.len(),
            clean.len(),
            reshaped.coverage.found.len()
        );

        Ok(PreparedData {
            rows,
            coverage: reshaped.coverage,
            stats: clean.stats(),
            files: raw.files().to_vec(),
        })
    }
}
