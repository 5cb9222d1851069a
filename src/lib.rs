//! # ownership-flow
//!
//! Turns periodic stock-ownership disclosure files into a long analytical
//! table and derives investor net-flow metrics from it.
//!
//! The disclosure files are pipe-delimited, one row per instrument and
//! reporting date, with one column per `"<Region> <InvestorCode>"` ownership
//! category (`Local ID`, `Foreign MF`, ...). The pipeline keeps equity rows
//! only, melts the category columns into (Date, Code, Category, Shares)
//! rows, labels each category and computes month-over-month flows.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ownership_flow::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let data = OwnershipPipeline::new().run(Path::new("data"))?;
//!
//!     for month in data.market_flow() {
//!         println!("{} {}", month.date, month.market_net_flow);
//!     }
//!
//!     if let Some(last) = data.dates().last() {
//!         let sellers = data.top_movers(*last, 5, Direction::Sell);
//!         println!("{:?}", sellers);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cleaner;
pub mod error;
pub mod labels;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod prices;
pub mod query;
pub mod reshape;
pub mod types;

pub mod prelude {
    //! Commonly used types and functions
    pub use crate::cache::{DirectoryFingerprint, PreparedCache};
    pub use crate::cleaner::{normalize, CleanTable, NormalizeStats, Normalizer};
    pub use crate::error::{OwnershipError, Result};
    pub use crate::labels::{label_category, CategoryLabeler};
    pub use crate::loader::{LoaderConfig, RawTable, RecordLoader};
    pub use crate::metrics::{
        flow_acceleration, flow_ratio, monthly_total_flow, net_flow, top_movers, Direction,
        FlowRatio,
    };
    pub use crate::pipeline::{OwnershipPipeline, PreparedData};
    pub use crate::prices::{join_prices, load_prices_csv, FlowPrice, PricePoint};
    pub use crate::reshape::{melt, CategoryCoverage, OWNERSHIP_CATEGORIES};
    pub use crate::types::*;
}
