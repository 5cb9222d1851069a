//! ownership-flow CLI - inspect ownership disclosure files from the terminal
//!
//! ## Example Usage
//!
//! ```bash
//! # Dataset overview
//! ownership-flow --data-dir ./data summary
//!
//! # Net flow per category for one stock
//! ownership-flow flows --code BBCA
//!
//! # Biggest sellers on a reporting date, as JSON
//! ownership-flow --format json movers --date 2024-01-31 -n 5 --direction sell
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ownership_flow::prelude::*;
use ownership_flow::query;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// ownership-flow: investor ownership reshaping and net-flow metrics
#[derive(Parser)]
#[command(name = "ownership-flow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Investor ownership reshaping and net-flow metrics", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the disclosure files (overrides config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Files, codes, dates and category coverage of the dataset
    Summary,

    /// Net flow per category for one stock
    Flows {
        /// Instrument code
        #[arg(long)]
        code: String,

        /// Restrict to these category labels
        #[arg(long)]
        label: Vec<String>,
    },

    /// Market-wide net flow per date
    Market,

    /// Local vs foreign flow ratio per date
    Ratio {
        /// Leave the ratio empty when local and foreign flows both sum to 0
        #[arg(long)]
        strict: bool,
    },

    /// Change in net flow per category for one stock
    Acceleration {
        /// Instrument code
        #[arg(long)]
        code: String,
    },

    /// Codes with the largest inflow or outflow on a date
    Movers {
        /// Reporting date (YYYY-MM-DD or DD-Mon-YYYY)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Number of codes (default from config)
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// "buy" for inflows; anything else ranks outflows
        #[arg(long, default_value = "buy")]
        direction: String,
    },

    /// Shares held per category label and month for one stock
    Holdings {
        /// Instrument code
        #[arg(long)]
        code: String,

        /// Category labels (default: first four available)
        #[arg(long)]
        label: Vec<String>,

        /// Months to include (default: all)
        #[arg(long, value_parser = parse_date)]
        month: Vec<NaiveDate>,
    },

    /// Market net flow joined with a Date,Close price file
    Prices {
        /// Price CSV path
        #[arg(long)]
        file: PathBuf,
    },
}

// Configuration file (TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default)]
    loader: LoaderConfig,
    #[serde(default = "default_top_n")]
    top_n: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_top_n() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            loader: LoaderConfig::default(),
            top_n: default_top_n(),
        }
    }
}

impl Config {
    fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => dirs::home_dir().map(|home| home.join(".ownership-flow").join("config.toml")),
        };

        if let Some(config_path) = path {
            if config_path.exists() {
                match fs::read_to_string(&config_path) {
                    Ok(contents) => match toml::from_str(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                        }
                    },
                    Err(e) => {
                        eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
                    }
                }
            }
        }

        Config::default()
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%b-%Y"))
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD or DD-Mon-YYYY", s))
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = Config::load(cli.config.as_deref());
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    if cli.verbose {
        eprintln!(
            "{} v{}",
            "ownership-flow".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        eprintln!(
            "Data dir: {}",
            config.data_dir.display().to_string().dimmed()
        );
    }

    if let Err(e) = run(cli, &config) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let pipeline = OwnershipPipeline::with_config(config.loader.clone());
    let data = pipeline
        .run(&config.data_dir)
        .with_context(|| format!("failed to prepare {}", config.data_dir.display()))?;
    let format = cli.format;

    match cli.command {
        Commands::Summary => show_summary(&data, format),

        Commands::Flows { code, label } => {
            let mut rows = query::filter_code(data.rows(), &code);
            if !label.is_empty() {
                rows = query::filter_labels(&rows, &label);
            }
            emit(
                &rows,
                format,
                &["Date", "Code", "Category_Label", "Shares", "NetFlow"],
                |r| {
                    vec![
                        r.date.to_string(),
                        r.code.clone(),
                        r.category_label.clone(),
                        fmt_num(r.shares),
                        fmt_signed(r.net_flow),
                    ]
                },
            )
        }

        Commands::Market => emit(
            &data.market_flow(),
            format,
            &["Date", "Market_NetFlow"],
            |r| vec![r.date.to_string(), fmt_signed(r.market_net_flow)],
        ),

        Commands::Ratio { strict } => show_ratios(&data.ratios(), strict, format),

        Commands::Acceleration { code } => {
            let rows: Vec<AccelerationRow> = data
                .acceleration()
                .into_iter()
                .filter(|r| r.code == code)
                .collect();
            emit(
                &rows,
                format,
                &["Date", "Code", "Category_Label", "NetFlow", "Acceleration"],
                |r| {
                    vec![
                        r.date.to_string(),
                        r.code.clone(),
                        r.category_label.clone(),
                        fmt_signed(r.net_flow),
                        fmt_signed(r.acceleration),
                    ]
                },
            )
        }

        Commands::Movers {
            date,
            top,
            direction,
        } => {
            let direction: Direction = direction.parse().unwrap_or(Direction::Sell);
            let movers = data.top_movers(date, top.unwrap_or(config.top_n), direction);
            if movers.is_empty() && format == OutputFormat::Table {
                println!("{} no rows for {}", "Note:".yellow(), date);
                return Ok(());
            }
            emit(&movers, format, &["Code", "NetFlow"], |r| {
                vec![r.code.clone(), fmt_signed(r.net_flow)]
            })
        }

        Commands::Holdings { code, label, month } => {
            let rows = query::filter_code(data.rows(), &code);
            if rows.is_empty() {
                anyhow::bail!("no equity data for {}", code);
            }
            let labels = if label.is_empty() {
                query::default_labels(&rows, query::DEFAULT_LABEL_COUNT)
            } else {
                label
            };
            let mut rows = query::filter_labels(&rows, &labels);
            if !month.is_empty() {
                rows = query::filter_dates(&rows, &month);
            }
            if rows.is_empty() {
                anyhow::bail!("no data for the selected months");
            }
            emit(
                &query::aggregate_by_label(&rows),
                format,
                &["Date", "Category_Label", "Shares"],
                |r| vec![r.date.to_string(), r.category_label.clone(), fmt_num(r.shares)],
            )
        }

        Commands::Prices { file } => {
            let prices = load_prices_csv(&file)?;
            let joined = join_prices(&data.market_flow(), &prices);
            emit(
                &joined,
                format,
                &["Date", "Market_NetFlow", "Close"],
                |r| {
                    vec![
                        r.date.to_string(),
                        fmt_signed(r.market_net_flow),
                        fmt_num(r.close),
                    ]
                },
            )
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    files: &'a [String],
    codes: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    dates: usize,
    rows: usize,
    stats: NormalizeStats,
    coverage: &'a CategoryCoverage,
}

/// One flat CSV record of a [`Summary`]; list fields are joined with `;`
#[derive(Serialize)]
struct SummaryRecord {
    #[serde(rename = "Files")]
    files: String,
    #[serde(rename = "Codes")]
    codes: usize,
    #[serde(rename = "First_Date")]
    first_date: Option<NaiveDate>,
    #[serde(rename = "Last_Date")]
    last_date: Option<NaiveDate>,
    #[serde(rename = "Rows")]
    rows: usize,
    #[serde(rename = "Rows_Read")]
    rows_read: usize,
    #[serde(rename = "Rows_Kept")]
    rows_kept: usize,
    #[serde(rename = "Dropped_Non_Equity")]
    dropped_non_equity: usize,
    #[serde(rename = "Dropped_Invalid")]
    dropped_invalid: usize,
    #[serde(rename = "Categories_Found")]
    categories_found: usize,
    #[serde(rename = "Categories_Missing")]
    categories_missing: String,
}

impl From<&Summary<'_>> for SummaryRecord {
    fn from(summary: &Summary<'_>) -> Self {
        Self {
            files: summary.files.join(";"),
            codes: summary.codes,
            first_date: summary.first_date,
            last_date: summary.last_date,
            rows: summary.rows,
            rows_read: summary.stats.rows_read,
            rows_kept: summary.stats.rows_kept,
            dropped_non_equity: summary.stats.dropped_non_equity,
            dropped_invalid: summary.stats.dropped_invalid,
            categories_found: summary.coverage.found.len(),
            categories_missing: summary.coverage.missing.join(";"),
        }
    }
}

fn write_summary_csv<W: io::Write>(summary: &Summary<'_>, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.serialize(SummaryRecord::from(summary))?;
    wtr.flush()?;
    Ok(())
}

fn summarize(data: &PreparedData) -> Summary<'_> {
    let dates = data.dates();
    Summary {
        files: data.files(),
        codes: data.codes().len(),
        first_date: dates.first().copied(),
        last_date: dates.last().copied(),
        dates: dates.len(),
        rows: data.rows().len(),
        stats: data.stats(),
        coverage: data.coverage(),
    }
}

fn show_summary(data: &PreparedData, format: OutputFormat) -> Result<()> {
    let summary = summarize(data);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }
        OutputFormat::Csv => return write_summary_csv(&summary, io::stdout()),
        OutputFormat::Table => {}
    }

    println!("{}", "Ownership dataset".cyan().bold());
    println!("  Files:      {}", summary.files.join(", "));
    println!("  Codes:      {}", summary.codes);
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => {
            println!("  Dates:      {} .. {} ({})", first, last, summary.dates)
        }
        _ => println!("  Dates:      {}", "none".dimmed()),
    }
    println!("  Long rows:  {}", summary.rows);
    println!(
        "  Records:    {} read, {} kept, {} non-equity, {} invalid",
        summary.stats.rows_read,
        summary.stats.rows_kept,
        summary.stats.dropped_non_equity,
        summary.stats.dropped_invalid
    );
    println!(
        "  Categories: {}/{} found",
        summary.coverage.found.len(),
        OWNERSHIP_CATEGORIES.len()
    );
    if !summary.coverage.is_complete() {
        println!(
            "  {} {}",
            "Missing:".yellow(),
            summary.coverage.missing.join(", ")
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct StrictRatio {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Local")]
    local: f64,
    #[serde(rename = "Foreign")]
    foreign: f64,
    #[serde(rename = "Other")]
    other: f64,
    #[serde(rename = "Foreign_Ratio")]
    foreign_ratio: Option<f64>,
}

fn show_ratios(ratios: &[FlowRatio], strict: bool, format: OutputFormat) -> Result<()> {
    let headers = ["Date", "Local", "Foreign", "Other", "Foreign_Ratio"];
    if !strict {
        return emit(ratios, format, &headers, |r| {
            vec![
                r.date.to_string(),
                fmt_signed(r.local),
                fmt_signed(r.foreign),
                fmt_signed(r.other),
                format!("{:.4}", r.foreign_ratio),
            ]
        });
    }

    let rows: Vec<StrictRatio> = ratios
        .iter()
        .map(|r| StrictRatio {
            date: r.date,
            local: r.local,
            foreign: r.foreign,
            other: r.other,
            foreign_ratio: r.foreign_ratio_checked(),
        })
        .collect();
    emit(&rows, format, &headers, |r| {
        vec![
            r.date.to_string(),
            fmt_signed(r.local),
            fmt_signed(r.foreign),
            fmt_signed(r.other),
            r.foreign_ratio.map(|v| format!("{:.4}", v)).unwrap_or_default(),
        ]
    })
}

/// Print rows as an aligned table, JSON array or CSV
fn emit<T, F>(rows: &[T], format: OutputFormat, headers: &[&str], cells: F) -> Result<()>
where
    T: Serialize,
    F: Fn(&T) -> Vec<String>,
{
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            let body: Vec<Vec<String>> = rows.iter().map(&cells).collect();
            let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
            for line in &body {
                for (w, cell) in widths.iter_mut().zip(line) {
                    *w = (*w).max(cell.chars().count());
                }
            }

            let header_line: Vec<String> = headers
                .iter()
                .zip(&widths)
                .map(|(h, w)| format!("{:<width$}", h, width = *w))
                .collect();
            println!("{}", header_line.join("  ").bold());
            for line in body {
                let cells: Vec<String> = line
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{:>width$}", c, width = *w))
                    .collect();
                println!("{}", cells.join("  "));
            }
            if rows.is_empty() {
                println!("{}", "(no rows)".dimmed());
            }
        }
    }
    Ok(())
}

fn fmt_num(value: f64) -> String {
    format!("{:.0}", value)
}

fn fmt_signed(value: f64) -> String {
    format!("{:+.0}", value)
}
