//! Record loader for delimited ownership disclosure files
//!
//! Every file in a directory with the configured extension is read with its
//! own header row. Rows keep their raw string cells; typing happens later in
//! [`crate::cleaner`].

use crate::error::{OwnershipError, Result};
use csv::ReaderBuilder;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column holding the reporting date
pub const DATE_COLUMN: &str = "Date";
/// Column holding the instrument code
pub const CODE_COLUMN: &str = "Code";
/// Column holding the instrument type
pub const TYPE_COLUMN: &str = "Type";
/// Column attached by the loader with the file's base name
pub const SOURCE_FILE_COLUMN: &str = "SourceFile";

/// Input file format configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field delimiter (single ASCII character)
    pub delimiter: char,
    /// File extension to pick up, without the dot
    pub extension: String,
    /// chrono format string for the `Date` column
    pub date_format: String,
    /// Instrument types treated as equity (compared case-insensitively)
    pub equity_types: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: '|',
            extension: "txt".to_string(),
            date_format: "%d-%b-%Y".to_string(),
            equity_types: vec!["EQ".to_string(), "EQUITY".to_string(), "S".to_string()],
        }
    }
}

impl LoaderConfig {
    /// Delimiter as the byte the csv reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(OwnershipError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }
}

/// One raw row: string cells keyed by trimmed header name
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Base name of the file the row came from
    pub source_file: String,
    fields: HashMap<String, String>,
}

impl RawRecord {
    /// Create a record from (column, value) pairs
    pub fn new<I, K, V>(source_file: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source_file: source_file.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw cell for a column; `SourceFile` resolves to the file tag
    pub fn get(&self, column: &str) -> Option<&str> {
        if column == SOURCE_FILE_COLUMN {
            return Some(self.source_file.as_str());
        }
        self.fields.get(column).map(|s| s.as_str())
    }
}

/// Union of the rows of every loaded file
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in first-seen order, `SourceFile` last
    columns: Vec<String>,
    records: Vec<RawRecord>,
    files: Vec<String>,
}

impl RawTable {
    /// Create new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from in-memory records (column order follows `columns`)
    pub fn from_records(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        let mut table = Self::new();
        for column in columns {
            table.add_column(column.trim());
        }
        for record in &records {
            if !table.files.contains(&record.source_file) {
                table.files.push(record.source_file.clone());
            }
        }
        table.records = records;
        table
    }

    fn add_column(&mut self, name: &str) {
        if name != SOURCE_FILE_COLUMN && !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    /// Append another table (typically one file) to this one
    pub fn append(&mut self, other: RawTable) {
        for column in &other.columns {
            self.add_column(column);
        }
        for file in other.files {
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
        self.records.extend(other.records);
    }

    /// Column names, including the `SourceFile` tag
    pub fn columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .chain(std::iter::once(SOURCE_FILE_COLUMN))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == SOURCE_FILE_COLUMN || self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Base names of the files that contributed rows or headers
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Directory loader for pipe-delimited disclosure files
#[derive(Debug, Clone, Default)]
pub struct RecordLoader {
    config: LoaderConfig,
}

impl RecordLoader {
    /// Create new loader with the default format
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom format
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// List the files `load_dir` would read, in sorted order
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(OwnershipError::data_source(dir, "not a directory"));
        }

        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            self.config.extension
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| OwnershipError::data_source(dir, format!("invalid file pattern: {}", e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path =
                entry.map_err(|e| OwnershipError::data_source(e.path(), e.error().to_string()))?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load and concatenate every matching file in a directory
    pub fn load_dir(&self, dir: &Path) -> Result<RawTable> {
        let files = self.discover(dir)?;
        if files.is_empty() {
            return Err(OwnershipError::data_source(
                dir,
                format!("no *.{} files found", self.config.extension),
            ));
        }

        let mut table = RawTable::new();
        for path in &files {
            table.append(self.load_file(path)?);
        }

        log::info!(
            "Loaded {} rows from {} files in {}",
            table.len(),
            files.len(),
            dir.display()
        );
        Ok(table)
    }

    /// Load a single delimited file, tagging rows with its base name
    pub fn load_file(&self, path: &Path) -> Result<RawTable> {
        let delimiter = self.config.delimiter_byte()?;
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_path(path)
            .map_err(|e| OwnershipError::data_source(path, format!("failed to open: {}", e)))?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| {
                OwnershipError::data_source(path, format!("failed to read header: {}", e))
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.len() < 2 {
            return Err(OwnershipError::data_source(
                path,
                format!(
                    "header has {} column(s); expected '{}'-delimited fields",
                    headers.len(),
                    self.config.delimiter
                ),
            ));
        }

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                OwnershipError::data_source(path, format!("failed to read record: {}", e))
            })?;
            let fields = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()));
            records.push(RawRecord::new(source_file.clone(), fields));
        }

        log::debug!("{}: {} rows, {} columns", source_file, records.len(), headers.len());

        let mut table = RawTable::from_records(headers, records);
        if !table.files.contains(&source_file) {
            table.files.push(source_file);
        }
        Ok(table)
    }
}
