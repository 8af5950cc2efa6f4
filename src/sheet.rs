//! Uploaded matchup sheets.
//!
//! Reads a CSV with a header row into an in-memory table of raw cells.
//! Cells are kept as text so extra columns pass through untouched and the
//! export reproduces the upload byte-for-byte apart from zero-filled cells.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

use crate::types::PipelineError;

/// Cell contents read as "no value" (the pandas default NA tokens).
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell counts as absent and is zero-filled before scoring.
pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// A CSV row set as uploaded.
#[derive(Debug, Clone, Default)]
pub struct MatchupSheet {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl MatchupSheet {
    /// Parse a UTF-8 CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut records = Vec::new();
        for record in rdr.records() {
            let record = record?;
            records.push(record.iter().map(str::to_string).collect());
        }

        debug!(columns = headers.len(), rows = records.len(), "Sheet parsed");
        Ok(Self { headers, records })
    }

    /// Parse CSV text (e.g. an HTTP request body).
    pub fn from_csv_str(text: &str) -> Result<Self, PipelineError> {
        Self::from_reader(text.as_bytes())
    }

    /// Read a CSV file from disk.
    pub fn from_path(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open input file: {path}"))?;
        let sheet = Self::from_reader(file)
            .with_context(|| format!("Failed to parse input file: {path}"))?;
        Ok(sheet)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// The set of column names present, exactly as written in the header.
    pub fn columns(&self) -> HashSet<&str> {
        self.headers.iter().map(String::as_str).collect()
    }

    /// Index of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
