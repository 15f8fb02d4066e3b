// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CSV reinterpretation of file content

use serde::{Deserialize, Serialize};

use crate::error::CsvError;

/// A rectangular table read from CSV text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvTable {
    /// The first record
    pub header: Vec<String>,
    /// Every following record, each as wide as the header
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Number of columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Look up a cell by row index and column name
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.header.iter().position(|name| name == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Parse CSV `content` into a header and rows.
///
/// # Errors
///
/// - `CsvError::Empty` when there is no header record
/// - `CsvError::InconsistentRowWidth` for the first row whose width differs
///   from the header (rows are counted from 1, the header being 0)
/// - `CsvError::Malformed` when the reader rejects the content
pub fn parse_csv(content: &str) -> Result<CsvTable, CsvError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => to_strings(&record?),
        None => return Err(CsvError::Empty),
    };

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        if record.len() != header.len() {
            return Err(CsvError::InconsistentRowWidth {
                row: index + 1,
                expected: header.len(),
                found: record.len(),
            });
        }
        rows.push(to_strings(&record));
    }

    Ok(CsvTable { header, rows })
}

fn to_strings(record: &::csv::StringRecord) -> Vec<String> {
    record.iter().map(str::to_string).collect()
}
