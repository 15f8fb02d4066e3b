// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for gitstream-core

use thiserror::Error;

use crate::commit::Commit;
use crate::header::MetadataTag;

/// Errors that can occur while parsing a log stream
#[derive(Debug, Error)]
pub enum ParseError {
    /// Error reading the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A commit section closed before one of its metadata lines was seen
    #[error("Commit {hash} is missing its {field} line")]
    MissingMetadata {
        /// Hash of the incomplete commit
        hash: String,
        /// The metadata field that never arrived
        field: MetadataTag,
    },
}

/// A parse that stopped early, together with everything assembled before the failure
#[derive(Debug, Error)]
#[error("{source} (after {} complete commits)", commits.len())]
pub struct PartialParse {
    /// Commits fully assembled before the failure
    pub commits: Vec<Commit>,
    /// What stopped the parse
    pub source: ParseError,
}

impl PartialParse {
    /// Split into the salvaged commits and the error
    #[must_use]
    pub fn into_parts(self) -> (Vec<Commit>, ParseError) {
        (self.commits, self.source)
    }
}

/// Errors that can occur when reinterpreting file content as CSV
#[derive(Debug, Error)]
pub enum CsvError {
    /// The CSV reader rejected the content
    #[error("CSV parse error: {0}")]
    Malformed(#[from] csv::Error),

    /// The content has no header record
    #[error("CSV content is empty")]
    Empty,

    /// A row's column count differs from the header's
    #[error("CSV file has invalid row at index {row}: expected {expected} columns, found {found}")]
    InconsistentRowWidth {
        /// Record index of the offending row (the header is index 0)
        row: usize,
        /// Column count of the header
        expected: usize,
        /// Column count of the offending row
        found: usize,
    },
}
