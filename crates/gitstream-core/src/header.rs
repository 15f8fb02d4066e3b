// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit metadata lines
//!
//! The producing command prints four lines ahead of each commit's diff, each
//! led by a one-byte marker and a space:
//!
//! ```text
//! c <hash>
//! a <author name>
//! m <author email>
//! t <timestamp>
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::commit::Commit;
use crate::error::ParseError;

/// Width of the marker prefix (`"c "`, `"a "`, ...)
pub const MARKER_WIDTH: usize = 2;

/// The metadata field a line carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataTag {
    /// Commit hash, opens a new commit
    Hash,
    /// Author name
    AuthorName,
    /// Author email
    AuthorEmail,
    /// Commit timestamp
    Timestamp,
}

impl MetadataTag {
    /// All tags, in the order the producer prints them
    pub const ALL: [Self; 4] = [
        Self::Hash,
        Self::AuthorName,
        Self::AuthorEmail,
        Self::Timestamp,
    ];

    /// The marker byte leading lines of this kind
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            Self::Hash => b'c',
            Self::AuthorName => b'a',
            Self::AuthorEmail => b'm',
            Self::Timestamp => b't',
        }
    }

    /// Look up the tag for a marker byte
    #[must_use]
    pub fn from_marker(marker: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.marker() == marker)
    }

    /// Human-readable field name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::AuthorName => "author name",
            Self::AuthorEmail => "author email",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for MetadataTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a line as metadata, returning its tag and value.
///
/// A metadata line is a known marker byte followed by a single space.
#[must_use]
pub fn classify(line: &[u8]) -> Option<(MetadataTag, &[u8])> {
    match line {
        [marker, b' ', value @ ..] => MetadataTag::from_marker(*marker).map(|tag| (tag, value)),
        _ => None,
    }
}

/// Result of applying one metadata line to a [`CommitBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The field was recorded
    Set,
    /// The field already had a value; the repeat was ignored
    Repeated,
}

/// Accumulates one commit's metadata and files
#[derive(Debug, Clone)]
pub struct CommitBuilder {
    commit: Commit,
    author_name: bool,
    author_email: bool,
    timestamp: bool,
}

impl CommitBuilder {
    /// Start a commit from its hash line value
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            commit: Commit {
                hash: hash.into(),
                ..Commit::default()
            },
            author_name: false,
            author_email: false,
            timestamp: false,
        }
    }

    /// Hash of the commit being built
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.commit.hash
    }

    /// Record a non-hash metadata field; the first value wins
    pub fn apply(&mut self, tag: MetadataTag, value: &str) -> Applied {
        let (seen, field) = match tag {
            // A hash always opens a new builder, never lands here.
            MetadataTag::Hash => return Applied::Repeated,
            MetadataTag::AuthorName => (&mut self.author_name, &mut self.commit.author_name),
            MetadataTag::AuthorEmail => (&mut self.author_email, &mut self.commit.author_email),
            MetadataTag::Timestamp => (&mut self.timestamp, &mut self.commit.timestamp),
        };
        if *seen {
            return Applied::Repeated;
        }
        *seen = true;
        value.clone_into(field);
        Applied::Set
    }

    /// The first metadata field still missing, if any
    #[must_use]
    pub fn missing(&self) -> Option<MetadataTag> {
        if !self.author_name {
            Some(MetadataTag::AuthorName)
        } else if !self.author_email {
            Some(MetadataTag::AuthorEmail)
        } else if !self.timestamp {
            Some(MetadataTag::Timestamp)
        } else {
            None
        }
    }

    /// Number of files collected so far
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.commit.files.len()
    }

    /// Append a finished file
    pub fn push_file(&mut self, file: crate::commit::File) {
        self.commit.files.push(file);
    }

    /// Record that the file cap dropped files from this commit
    pub fn mark_files_truncated(&mut self) {
        self.commit.files_truncated = true;
    }

    /// Finish the commit, failing if any metadata field never arrived
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingMetadata` naming the first absent field.
    pub fn finish(self) -> Result<Commit, ParseError> {
        match self.missing() {
            Some(field) => Err(ParseError::MissingMetadata {
                hash: self.commit.hash,
                field,
            }),
            None => Ok(self.commit),
        }
    }
}
