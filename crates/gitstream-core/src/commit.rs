// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit and changed-file records produced by the parser

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hunk::HunkRange;

/// One changed path within a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Current path of the file
    pub filename: String,
    /// Prior path, set for renames, copies and deletions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_filename: Option<String>,
    /// Raw hunk bytes, one `\n`-terminated line per kept diff line.
    ///
    /// Serialized as a JSON string; invalid UTF-8 is replaced there.
    #[serde(with = "lossy_text")]
    pub content: Vec<u8>,
    /// The file was introduced by this commit
    pub is_created: bool,
    /// The file was removed by this commit
    pub is_deleted: bool,
    /// git reported the change as binary
    pub is_binary: bool,
    /// Some hunk content was dropped by the byte cap or an oversized line
    pub truncated: bool,
    /// Number of `+` lines in the hunks
    pub insertions: usize,
    /// Number of `-` lines in the hunks
    pub deletions: usize,
}

impl File {
    /// Whether the file moved from another path (rename or copy)
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        !self.is_deleted
            && self
                .old_filename
                .as_deref()
                .is_some_and(|old| old != self.filename)
    }

    /// The kept content as text, replacing invalid UTF-8
    #[must_use]
    pub fn content_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Iterate over the kept content lines as text, without their terminators
    pub fn lines(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.content
            .split_inclusive(|&byte| byte == b'\n')
            .map(|line| String::from_utf8_lossy(line.strip_suffix(b"\n").unwrap_or(line)))
    }

    /// Decode the `@@` headers found in the kept content
    #[must_use]
    pub fn hunk_ranges(&self) -> Vec<HunkRange> {
        self.lines()
            .filter(|line| line.starts_with("@@"))
            .filter_map(|line| HunkRange::parse(&line))
            .collect()
    }
}

/// Raw bytes as a JSON string
mod lossy_text {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}

/// One historical change set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit hash
    pub hash: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Commit timestamp, verbatim from the log
    pub timestamp: String,
    /// Changed files in stream order
    pub files: Vec<File>,
    /// The file cap dropped some of this commit's files
    #[serde(default)]
    pub files_truncated: bool,
}

impl Commit {
    /// Get the short hash (first 7 characters)
    #[must_use]
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map_or(self.hash.len(), |(idx, _)| idx);
        &self.hash[..end]
    }

    /// Decode the timestamp as unix seconds or RFC 3339
    #[must_use]
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.trim();
        if let Ok(seconds) = raw.parse::<i64>() {
            return DateTime::from_timestamp(seconds, 0);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Sum of insertions across all files
    #[must_use]
    pub fn total_insertions(&self) -> usize {
        self.files.iter().map(|f| f.insertions).sum()
    }

    /// Sum of deletions across all files
    #[must_use]
    pub fn total_deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions).sum()
    }

    /// Whether the commit carries no file changes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
