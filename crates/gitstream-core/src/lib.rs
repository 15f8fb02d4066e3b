// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! gitstream-core: Bounded streaming parser for git log output
//!
//! This library crate turns the text of `git log -p` (with one-letter
//! metadata lines ahead of each commit) into [`Commit`] records, holding at
//! most one commit in memory and capping both files per commit and bytes per
//! file.

#![warn(missing_docs)]

//! # Example
//!
//! ```
//! use gitstream_core::{ParseOptions, parse_commits};
//!
//! let log = "c 0123abcd\na Ada\nm ada@example.com\nt 1768617186\n\n\
//!            diff --git a/hello.txt b/hello.txt\n\
//!            --- a/hello.txt\n+++ b/hello.txt\n@@ -1 +1 @@\n-hi\n+hello\n";
//!
//! let commits = parse_commits(log.as_bytes(), &ParseOptions::unlimited().with_max_files(50))
//!     .expect("parse log");
//!
//! for c in &commits {
//!     println!("{} {} ({} files)", c.short_hash(), c.author_name, c.files.len());
//! }
//! assert_eq!(commits[0].files[0].filename, "hello.txt");
//! ```

pub mod commit;
pub mod diff;
pub mod error;
pub mod header;
pub mod hunk;
pub mod line_source;
pub mod parser;
pub mod table;
pub mod truncate;

pub use commit::{Commit, File};
pub use error::{CsvError, ParseError, PartialParse};
pub use hunk::HunkRange;
pub use parser::{CommitStream, ParseOptions, parse_commits, parse_commits_str};
pub use table::{CsvTable, parse_csv};
pub use truncate::{CappedText, truncate_to_byte_limit};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{Commit, File};
    pub use crate::error::{ParseError, PartialParse};
    pub use crate::parser::{CommitStream, ParseOptions, parse_commits};
}
