// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Log stream parsing
//!
//! This module turns the output of a log command with per-commit metadata
//! lines and `-p` patches into [`Commit`] records. [`CommitStream`] yields one
//! commit at a time; [`parse_commits`] collects them.

use std::io::Read;

use tracing::{debug, trace, warn};

use crate::commit::Commit;
use crate::diff::{self, Boundary, DIFF_GIT_PREFIX, HeaderEnd, is_hash_line};
use crate::error::{ParseError, PartialParse};
use crate::header::{self, Applied, CommitBuilder, MetadataTag};
use crate::hunk;
use crate::line_source::{Line, LineSource};

/// Buffer size used when neither a buffer size nor a byte cap is configured
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Largest buffer derived from the byte cap alone
pub const MAX_DERIVED_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Caps and buffer sizing for a parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum files kept per commit (None = unlimited)
    pub max_files_per_commit: Option<usize>,
    /// Maximum bytes of hunk content kept per file (None = unlimited)
    pub max_bytes_per_file: Option<usize>,
    /// Line buffer size; lines longer than this are truncated in hunk bodies
    pub buffer_capacity: Option<usize>,
}

impl ParseOptions {
    /// Options with no caps
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Cap the number of files per commit
    #[must_use]
    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files_per_commit = Some(max);
        self
    }

    /// Cap the hunk content kept per file
    #[must_use]
    pub fn with_max_bytes(mut self, max: usize) -> Self {
        self.max_bytes_per_file = Some(max);
        self
    }

    /// Set the line buffer size explicitly
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// The buffer size requested from the line source, which clamps it to
    /// its own floor and ceiling
    ///
    /// Without an explicit size the buffer matches the byte cap, so a single
    /// line can never exceed the cap unnoticed.
    #[must_use]
    pub fn effective_buffer_capacity(&self) -> usize {
        self.buffer_capacity.unwrap_or_else(|| {
            self.max_bytes_per_file
                .map_or(DEFAULT_BUFFER_CAPACITY, |max| {
                    max.min(MAX_DERIVED_BUFFER_CAPACITY)
                })
        })
    }
}

enum State {
    AwaitingCommitHeader,
    ParsingCommitMetadata(CommitBuilder),
    ParsingDiffSection(CommitBuilder, Line),
    EndOfInput,
}

/// Streaming commit parser over any reader
///
/// Yields commits in stream order. After the first error the stream is
/// exhausted.
pub struct CommitStream<R> {
    source: LineSource<R>,
    options: ParseOptions,
    state: State,
}

impl<R: Read> CommitStream<R> {
    /// Create a parser over `reader`
    pub fn new(reader: R, options: ParseOptions) -> Self {
        let capacity = options.effective_buffer_capacity();
        Self {
            source: LineSource::new(reader, capacity),
            options,
            state: State::AwaitingCommitHeader,
        }
    }

    /// The options this stream was built with
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Number of input lines consumed so far
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.source.lines_read()
    }

    /// Run the state machine until a commit is complete or input ends
    fn advance(&mut self) -> Result<Option<Commit>, ParseError> {
        loop {
            match std::mem::replace(&mut self.state, State::EndOfInput) {
                State::EndOfInput => return Ok(None),

                State::AwaitingCommitHeader => {
                    let Some(line) = self
                        .source
                        .next_line_if(|fragment| header::classify(fragment).is_some())?
                    else {
                        return Ok(None);
                    };
                    self.state = State::AwaitingCommitHeader;
                    match metadata(&line) {
                        Some((MetadataTag::Hash, hash)) => {
                            trace!(%hash, "commit started");
                            self.state = State::ParsingCommitMetadata(CommitBuilder::new(hash));
                        }
                        Some((tag, _)) => {
                            warn!(
                                line = self.source.lines_read(),
                                field = %tag,
                                "metadata line before any commit, discarding"
                            );
                        }
                        None if line.is_blank() => {}
                        None => trace!(line = self.source.lines_read(), "skipping stray line"),
                    }
                }

                State::ParsingCommitMetadata(mut builder) => {
                    let Some(line) = self.source.next_line_if(keeps_whole_line)? else {
                        return builder.finish().map(Some);
                    };
                    match metadata(&line) {
                        Some((MetadataTag::Hash, hash)) => {
                            self.state = State::ParsingCommitMetadata(CommitBuilder::new(hash));
                            return builder.finish().map(Some);
                        }
                        Some((tag, value)) => {
                            if builder.apply(tag, &value) == Applied::Repeated {
                                warn!(
                                    hash = builder.hash(),
                                    field = %tag,
                                    "repeated metadata line, keeping the first value"
                                );
                            }
                            self.state = State::ParsingCommitMetadata(builder);
                        }
                        None if line.is_blank() => {
                            // git separates the metadata from the patch with a blank line.
                            match self.source.next_line_if(keeps_whole_line)? {
                                Some(next) if next.starts_with(DIFF_GIT_PREFIX) => {
                                    self.state = State::ParsingDiffSection(builder, next);
                                }
                                Some(next) => {
                                    self.source.unread(next);
                                    self.state = State::AwaitingCommitHeader;
                                    return builder.finish().map(Some);
                                }
                                None => return builder.finish().map(Some),
                            }
                        }
                        None => self.state = State::ParsingDiffSection(builder, line),
                    }
                }

                State::ParsingDiffSection(mut builder, first) => {
                    let boundary = self.parse_diff_section(&mut builder, first)?;
                    if boundary != Boundary::EndOfInput {
                        self.state = State::AwaitingCommitHeader;
                    }
                    return builder.finish().map(Some);
                }
            }
        }
    }

    /// Parse files until the commit's diff section ends.
    ///
    /// Returns `EndOfSection` or `EndOfInput`.
    fn parse_diff_section(
        &mut self,
        builder: &mut CommitBuilder,
        first: Line,
    ) -> Result<Boundary, ParseError> {
        let mut pending = Some(first);

        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => match self.source.next_line_if(diff::is_path_fragment)? {
                    Some(line) => line,
                    None => return Ok(Boundary::EndOfInput),
                },
            };

            if line.is_blank() {
                return Ok(Boundary::EndOfSection);
            }
            if is_hash_line(&line) {
                self.source.unread(line);
                return Ok(Boundary::EndOfSection);
            }
            if self
                .options
                .max_files_per_commit
                .is_some_and(|max| builder.file_count() >= max)
            {
                builder.mark_files_truncated();
                return Ok(self.drain_section(builder.hash(), &line)?);
            }

            let (mut file_header, end) = diff::read_file_header(&mut self.source, &line)?;
            let (boundary, closed) = match end {
                HeaderEnd::Body => {
                    let boundary = hunk::read_hunk_body(
                        &mut self.source,
                        file_header.file_mut(),
                        self.options.max_bytes_per_file,
                    )?;
                    (boundary, true)
                }
                HeaderEnd::Boundary(boundary) => (boundary, boundary != Boundary::EndOfInput),
            };

            match file_header.finish(closed) {
                Some(file) => {
                    if file.truncated {
                        debug!(
                            hash = builder.hash(),
                            file = %file.filename,
                            kept = file.content.len(),
                            "file content truncated"
                        );
                    }
                    builder.push_file(file);
                }
                None => warn!(
                    hash = builder.hash(),
                    line = self.source.lines_read(),
                    "could not resolve file path, discarding file record"
                ),
            }

            match boundary {
                Boundary::NextFile => {}
                Boundary::EndOfSection | Boundary::EndOfInput => return Ok(boundary),
            }
        }
    }

    /// Discard the rest of a diff section once the file cap is reached
    fn drain_section(&mut self, hash: &str, current: &Line) -> std::io::Result<Boundary> {
        let mut dropped = usize::from(current.starts_with(DIFF_GIT_PREFIX));

        let boundary = loop {
            let Some(line) = self.source.next_line_if(diff::is_boundary_fragment)? else {
                break Boundary::EndOfInput;
            };
            if line.is_blank() {
                break Boundary::EndOfSection;
            }
            if is_hash_line(&line) {
                self.source.unread(line);
                break Boundary::EndOfSection;
            }
            if line.starts_with(DIFF_GIT_PREFIX) {
                dropped += 1;
            }
        };

        debug!(hash, dropped, "file cap reached, dropped remaining files");
        Ok(boundary)
    }
}

impl<R: Read> Iterator for CommitStream<R> {
    type Item = Result<Commit, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(commit) => commit.map(Ok),
            Err(e) => {
                self.state = State::EndOfInput;
                Some(Err(e))
            }
        }
    }
}

/// Metadata values and path-bearing lines are reassembled past the buffer
fn keeps_whole_line(fragment: &[u8]) -> bool {
    header::classify(fragment).is_some() || diff::is_path_fragment(fragment)
}

/// Tag and value of a metadata line
fn metadata(line: &Line) -> Option<(MetadataTag, String)> {
    header::classify(&line.bytes)
        .map(|(tag, value)| (tag, String::from_utf8_lossy(value).into_owned()))
}

/// Parse every commit in `reader`.
///
/// # Errors
///
/// Returns `PartialParse` when the stream fails or a commit is missing a
/// metadata line; it carries the commits completed before the failure.
pub fn parse_commits<R: Read>(
    reader: R,
    options: &ParseOptions,
) -> Result<Vec<Commit>, PartialParse> {
    let mut stream = CommitStream::new(reader, options.clone());
    let mut commits = Vec::new();

    for item in stream.by_ref() {
        match item {
            Ok(commit) => commits.push(commit),
            Err(source) => {
                warn!(
                    commits = commits.len(),
                    line = stream.lines_read(),
                    error = %source,
                    "log parsing stopped early"
                );
                return Err(PartialParse { commits, source });
            }
        }
    }

    debug!(
        commits = commits.len(),
        lines = stream.lines_read(),
        "parsed log stream"
    );
    Ok(commits)
}

/// Parse commits from an in-memory log
///
/// # Errors
///
/// See [`parse_commits`].
pub fn parse_commits_str(log: &str, options: &ParseOptions) -> Result<Vec<Commit>, PartialParse> {
    parse_commits(log.as_bytes(), options)
}
