// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Command execution
//!
//! Reads the log, parses it with the configured caps and writes commits as
//! JSON. Everything here takes its reader and writer as parameters so the
//! whole flow can run against in-memory buffers.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use gitstream_core::{
    Commit, CommitStream, CsvError, CsvTable, ParseError, ParseOptions, parse_csv,
    truncate_to_byte_limit,
};
use serde::ser::{SerializeSeq, Serializer as _};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Command, Config};

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while running a command
#[derive(Debug, Error)]
pub enum RunError {
    /// An input file could not be read
    #[error("Failed to read {path}: {source}")]
    Input {
        /// The file that failed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Reading stdin or writing stdout failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV content was rejected
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// Parsing stopped early; the commits before the failure were written
    #[error("Log parsing stopped after {} commits: {source}", stats.commits)]
    Partial {
        /// What was written before the failure
        stats: RunStats,
        /// What stopped the parse
        source: ParseError,
    },
}

// ============================================================================
// Output
// ============================================================================

/// How commits are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One pretty-printed JSON array
    #[default]
    Pretty,
    /// One compact JSON object per line, written as each commit completes
    JsonLines,
}

/// Totals over the commits written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Commits written
    pub commits: usize,
    /// Files across all commits
    pub files: usize,
    /// Files whose content was cut by a cap
    pub truncated_files: usize,
    /// Commits that lost files to the file cap
    pub capped_commits: usize,
}

impl RunStats {
    fn record(&mut self, commit: &Commit) {
        self.commits += 1;
        self.files += commit.files.len();
        self.truncated_files += commit.files.iter().filter(|f| f.truncated).count();
        if commit.files_truncated {
            self.capped_commits += 1;
        }
    }
}

/// Feed each commit of `stream` to `emit`, stopping at the first parse error.
///
/// Returns that error, if any, once everything before it has been emitted.
fn drain_stream<R, F>(
    stream: CommitStream<R>,
    stats: &mut RunStats,
    mut emit: F,
) -> Result<Option<ParseError>, RunError>
where
    R: Read,
    F: FnMut(&Commit) -> Result<(), RunError>,
{
    for item in stream {
        match item {
            Ok(commit) => {
                emit(&commit)?;
                stats.record(&commit);
            }
            Err(source) => return Ok(Some(source)),
        }
    }
    Ok(None)
}

/// Parse `reader` and write its commits to `out` as each one completes.
///
/// Both formats hold at most one commit in memory. On a parse failure the
/// commits completed before it are still written (the pretty array is
/// closed), then `RunError::Partial` is returned.
///
/// # Errors
///
/// Returns an error if parsing stops early or the output cannot be written.
pub fn write_commits<R: Read, W: Write>(
    reader: R,
    options: &ParseOptions,
    format: OutputFormat,
    out: W,
) -> Result<RunStats, RunError> {
    let mut out = BufWriter::new(out);
    let stream = CommitStream::new(reader, options.clone());
    let mut stats = RunStats::default();

    let failure = match format {
        OutputFormat::Pretty => {
            let mut serializer = serde_json::Serializer::pretty(&mut out);
            let mut seq = serializer.serialize_seq(None)?;
            let failure = drain_stream(stream, &mut stats, |commit| {
                Ok(seq.serialize_element(commit)?)
            })?;
            seq.end()?;
            writeln!(out)?;
            failure
        }
        OutputFormat::JsonLines => drain_stream(stream, &mut stats, |commit| {
            serde_json::to_writer(&mut out, commit)?;
            writeln!(out)?;
            Ok(())
        })?,
    };

    out.flush()?;
    match failure {
        Some(source) => Err(RunError::Partial { stats, source }),
        None => Ok(stats),
    }
}

/// Capture at most `limit` bytes of `reader`, then parse and write the capture
///
/// # Errors
///
/// See [`write_commits`]; capture read failures are returned as `RunError::Io`.
pub fn write_captured_commits<R: Read, W: Write>(
    reader: R,
    limit: u64,
    options: &ParseOptions,
    format: OutputFormat,
    out: W,
) -> Result<RunStats, RunError> {
    let captured = truncate_to_byte_limit(reader, Some(limit))?;
    if captured.truncated {
        warn!(
            limit,
            kept = captured.text.len(),
            "Input exceeded the capture limit, parsing the captured prefix"
        );
    }
    write_commits(captured.text.as_bytes(), options, format, out)
}

/// Parse CSV `content` and write the table as JSON
///
/// # Errors
///
/// Returns an error if the content is not a rectangular CSV table or the
/// output cannot be written.
pub fn write_csv_table<W: Write>(content: &str, out: W) -> Result<CsvTable, RunError> {
    let table = parse_csv(content)?;
    let mut out = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, &table)?;
    writeln!(out)?;
    out.flush()?;
    Ok(table)
}

fn read_file(path: &Path) -> Result<String, RunError> {
    fs::read_to_string(path).map_err(|source| RunError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Execute the command described by `config`, writing results to stdout
///
/// # Errors
///
/// Returns any error from reading input, parsing, or writing output.
pub fn run(config: &Config) -> Result<(), RunError> {
    let stdout = io::stdout().lock();

    if let Some(Command::Csv { ref path }) = config.command {
        let content = read_file(path)?;
        let table = write_csv_table(&content, stdout)?;
        info!(
            path = %path.display(),
            columns = table.width(),
            rows = table.rows.len(),
            "CSV table written"
        );
        return Ok(());
    }

    let input: Box<dyn Read> = match config.input {
        Some(ref path) => Box::new(fs::File::open(path).map_err(|source| RunError::Input {
            path: path.clone(),
            source,
        })?),
        None => Box::new(io::stdin().lock()),
    };

    let options = config.parse_options();
    debug!(?options, format = ?config.output_format(), "Parsing log");

    let stats = match config.capture_limit {
        Some(limit) => {
            write_captured_commits(input, limit, &options, config.output_format(), stdout)?
        }
        None => write_commits(input, &options, config.output_format(), stdout)?,
    };

    info!(
        commits = stats.commits,
        files = stats.files,
        truncated_files = stats.truncated_files,
        capped_commits = stats.capped_commits,
        "Log parsed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const LOG: &str = "\
c aaa
a Ada
m ada@example.com
t 1768617186

diff --git a/x.txt b/x.txt
--- a/x.txt
+++ b/x.txt
@@ -1 +1 @@
-old
+new
c bbb
a Grace
m grace@example.com
t 1768617000
";

    #[test]
    fn test_pretty_output_is_array() {
        let mut out = Vec::new();
        let stats = write_commits(
            LOG.as_bytes(),
            &ParseOptions::unlimited(),
            OutputFormat::Pretty,
            &mut out,
        )
        .expect("run");
        assert_eq!(stats.commits, 2);
        assert_eq!(stats.files, 1);

        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["files"][0]["filename"], "x.txt");
    }

    #[test]
    fn test_jsonl_output_has_one_line_per_commit() {
        let mut out = Vec::new();
        write_commits(
            LOG.as_bytes(),
            &ParseOptions::unlimited(),
            OutputFormat::JsonLines,
            &mut out,
        )
        .expect("run");

        let text = String::from_utf8(out).expect("utf8");
        let hashes: Vec<String> = text
            .lines()
            .map(|line| {
                let commit: Commit = serde_json::from_str(line).expect("commit json");
                commit.hash
            })
            .collect();
        assert_eq!(hashes, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_partial_parse_still_writes_commits() {
        let log = format!("{LOG}c ccc\na Nobody\n");
        for format in [OutputFormat::Pretty, OutputFormat::JsonLines] {
            let mut out = Vec::new();
            let err = write_commits(log.as_bytes(), &ParseOptions::unlimited(), format, &mut out)
                .expect_err("incomplete commit");
            match err {
                RunError::Partial { stats, source } => {
                    assert_eq!(stats.commits, 2);
                    assert!(matches!(source, ParseError::MissingMetadata { .. }));
                }
                other => panic!("Expected Partial, got {other:?}"),
            }
            assert!(String::from_utf8_lossy(&out).contains("\"bbb\""));
        }
    }

    /// Reader that notes whether output appeared before the input was used up
    struct Watched {
        data: Vec<u8>,
        pos: usize,
        written: Rc<RefCell<Vec<u8>>>,
        output_before_end: Rc<Cell<bool>>,
    }

    impl Read for Watched {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos < self.data.len() && !self.written.borrow().is_empty() {
                self.output_before_end.set(true);
            }
            let n = (self.data.len() - self.pos).min(buf.len()).min(256);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn many_commits(count: usize) -> String {
        (0..count)
            .map(|i| {
                format!(
                    "c {i:040x}\na Author {i}\nm author{i}@example.com\nt 1768617186\n\n\
                     diff --git a/f{i}.txt b/f{i}.txt\n--- a/f{i}.txt\n+++ b/f{i}.txt\n\
                     @@ -1 +1 @@\n-old {i}\n+new {i}\n"
                )
            })
            .collect()
    }

    #[test]
    fn test_output_is_written_while_input_remains() {
        for format in [OutputFormat::Pretty, OutputFormat::JsonLines] {
            let written = Rc::new(RefCell::new(Vec::new()));
            let output_before_end = Rc::new(Cell::new(false));
            let reader = Watched {
                data: many_commits(300).into_bytes(),
                pos: 0,
                written: Rc::clone(&written),
                output_before_end: Rc::clone(&output_before_end),
            };
            let options = ParseOptions::unlimited().with_buffer_capacity(1024);

            let stats = write_commits(reader, &options, format, Shared(Rc::clone(&written)))
                .expect("run");
            assert_eq!(stats.commits, 300);
            assert!(output_before_end.get(), "{format:?} waited for the whole input");
        }
    }

    #[test]
    fn test_streamed_pretty_output_matches_collected() {
        let log = many_commits(5);
        let mut out = Vec::new();
        write_commits(
            log.as_bytes(),
            &ParseOptions::unlimited(),
            OutputFormat::Pretty,
            &mut out,
        )
        .expect("run");

        let streamed: Vec<Commit> = serde_json::from_slice(&out).expect("json array");
        let collected =
            gitstream_core::parse_commits_str(&log, &ParseOptions::unlimited()).expect("parse");
        assert_eq!(streamed, collected);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            format!("{}\n", serde_json::to_string_pretty(&collected).expect("json"))
        );
    }

    #[test]
    fn test_stats_count_caps() {
        let mut out = Vec::new();
        let stats = write_commits(
            LOG.as_bytes(),
            &ParseOptions::unlimited().with_max_files(0),
            OutputFormat::Pretty,
            &mut out,
        )
        .expect("run");
        assert_eq!(stats.files, 0);
        assert_eq!(stats.capped_commits, 1);
    }

    #[test]
    fn test_capture_limit_cuts_input() {
        let mut out = Vec::new();
        let limit = LOG.find("c bbb").expect("second commit") as u64;
        let stats = write_captured_commits(
            LOG.as_bytes(),
            limit,
            &ParseOptions::unlimited(),
            OutputFormat::Pretty,
            &mut out,
        )
        .expect("run");
        assert_eq!(stats.commits, 1);
    }

    #[test]
    fn test_csv_table_output() {
        let mut out = Vec::new();
        let table = write_csv_table("a,b\n1,2\n", &mut out).expect("csv");
        assert_eq!(table.rows.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["header"][1], "b");
        assert_eq!(value["rows"][0][0], "1");
    }

    #[test]
    fn test_csv_table_error() {
        let err = write_csv_table("a,b\n1\n", Vec::new()).expect_err("ragged");
        assert!(matches!(
            err,
            RunError::Csv(CsvError::InconsistentRowWidth { row: 1, .. })
        ));
    }
}
