// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the gitstream command
//!
//! This module provides the command-line configuration: where the log comes
//! from, the parser caps, output format and logging options.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gitstream_core::ParseOptions;
use gitstream_core::line_source::{MAX_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};

use crate::run::OutputFormat;

/// gitstream - turn git log output into JSON commit records
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gitstream")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to parsing a log)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Read log output from this file instead of stdin
    ///
    /// The log is expected in the shape produced by
    /// `git log -p --format='c %H%na %an%nm %ae%nt %at'`.
    #[arg(short, long, env = "GITSTREAM_INPUT")]
    pub input: Option<PathBuf>,

    /// Maximum files kept per commit; the rest are skipped
    #[arg(long, env = "GITSTREAM_MAX_FILES")]
    pub max_files: Option<usize>,

    /// Maximum bytes of hunk content kept per file
    #[arg(long, env = "GITSTREAM_MAX_BYTES")]
    pub max_bytes: Option<usize>,

    /// Line buffer size in bytes
    ///
    /// Hunk lines longer than this are dropped and the file marked truncated.
    /// Defaults to the --max-bytes value, or 64 KiB. Accepts 64 bytes to 16 MiB.
    #[arg(long, env = "GITSTREAM_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Capture at most this many bytes of input before parsing
    ///
    /// The capture is cut back to the last complete line.
    #[arg(long, env = "GITSTREAM_CAPTURE_LIMIT")]
    pub capture_limit: Option<u64>,

    /// Print one commit per line as it is parsed instead of a JSON array
    #[arg(long, default_value = "false")]
    pub jsonl: bool,

    /// Enable verbose logging (debug level)
    ///
    /// Logs go to stderr so they never mix with the JSON on stdout.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a CSV file and print its header and rows as JSON
    ///
    /// Example:
    ///   gitstream csv data/releases.csv
    Csv {
        /// Path to the CSV file
        path: PathBuf,
    },
}

impl Config {
    /// Parser options built from the cap flags
    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_files_per_commit: self.max_files,
            max_bytes_per_file: self.max_bytes,
            buffer_capacity: self.buffer_size,
        }
    }

    /// Output format selected by `--jsonl`
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if self.jsonl {
            OutputFormat::JsonLines
        } else {
            OutputFormat::Pretty
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input or CSV path doesn't exist or isn't a file
    /// - The buffer size is outside the usable range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref input) = self.input {
            check_file(input)?;
        }
        if let Some(Command::Csv { ref path }) = self.command {
            check_file(path)?;
        }

        if let Some(size) = self.buffer_size {
            if size < MIN_BUFFER_CAPACITY {
                return Err(ConfigError::BufferTooSmall {
                    size,
                    min: MIN_BUFFER_CAPACITY,
                });
            }
            if size > MAX_BUFFER_CAPACITY {
                return Err(ConfigError::BufferTooLarge {
                    size,
                    max: MAX_BUFFER_CAPACITY,
                });
            }
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

fn check_file(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::InputNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ConfigError::InputNotFile(path.to_path_buf()));
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input path not found
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    /// Input path is not a regular file
    #[error("Input path is not a file: {0}")]
    InputNotFile(PathBuf),

    /// Buffer size below the minimum
    #[error("Buffer size {size} is below the minimum of {min} bytes")]
    BufferTooSmall {
        /// Requested size
        size: usize,
        /// Smallest accepted size
        min: usize,
    },

    /// Buffer size above the maximum
    #[error("Buffer size {size} is above the maximum of {max} bytes")]
    BufferTooLarge {
        /// Requested size
        size: usize,
        /// Largest accepted size
        max: usize,
    },
}
