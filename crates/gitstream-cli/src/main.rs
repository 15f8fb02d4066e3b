// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! gitstream: turn git log output into JSON commit records
//!
//! Reads `git log -p` output (with one-letter metadata lines ahead of each
//! commit) from a file or stdin and prints the parsed commits as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gitstream_cli::config::Config;
use gitstream_cli::run;

fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .init();

    config.validate().context("Invalid configuration")?;
    debug!(?config, "Starting gitstream");

    run::run(&config)?;
    Ok(())
}
