// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! gitstream-cli library
//!
//! This module exports the configuration and command execution of the
//! `gitstream` binary for use in integration tests.

pub mod config;
pub mod run;
