// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Byte-limited capture of command output

use std::io::{self, Read};

use memchr::memrchr;
use serde::Serialize;
use tracing::debug;

/// Text captured from a stream, possibly cut short
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CappedText {
    /// The captured text
    pub text: String,
    /// The stream held more than the limit allowed
    pub truncated: bool,
}

/// Read `reader` to the end, keeping at most `max_bytes` bytes.
///
/// When the stream is longer than the limit the kept bytes are cut back to
/// the last newline (which is dropped), so the text never ends mid-line. A
/// limit of `None` reads everything.
///
/// # Errors
///
/// Returns the underlying I/O error if the stream cannot be read.
pub fn truncate_to_byte_limit<R: Read>(
    mut reader: R,
    max_bytes: Option<u64>,
) -> io::Result<CappedText> {
    let mut buf = Vec::new();

    let Some(max) = max_bytes else {
        reader.read_to_end(&mut buf)?;
        return Ok(CappedText {
            text: String::from_utf8_lossy(&buf).into_owned(),
            truncated: false,
        });
    };

    // One byte past the limit tells a full stream apart from an exact fit.
    reader.take(max.saturating_add(1)).read_to_end(&mut buf)?;
    let truncated = buf.len() as u64 > max;
    if truncated {
        let end = memrchr(b'\n', &buf[..buf.len() - 1]).unwrap_or(0);
        buf.truncate(end);
        debug!(limit = max, kept = buf.len(), "captured output truncated");
    }

    Ok(CappedText {
        text: String::from_utf8_lossy(&buf).into_owned(),
        truncated,
    })
}
