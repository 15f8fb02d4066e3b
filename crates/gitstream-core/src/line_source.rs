// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Bounded line reader
//!
//! [`LineSource`] wraps a byte stream in a fixed-capacity buffer and hands out
//! one logical line at a time. A line longer than the buffer arrives in
//! several fragments; callers choose between reassembling it
//! ([`LineSource::next_line`]) or keeping only the first fragment and
//! discarding the rest ([`LineSource::next_line_bounded`]).
//! [`LineSource::next_line_if`] decides per line from its first fragment.

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};

use memchr::memchr;

/// Smallest buffer the source will use. Every structural prefix of the log
/// format fits in a fragment of this size.
pub const MIN_BUFFER_CAPACITY: usize = 64;

/// Largest buffer the source will allocate, whatever is requested
pub const MAX_BUFFER_CAPACITY: usize = 16 * 1024 * 1024;

/// One logical line with its terminator stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Raw bytes of the line (or of its first fragment, in bounded mode)
    pub bytes: Vec<u8>,
    /// The raw line was longer than the buffer capacity
    pub fragmented: bool,
}

impl Line {
    /// Build a complete, unfragmented line
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            fragmented: false,
        }
    }

    /// An empty line, the separator between log sections
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.bytes.is_empty() && !self.fragmented
    }

    /// Byte prefix test
    #[must_use]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.starts_with(prefix)
    }

    /// The line as text, replacing invalid UTF-8
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

enum Fragment {
    /// The terminator (or end of stream) was reached
    Complete,
    /// The buffer filled before the terminator
    Partial,
    /// Nothing left to read
    End,
}

/// Reads terminated lines from a stream through a bounded buffer
pub struct LineSource<R> {
    reader: BufReader<R>,
    capacity: usize,
    pending: Option<Line>,
    lines_read: usize,
}

impl<R: Read> LineSource<R> {
    /// Wrap `inner` with a buffer of `capacity` bytes, clamped to
    /// [`MIN_BUFFER_CAPACITY`]..=[`MAX_BUFFER_CAPACITY`]
    pub fn new(inner: R, capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_BUFFER_CAPACITY, MAX_BUFFER_CAPACITY);
        Self {
            reader: BufReader::with_capacity(capacity, inner),
            capacity,
            pending: None,
            lines_read: 0,
        }
    }

    /// Buffer capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of physical lines consumed from the stream so far
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Push a line back so the next read returns it again.
    ///
    /// Only one line of lookahead is kept; a second call replaces the first.
    pub fn unread(&mut self, line: Line) {
        self.pending = Some(line);
    }

    /// Read the next logical line, reassembling it if it spans several fragments.
    ///
    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the stream cannot be read.
    pub fn next_line(&mut self) -> io::Result<Option<Line>> {
        self.next_line_if(|_| true)
    }

    /// Read the next line but keep at most one buffer of it.
    ///
    /// When the line is longer than the buffer, its first fragment is returned
    /// with `fragmented` set and the remainder is consumed and discarded.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the stream cannot be read.
    pub fn next_line_bounded(&mut self) -> io::Result<Option<Line>> {
        self.next_line_if(|_| false)
    }

    /// Read the next line, reassembling it only when `keep_whole` accepts its
    /// first fragment.
    ///
    /// A rejected long line comes back as its first fragment with
    /// `fragmented` set; the rest is consumed without being stored. A line
    /// pushed back with [`LineSource::unread`] is returned as it was.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the stream cannot be read.
    pub fn next_line_if<F>(&mut self, keep_whole: F) -> io::Result<Option<Line>>
    where
        F: Fn(&[u8]) -> bool,
    {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }

        let mut bytes = Vec::new();
        let fragmented = match self.read_fragment(&mut bytes)? {
            Fragment::End => return Ok(None),
            Fragment::Complete => false,
            Fragment::Partial if keep_whole(bytes.as_slice()) => {
                while let Fragment::Partial = self.read_fragment(&mut bytes)? {}
                true
            }
            Fragment::Partial => {
                self.skip_rest_of_line()?;
                true
            }
        };

        self.lines_read += 1;
        Ok(Some(Line { bytes, fragmented }))
    }

    /// Append at most one buffer's worth of the current line to `out`
    fn read_fragment(&mut self, out: &mut Vec<u8>) -> io::Result<Fragment> {
        let mut taken = 0;
        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                return Ok(if taken == 0 {
                    Fragment::End
                } else {
                    Fragment::Complete
                });
            }

            if taken == self.capacity {
                // A line of exactly `capacity` bytes is still whole.
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    strip_carriage_return(out);
                    return Ok(Fragment::Complete);
                }
                return Ok(Fragment::Partial);
            }

            let room = self.capacity - taken;
            let window = &available[..available.len().min(room)];
            if let Some(idx) = memchr(b'\n', window) {
                out.extend_from_slice(&window[..idx]);
                self.reader.consume(idx + 1);
                strip_carriage_return(out);
                return Ok(Fragment::Complete);
            }

            let len = window.len();
            out.extend_from_slice(window);
            self.reader.consume(len);
            taken += len;
        }
    }

    /// Consume bytes up to and including the next terminator without keeping them
    fn skip_rest_of_line(&mut self) -> io::Result<()> {
        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                return Ok(());
            }

            match memchr(b'\n', available) {
                Some(idx) => {
                    self.reader.consume(idx + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                }
            }
        }
    }
}

fn strip_carriage_return(bytes: &mut Vec<u8>) {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
}
