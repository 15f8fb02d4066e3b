// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-file diff headers
//!
//! Everything between a `diff --git` line and the first hunk (or the next
//! file) is the file's header. It decides which path the file has now, which
//! path it had before, and whether it was created, deleted or is binary.

use std::borrow::Cow;
use std::io::{self, Read};
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::commit::File;
use crate::header::{self, MetadataTag};
use crate::line_source::{Line, LineSource};

/// Prefix of the line opening each file's diff
pub const DIFF_GIT_PREFIX: &[u8] = b"diff --git ";

/// Unquoted paths may contain spaces; the old side stops at the first ` b/`.
static DIFF_GIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^diff --git ("a/(?:[^"\\]|\\.)*"|a/.+?) ("b/(?:[^"\\]|\\.)*"|b/.+)$"#)
        .expect("diff --git pattern is valid")
});

/// Where a file's region stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The next file's `diff --git` line was read and pushed back
    NextFile,
    /// The commit's diff section ended (blank line, or the next commit's hash line pushed back)
    EndOfSection,
    /// The stream ended
    EndOfInput,
}

/// How a file header ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderEnd {
    /// Hunk lines follow
    Body,
    /// The file has no hunk lines
    Boundary(Boundary),
}

/// One recognised line of a file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine<'a> {
    /// `diff --git a/<old> b/<new>`; paths are `None` if the line could not be split
    DiffGit(Option<(Cow<'a, str>, Cow<'a, str>)>),
    /// `rename from <path>`
    RenameFrom(Cow<'a, str>),
    /// `rename to <path>`
    RenameTo(Cow<'a, str>),
    /// `copy from <path>`
    CopyFrom(Cow<'a, str>),
    /// `copy to <path>`
    CopyTo(Cow<'a, str>),
    /// `new file mode ...`
    NewFile,
    /// `deleted file mode ...`
    DeletedFile,
    /// `--- <path>`
    OldPath(Cow<'a, str>),
    /// `+++ <path>`
    NewPath(Cow<'a, str>),
    /// `Binary files ... differ` or `GIT binary patch`
    Binary,
    /// Mode, index and similarity lines
    Ignored,
    /// Anything else
    Unknown,
}

impl<'a> HeaderLine<'a> {
    /// Recognise a header line
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        if line.starts_with("diff --git ") {
            return Self::DiffGit(split_diff_git(line));
        }
        if let Some(path) = line.strip_prefix("rename from ") {
            return Self::RenameFrom(unquote(path));
        }
        if let Some(path) = line.strip_prefix("rename to ") {
            return Self::RenameTo(unquote(path));
        }
        if let Some(path) = line.strip_prefix("copy from ") {
            return Self::CopyFrom(unquote(path));
        }
        if let Some(path) = line.strip_prefix("copy to ") {
            return Self::CopyTo(unquote(path));
        }
        if let Some(path) = line.strip_prefix("--- ") {
            return Self::OldPath(unquote(trim_path_tab(path)));
        }
        if let Some(path) = line.strip_prefix("+++ ") {
            return Self::NewPath(unquote(trim_path_tab(path)));
        }
        if line.starts_with("new file") {
            return Self::NewFile;
        }
        if line.starts_with("deleted file") {
            return Self::DeletedFile;
        }
        if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            return Self::Binary;
        }
        const IGNORED: [&str; 5] = [
            "old mode",
            "new mode",
            "index ",
            "similarity index",
            "dissimilarity index",
        ];
        if IGNORED.iter().any(|prefix| line.starts_with(prefix)) {
            return Self::Ignored;
        }
        Self::Unknown
    }
}

/// Split `diff --git` into its two paths, without their `a/` and `b/` prefixes
fn split_diff_git(line: &str) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
    let caps = DIFF_GIT.captures(line)?;
    let old = caps.get(1)?.as_str();
    let new = caps.get(2)?.as_str();
    let old = strip_side(unquote(old), "a/");
    let new = strip_side(unquote(new), "b/");
    Some((old, new))
}

/// git appends a tab to `---`/`+++` paths containing spaces
fn trim_path_tab(path: &str) -> &str {
    path.strip_suffix('\t').unwrap_or(path)
}

/// Remove a leading `a/` or `b/`
fn strip_side<'a>(path: Cow<'a, str>, side: &str) -> Cow<'a, str> {
    match path {
        Cow::Borrowed(p) => Cow::Borrowed(p.strip_prefix(side).unwrap_or(p)),
        Cow::Owned(p) => match p.strip_prefix(side) {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(p),
        },
    }
}

/// Decode a C-style quoted path as git prints it (`"a/caf\303\251.txt"`)
#[must_use]
pub fn unquote(path: &str) -> Cow<'_, str> {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return Cow::Borrowed(path);
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.bytes().peekable();
    while let Some(byte) = chars.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

/// Accumulates one file's header, then owns the file while its hunks are read
#[derive(Debug, Default)]
pub struct FileHeader {
    file: File,
    tentative: Option<(String, String)>,
    old_path: Option<String>,
    new_path: Option<String>,
    explicit_pair: bool,
}

impl FileHeader {
    /// Fold one header line into the record
    pub fn apply(&mut self, line: &HeaderLine<'_>) {
        match line {
            HeaderLine::DiffGit(Some((old, new))) => {
                if self.tentative.is_none() {
                    self.tentative = Some((old.to_string(), new.to_string()));
                }
            }
            HeaderLine::RenameFrom(path) | HeaderLine::CopyFrom(path) => {
                self.old_path = Some(strip_side(path.clone(), "a/").into_owned());
                self.explicit_pair = true;
            }
            HeaderLine::RenameTo(path) | HeaderLine::CopyTo(path) => {
                self.new_path = Some(strip_side(path.clone(), "b/").into_owned());
                self.explicit_pair = true;
            }
            HeaderLine::NewFile => self.file.is_created = true,
            HeaderLine::DeletedFile => self.file.is_deleted = true,
            HeaderLine::OldPath(path) if !self.explicit_pair => {
                if self.file.is_deleted {
                    // A deleted file has no `+++` counterpart.
                    if path != "/dev/null" {
                        self.new_path = Some(strip_side(path.clone(), "a/").into_owned());
                    }
                } else if let Some(rest) = path.strip_prefix("a/") {
                    self.old_path = Some(rest.to_string());
                }
            }
            HeaderLine::NewPath(path) if !self.explicit_pair => {
                if let Some(rest) = path.strip_prefix("b/") {
                    self.new_path = Some(rest.to_string());
                }
            }
            HeaderLine::Binary => self.file.is_binary = true,
            HeaderLine::DiffGit(None)
            | HeaderLine::OldPath(_)
            | HeaderLine::NewPath(_)
            | HeaderLine::Ignored
            | HeaderLine::Unknown => {}
        }
    }

    /// The file under construction, for the hunk reader to fill
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Whether a path has been fixed by an explicit line (`+++`, `---` of a deletion, rename/copy)
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.new_path.is_some()
    }

    /// Resolve the paths and hand out the file.
    ///
    /// `allow_tentative` lets the `diff --git` names stand in when no explicit
    /// path line was seen; it is only sound once the file's region is closed.
    /// Returns `None` when no path can be determined.
    #[must_use]
    pub fn finish(self, allow_tentative: bool) -> Option<File> {
        let Self {
            mut file,
            tentative,
            old_path,
            new_path,
            ..
        } = self;
        let (tentative_old, tentative_new) = match tentative {
            Some((old, new)) if allow_tentative => (Some(old), Some(new)),
            Some((old, _)) => (Some(old), None),
            None => (None, None),
        };

        file.filename = new_path.or(tentative_new).filter(|name| !name.is_empty())?;
        file.old_filename = if file.is_deleted {
            Some(file.filename.clone())
        } else {
            old_path
                .or(tentative_old)
                .filter(|old| *old != file.filename && !old.is_empty())
        };
        Some(file)
    }
}

/// Whether a line opens the next commit
pub(crate) fn is_hash_line(line: &Line) -> bool {
    matches!(header::classify(&line.bytes), Some((MetadataTag::Hash, _)))
}

/// Whether a line starting with `fragment` opens the next file or commit
pub(crate) fn is_boundary_fragment(fragment: &[u8]) -> bool {
    fragment.starts_with(DIFF_GIT_PREFIX)
        || matches!(header::classify(fragment), Some((MetadataTag::Hash, _)))
}

/// Whether a header line starting with `fragment` must be read whole.
///
/// Boundaries and path-bearing lines are; anything else is classified from
/// its first fragment alone.
pub(crate) fn is_path_fragment(fragment: &[u8]) -> bool {
    if is_boundary_fragment(fragment) {
        return true;
    }
    matches!(
        HeaderLine::parse(&String::from_utf8_lossy(fragment)),
        HeaderLine::RenameFrom(_)
            | HeaderLine::RenameTo(_)
            | HeaderLine::CopyFrom(_)
            | HeaderLine::CopyTo(_)
            | HeaderLine::OldPath(_)
            | HeaderLine::NewPath(_)
    )
}

/// Read a file header starting at `first` (normally its `diff --git` line).
///
/// Stops after the `+++` line, before the first `@@` line, or at a boundary.
/// Lines of the next file or commit are pushed back onto `source`. Only
/// path-bearing and boundary lines are reassembled when longer than the
/// buffer; other lines keep their first fragment.
///
/// # Errors
///
/// Returns the underlying I/O error if the stream cannot be read.
pub fn read_file_header<R: Read>(
    source: &mut LineSource<R>,
    first: &Line,
) -> io::Result<(FileHeader, HeaderEnd)> {
    let mut header = FileHeader::default();
    header.apply(&HeaderLine::parse(&first.text()));

    loop {
        let Some(line) = source.next_line_if(is_path_fragment)? else {
            return Ok((header, HeaderEnd::Boundary(Boundary::EndOfInput)));
        };

        if line.is_blank() {
            return Ok((header, HeaderEnd::Boundary(Boundary::EndOfSection)));
        }
        if line.starts_with(DIFF_GIT_PREFIX) {
            source.unread(line);
            return Ok((header, HeaderEnd::Boundary(Boundary::NextFile)));
        }
        if is_hash_line(&line) {
            source.unread(line);
            return Ok((header, HeaderEnd::Boundary(Boundary::EndOfSection)));
        }
        if line.starts_with(b"@@") {
            source.unread(line);
            return Ok((header, HeaderEnd::Body));
        }

        let text = line.text();
        let parsed = HeaderLine::parse(&text);
        trace!(?parsed, "file header line");
        let ends_header = matches!(parsed, HeaderLine::NewPath(_));
        header.apply(&parsed);
        if ends_header {
            return Ok((header, HeaderEnd::Body));
        }
    }
}
