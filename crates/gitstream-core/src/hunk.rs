// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Hunk bodies and hunk headers

use std::io::{self, Read};

use serde::{Deserialize, Serialize};

use crate::commit::File;
use crate::diff::{Boundary, DIFF_GIT_PREFIX, is_boundary_fragment, is_hash_line};
use crate::line_source::LineSource;

/// Line ranges of one hunk, decoded from `@@ -a,b +c,d @@ context`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkRange {
    /// First line of the hunk in the old file
    pub old_start: u32,
    /// Number of old-file lines covered
    pub old_lines: u32,
    /// First line of the hunk in the new file
    pub new_start: u32,
    /// Number of new-file lines covered
    pub new_lines: u32,
    /// Section heading git prints after the closing `@@`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl HunkRange {
    /// Decode a hunk header line.
    ///
    /// An omitted count means one line. A header missing its `+` range
    /// mirrors the `-` range. Combined-diff headers (`@@@`) are not decoded.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("@@ ")?;
        let (ranges, tail) = rest.split_once(" @@")?;

        let mut parts = ranges.split(' ');
        let (old_start, old_lines) = parse_range(parts.next()?.strip_prefix('-')?)?;
        let (new_start, new_lines) = match parts.next() {
            Some(new) => parse_range(new.strip_prefix('+')?)?,
            None => (old_start, old_lines),
        };

        let context = tail
            .strip_prefix(' ')
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Some(Self {
            old_start,
            old_lines,
            new_start,
            new_lines,
            context,
        })
    }
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Read hunk lines into `file` until the file's region ends.
///
/// Each kept line's raw bytes are appended followed by `\n`. Once a line would
/// push `content` past `max_bytes`, or a line is longer than the source's
/// buffer, the file is marked truncated and nothing more is appended; the
/// remaining lines are still read (and counted) up to the boundary so the
/// next file starts at the right place.
///
/// # Errors
///
/// Returns the underlying I/O error if the stream cannot be read.
pub fn read_hunk_body<R: Read>(
    source: &mut LineSource<R>,
    file: &mut File,
    max_bytes: Option<usize>,
) -> io::Result<Boundary> {
    let mut capped = false;

    loop {
        let Some(line) = source.next_line_if(is_boundary_fragment)? else {
            return Ok(Boundary::EndOfInput);
        };

        if line.is_blank() {
            return Ok(Boundary::EndOfSection);
        }
        if line.starts_with(DIFF_GIT_PREFIX) {
            source.unread(line);
            return Ok(Boundary::NextFile);
        }
        if is_hash_line(&line) {
            source.unread(line);
            return Ok(Boundary::EndOfSection);
        }

        match line.bytes.first() {
            Some(b'+') => file.insertions += 1,
            Some(b'-') => file.deletions += 1,
            _ => {}
        }

        if capped {
            continue;
        }
        if line.fragmented {
            file.truncated = true;
            capped = true;
            continue;
        }

        if max_bytes.is_some_and(|max| file.content.len() + line.bytes.len() + 1 > max) {
            file.truncated = true;
            capped = true;
            continue;
        }
        file.content.extend_from_slice(&line.bytes);
        file.content.push(b'\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_source::MIN_BUFFER_CAPACITY;
    use similar_asserts::assert_eq;

    fn read(
        input: impl AsRef<[u8]>,
        capacity: usize,
        max_bytes: Option<usize>,
    ) -> (File, Boundary, String) {
        let mut source = LineSource::new(input.as_ref(), capacity);
        let mut file = File::default();
        let boundary = read_hunk_body(&mut source, &mut file, max_bytes).expect("read");
        let rest = source
            .next_line()
            .expect("read")
            .map(|line| line.text().into_owned())
            .unwrap_or_default();
        (file, boundary, rest)
    }

    #[test]
    fn test_parse_hunk_header() {
        assert_eq!(
            HunkRange::parse("@@ -1,3 +1,4 @@ fn main() {"),
            Some(HunkRange {
                old_start: 1,
                old_lines: 3,
                new_start: 1,
                new_lines: 4,
                context: Some("fn main() {".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_hunk_header_omitted_counts() {
        let range = HunkRange::parse("@@ -7 +9 @@").expect("valid");
        assert_eq!((range.old_start, range.old_lines), (7, 1));
        assert_eq!((range.new_start, range.new_lines), (9, 1));
        assert_eq!(range.context, None);

        let range = HunkRange::parse("@@ -0,0 +1,2 @@").expect("valid");
        assert_eq!((range.old_start, range.old_lines), (0, 0));
    }

    #[test]
    fn test_parse_hunk_header_missing_new_range() {
        let range = HunkRange::parse("@@ -5,2 @@").expect("valid");
        assert_eq!((range.new_start, range.new_lines), (5, 2));
    }

    #[test]
    fn test_parse_hunk_header_rejects_garbage() {
        assert_eq!(HunkRange::parse("not a hunk"), None);
        assert_eq!(HunkRange::parse("@@ -x,y +1 @@"), None);
        assert_eq!(HunkRange::parse("@@@ -1 -1 +1 @@@"), None);
        assert_eq!(HunkRange::parse("@@ -1 +1"), None);
    }

    #[test]
    fn test_reads_until_next_file() {
        let input = "@@ -1,2 +1,2 @@\n context\n-old\n+new\ndiff --git a/b b/b\n";
        let (file, boundary, rest) = read(input, 128, None);
        assert_eq!(boundary, Boundary::NextFile);
        assert_eq!(file.content_text(), "@@ -1,2 +1,2 @@\n context\n-old\n+new\n");
        assert_eq!((file.insertions, file.deletions), (1, 1));
        assert!(!file.truncated);
        assert_eq!(rest, "diff --git a/b b/b");
    }

    #[test]
    fn test_reads_until_blank_line() {
        let (file, boundary, rest) = read("@@ -1 +1 @@\n+x\n\nc abc\n", 128, None);
        assert_eq!(boundary, Boundary::EndOfSection);
        assert_eq!(file.content_text(), "@@ -1 +1 @@\n+x\n");
        assert_eq!(rest, "c abc");
    }

    #[test]
    fn test_reads_until_next_commit() {
        let (file, boundary, rest) = read("@@ -1 +1 @@\n+x\nc abc\n", 128, None);
        assert_eq!(boundary, Boundary::EndOfSection);
        assert_eq!(file.content_text(), "@@ -1 +1 @@\n+x\n");
        assert_eq!(rest, "c abc");
    }

    #[test]
    fn test_reads_until_end_of_input() {
        let (file, boundary, _) = read("@@ -1 +1 @@\n+x\n\\ No newline at end of file", 128, None);
        assert_eq!(boundary, Boundary::EndOfInput);
        assert_eq!(
            file.content_text(),
            "@@ -1 +1 @@\n+x\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn test_byte_cap_keeps_whole_lines() {
        let input = "@@ -1,3 +1,3 @@\n+aaaa\n+bbbb\n+cccc\ndiff --git a/n b/n\n";
        // Header (16) + "+aaaa\n" (6) = 22 fits, "+bbbb\n" would make 28.
        let (file, boundary, rest) = read(input, 128, Some(25));
        assert!(file.truncated);
        assert_eq!(file.content_text(), "@@ -1,3 +1,3 @@\n+aaaa\n");
        assert!(file.content.len() <= 25);
        assert_eq!(file.insertions, 3);
        assert_eq!(boundary, Boundary::NextFile);
        assert_eq!(rest, "diff --git a/n b/n");
    }

    #[test]
    fn test_byte_cap_exact_fit_is_not_truncated() {
        let (file, _, _) = read("@@ -1 +1 @@\n+x\n", 128, Some(15));
        assert_eq!(file.content.len(), 15);
        assert!(!file.truncated);
    }

    #[test]
    fn test_byte_cap_zero_keeps_nothing() {
        let (file, _, _) = read("@@ -1 +1 @@\n+x\n", 128, Some(0));
        assert!(file.truncated);
        assert_eq!(file.content_text(), "");
    }

    #[test]
    fn test_fragmented_line_is_dropped() {
        let long = format!("+{}", "q".repeat(MIN_BUFFER_CAPACITY * 2));
        let input = format!("@@ -1,2 +1,2 @@\n+short\n{long}\n+after\ndiff --git a/z b/z\n");
        let (file, boundary, rest) = read(&input, MIN_BUFFER_CAPACITY, None);

        assert!(file.truncated);
        assert_eq!(file.content_text(), "@@ -1,2 +1,2 @@\n+short\n");
        assert!(!file.content.contains(&b'q'));
        assert_eq!(file.insertions, 3);
        assert_eq!(boundary, Boundary::NextFile);
        assert_eq!(rest, "diff --git a/z b/z");
    }

    #[test]
    fn test_non_utf8_bytes_are_kept_verbatim() {
        let input = b"@@ -1 +1 @@\n-caf\xe9\n+caf\xc3\xa9\n";
        let (file, boundary, _) = read(&input[..], 128, None);
        assert_eq!(boundary, Boundary::EndOfInput);
        assert_eq!(file.content, b"@@ -1 +1 @@\n-caf\xe9\n+caf\xc3\xa9\n");
        assert_eq!(file.content_text(), "@@ -1 +1 @@\n-caf\u{fffd}\n+caf\u{e9}\n");
        assert_eq!((file.insertions, file.deletions), (1, 1));
    }

    #[test]
    fn test_byte_cap_counts_raw_bytes() {
        // Header (12) + "+\xff\xff\xff\xff\n" (6) = 18 raw bytes.
        let input = b"@@ -1 +1 @@\n+\xff\xff\xff\xff\n";
        let (file, _, _) = read(&input[..], 128, Some(18));
        assert!(!file.truncated);
        assert_eq!(file.content.len(), 18);
        assert_eq!(file.content, &input[..]);
    }

    #[test]
    fn test_oversized_next_file_line_is_kept_whole() {
        let path = "n".repeat(MIN_BUFFER_CAPACITY * 2);
        let next = format!("diff --git a/{path} b/{path}");
        let input = format!("@@ -1 +1 @@\n+x\n{next}\n");
        let (file, boundary, rest) = read(&input, MIN_BUFFER_CAPACITY, None);
        assert_eq!(boundary, Boundary::NextFile);
        assert!(!file.truncated);
        assert_eq!(rest, next);
    }
}
