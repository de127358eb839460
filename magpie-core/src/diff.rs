//! Unified diff parsing and the per-file change model
//!
//! The parser turns the raw text from the VCS diff endpoint into one
//! [`ParsedFile`] per changed file, tracking line numbers on both sides of
//! every hunk. Posting validation later relies on those numbers: a review
//! comment must land on a line that is actually part of a hunk, or the VCS
//! API rejects it.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which side of the diff a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    /// The base revision (deletions)
    Old,
    /// The head revision (additions and context)
    New,
}

/// A contiguous diff region with old/new line ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
}

impl Hunk {
    /// Check whether a line number falls inside this hunk on the given side
    pub fn contains(&self, line: usize, side: DiffSide) -> bool {
        match side {
            DiffSide::Old => {
                self.old_lines > 0 && line >= self.old_start && line < self.old_start + self.old_lines
            }
            DiffSide::New => {
                self.new_lines > 0 && line >= self.new_start && line < self.new_start + self.new_lines
            }
        }
    }
}

/// One changed line with its side-local line number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub line_number: usize,
    pub content: String,
}

/// One changed file, derived purely from diff text and never mutated after
/// parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    /// Path on the head side
    pub path: String,
    /// Path on the base side when the file was renamed
    pub old_path: Option<String>,
    /// Hunks in file order; empty for pure renames
    pub hunks: Vec<Hunk>,
    /// Added lines with new-side line numbers
    pub additions: Vec<DiffLine>,
    /// Deleted lines with old-side line numbers
    pub deletions: Vec<DiffLine>,
    pub is_new: bool,
    pub is_deleted: bool,
}

impl ParsedFile {
    /// Total changed-line count for this file
    pub fn lines_changed(&self) -> usize {
        self.additions.len() + self.deletions.len()
    }

    /// Check whether a comment target is covered by any hunk on the given side
    pub fn line_in_hunks(&self, line: usize, side: DiffSide) -> bool {
        self.hunks.iter().any(|h| h.contains(line, side))
    }

    /// File extension, lowercased
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.path)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// Parse a raw unified diff into per-file change models
///
/// Tolerates files with zero hunks (renames and mode changes) and skips
/// malformed hunk bodies rather than failing the whole diff.
pub fn parse_diff(raw: &str) -> Result<Vec<ParsedFile>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut files: Vec<ParsedFile> = Vec::new();
    let mut current: Option<ParsedFile> = None;
    // Per-side counters for the hunk being read
    let mut old_line = 0usize;
    let mut new_line = 0usize;
    let mut in_hunk = false;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(file) = current.take() {
                files.push(file);
            }
            in_hunk = false;

            let mut parts = rest.split_whitespace();
            let a_path = parts
                .next()
                .ok_or_else(|| Error::DiffParse("missing a/ path in diff header".to_string()))?;
            let b_path = parts
                .next()
                .ok_or_else(|| Error::DiffParse("missing b/ path in diff header".to_string()))?;

            let old = a_path.strip_prefix("a/").unwrap_or(a_path).to_string();
            let new = b_path.strip_prefix("b/").unwrap_or(b_path).to_string();
            let old_path = if old != new { Some(old) } else { None };

            current = Some(ParsedFile {
                path: new,
                old_path,
                hunks: Vec::new(),
                additions: Vec::new(),
                deletions: Vec::new(),
                is_new: false,
                is_deleted: false,
            });
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            let hunk = parse_hunk_header(line)?;
            old_line = hunk.old_start;
            new_line = hunk.new_start;
            file.hunks.push(hunk);
            in_hunk = true;
            continue;
        }

        // File markers only occur between hunks. Inside a hunk a deleted
        // line whose content starts with "-- " (or an added "++ " line)
        // renders with the same prefix and must count toward line numbers.
        if !in_hunk {
            if let Some(path) = line.strip_prefix("--- ") {
                if path.trim() == "/dev/null" {
                    file.is_new = true;
                }
                continue;
            }
            if let Some(path) = line.strip_prefix("+++ ") {
                if path.trim() == "/dev/null" {
                    file.is_deleted = true;
                }
                continue;
            }
            // Header noise: index lines, mode changes, rename markers.
            continue;
        }

        match line.as_bytes().first() {
            Some(b'+') => {
                file.additions.push(DiffLine {
                    line_number: new_line,
                    content: line[1..].to_string(),
                });
                new_line += 1;
            }
            Some(b'-') => {
                file.deletions.push(DiffLine {
                    line_number: old_line,
                    content: line[1..].to_string(),
                });
                old_line += 1;
            }
            Some(b' ') => {
                old_line += 1;
                new_line += 1;
            }
            Some(b'\\') => {
                // "\ No newline at end of file" consumes no line numbers.
            }
            _ => {
                in_hunk = false;
            }
        }
    }

    if let Some(file) = current.take() {
        files.push(file);
    }

    Ok(files)
}

fn parse_hunk_header(line: &str) -> Result<Hunk> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| Error::DiffParse("invalid hunk header".to_string()))?;
    let header = match header.find("@@") {
        Some(idx) => &header[..idx],
        None => header,
    };

    let mut parts = header.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| Error::DiffParse("missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| Error::DiffParse("missing new range".to_string()))?;

    let (old_start, old_lines) = parse_range(old_part, '-')?;
    let (new_start, new_lines) = parse_range(new_part, '+')?;

    Ok(Hunk {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize)> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| Error::DiffParse(format!("invalid range prefix in {}", part)))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| Error::DiffParse(format!("invalid range start in {}", part)))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| Error::DiffParse(format!("invalid range count in {}", part)))?;
    Ok((start, count))
}
