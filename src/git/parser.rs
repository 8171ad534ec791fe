//! Unified-diff parsing.
//!
//! A pure transformer from `git diff` text to [`DiffFile`] records. No I/O
//! happens here; the generator feeds us raw bytes it captured from git.
//!
//! Parsing is total over well-formed input and best-effort otherwise: a
//! malformed file section keeps whatever chunks did parse instead of
//! aborting the remaining sections.

use crate::models::{ChangeKind, DiffChange, DiffChunk, DiffFile, FileStatus};

use super::binary::is_binary_extension;

/// Parse raw `git diff` output into one record per changed file
pub fn parse(raw: &str) -> Vec<DiffFile> {
    let lines: Vec<&str> = raw.lines().collect();

    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with("diff --git "))
        .map(|(i, _)| i)
        .collect();

    if starts.is_empty() {
        // tolerate a bare section without the git marker
        if lines
            .iter()
            .any(|l| l.starts_with("@@") || l.starts_with("Binary files "))
        {
            return parse_file_diff(&lines).into_iter().collect();
        }
        return Vec::new();
    }

    let mut files = Vec::new();
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(lines.len());
        if let Some(file) = parse_file_diff(&lines[start..end]) {
            files.push(file);
        }
    }
    files
}

/// Parse one `diff --git` section
fn parse_file_diff(lines: &[&str]) -> Option<DiffFile> {
    let mut status = FileStatus::Modified;
    let mut rename_old: Option<String> = None;
    let mut rename_new: Option<String> = None;
    let mut header_old: Option<String> = None;
    let mut header_new: Option<String> = None;
    let mut marker_paths: Option<(String, String)> = None;
    let mut binary_path: Option<String> = None;
    let mut is_binary = false;
    let mut body_start = None;

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("@@") {
            body_start = Some(i);
            break;
        } else if line.starts_with("diff --git ") {
            marker_paths = split_marker_paths(line);
        } else if line.starts_with("new file mode") {
            status = FileStatus::Added;
        } else if line.starts_with("deleted file mode") {
            status = FileStatus::Deleted;
        } else if let Some(p) = line.strip_prefix("rename from ") {
            status = FileStatus::Renamed;
            rename_old = Some(p.to_string());
        } else if let Some(p) = line.strip_prefix("rename to ") {
            rename_new = Some(p.to_string());
        } else if let Some(p) = line.strip_prefix("copy from ") {
            status = FileStatus::Copied;
            rename_old = Some(p.to_string());
        } else if let Some(p) = line.strip_prefix("copy to ") {
            rename_new = Some(p.to_string());
        } else if let Some(p) = line.strip_prefix("--- ") {
            header_old = strip_path_prefix(p, "a/");
        } else if let Some(p) = line.strip_prefix("+++ ") {
            header_new = strip_path_prefix(p, "b/");
        } else if let Some(rest) = line.strip_prefix("Binary files ") {
            is_binary = true;
            binary_path = parse_binary_marker(rest);
        } else if line.starts_with("GIT binary patch") {
            is_binary = true;
        }
    }

    let (marker_old, marker_new) = match marker_paths {
        Some((a, b)) => (Some(a), Some(b)),
        None => (None, None),
    };

    let path = match status {
        FileStatus::Deleted => header_old.clone().or(marker_old.clone()),
        _ => rename_new
            .or(header_new)
            .or(marker_new)
            .or(header_old.clone())
            .or(binary_path),
    }?;

    let old_path = match status {
        FileStatus::Renamed | FileStatus::Copied => rename_old.or(header_old).or(marker_old),
        _ => None,
    };

    let mut file = DiffFile::new(path, status);
    file.old_path = old_path;

    if is_binary || is_binary_extension(&file.path) {
        // binary changes are not line-counted
        file.is_binary = true;
        return Some(file);
    }

    if let Some(start) = body_start {
        parse_chunks(&lines[start..], &mut file);
    }
    Some(file)
}

/// Parse the `@@`-delimited chunk blocks of a section body
fn parse_chunks(lines: &[&str], file: &mut DiffFile) {
    let mut i = 0;
    while i < lines.len() {
        let Some((old_start, old_lines, new_start, new_lines)) = parse_chunk_header(lines[i])
        else {
            // unparseable header, skip the line and keep going
            i += 1;
            continue;
        };

        let mut chunk = DiffChunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            header: lines[i].to_string(),
            changes: Vec::new(),
        };
        let mut old_line = old_start;
        let mut new_line = new_start;

        i += 1;
        while i < lines.len() && !lines[i].starts_with("@@") {
            let line = lines[i];
            i += 1;

            if let Some(content) = line.strip_prefix('+') {
                chunk.changes.push(DiffChange {
                    kind: ChangeKind::Add,
                    old_line: None,
                    new_line: Some(new_line),
                    content: content.to_string(),
                });
                new_line += 1;
                file.additions += 1;
            } else if let Some(content) = line.strip_prefix('-') {
                chunk.changes.push(DiffChange {
                    kind: ChangeKind::Del,
                    old_line: Some(old_line),
                    new_line: None,
                    content: content.to_string(),
                });
                old_line += 1;
                file.deletions += 1;
            } else if line.starts_with('\\') {
                // "\ No newline at end of file" is consumed, not emitted
            } else if line.is_empty() || line.starts_with(' ') {
                chunk.changes.push(DiffChange {
                    kind: ChangeKind::Normal,
                    old_line: Some(old_line),
                    new_line: Some(new_line),
                    content: line.strip_prefix(' ').unwrap_or(line).to_string(),
                });
                old_line += 1;
                new_line += 1;
            } else {
                // malformed body line, abandon this chunk
                break;
            }
        }

        file.chunks.push(chunk);
    }
}

/// Parse `@@ -a[,b] +c[,d] @@ ...`; a missing count means one line
fn parse_chunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let rest = line.strip_prefix("@@ -")?;
    let ranges = &rest[..rest.find(" @@")?];
    let (old, new) = ranges.split_once(' ')?;
    let (old_start, old_lines) = parse_range(old)?;
    let (new_start, new_lines) = parse_range(new.strip_prefix('+')?)?;
    Some((old_start, old_lines, new_start, new_lines))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, lines)) => Some((start.parse().ok()?, lines.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Take the new-side path out of `Binary files a/X and b/Y differ`
fn parse_binary_marker(rest: &str) -> Option<String> {
    let rest = rest.strip_suffix(" differ")?;
    let (_, new) = rest.split_once(" and ")?;
    let new = unquote(new);
    if new == "/dev/null" {
        return None;
    }
    Some(new.strip_prefix("b/").unwrap_or(&new).to_string())
}

/// Extract a path from a `---`/`+++` header, dropping the a/ or b/ prefix.
/// `/dev/null` has no path.
fn strip_path_prefix(raw: &str, prefix: &str) -> Option<String> {
    let raw = unquote(raw);
    if raw == "/dev/null" {
        return None;
    }
    Some(raw.strip_prefix(prefix).unwrap_or(&raw).to_string())
}

/// Split `diff --git a/X b/Y` into (X, Y).
///
/// Unquoted names containing ` b/` are ambiguous here; those sections
/// resolve their paths from the ---/+++ headers instead.
fn split_marker_paths(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("diff --git ")?;
    let idx = rest.find(" b/")?;
    let old = unquote(&rest[..idx]);
    let new = unquote(&rest[idx + 1..]);
    Some((
        old.strip_prefix("a/")?.to_string(),
        new.strip_prefix("b/")?.to_string(),
    ))
}

fn unquote(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}
