//! Diff generation.
//!
//! Orchestrates the executor to produce raw diff text for a comparison,
//! hands it to the parser, and fills the gaps git itself leaves open:
//! untracked files are unioned into working-tree diffs, and single-file
//! content is resolved either from a revision or from disk.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{DiffError, ExecError};
use crate::models::{
    ChangeKind, ChangedEntry, CommitInfo, DiffChange, DiffChunk, DiffFile, FileContent, FileStatus,
};

use super::binary::{classify, LARGE_FILE_THRESHOLD, PARTIAL_CONTENT_LIMIT};
use super::exec::{execute, GIT_TIMEOUT_MS};
use super::parser;

/// One side of a comparison: a revision, or the working tree sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    Rev(String),
    WorkingTree,
}

impl DiffTarget {
    /// Parse a target string; `"working"` and `"."` mean the working tree
    pub fn parse(target: &str) -> Self {
        match target {
            "working" | "." => DiffTarget::WorkingTree,
            rev => DiffTarget::Rev(rev.to_string()),
        }
    }

    fn as_rev(&self) -> Result<&str, DiffError> {
        match self {
            DiffTarget::Rev(rev) => Ok(rev),
            DiffTarget::WorkingTree => Err(DiffError::InvalidRevision(
                "the working tree is only valid as a diff target, not a base".to_string(),
            )),
        }
    }
}

/// A comparison request: base and target, optionally narrowed to paths
#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub base: DiffTarget,
    pub target: DiffTarget,
    /// Restrict the diff to these paths; empty means the whole tree
    pub paths: Vec<String>,
    /// Context lines around changes (git's default when `None`)
    pub context_lines: Option<u32>,
}

impl DiffRequest {
    pub fn new(base: DiffTarget, target: DiffTarget) -> Self {
        Self {
            base,
            target,
            paths: Vec::new(),
            context_lines: None,
        }
    }

    fn ref_args(&self) -> Result<Vec<String>, DiffError> {
        let mut args = vec![self.base.as_rev()?.to_string()];
        if let DiffTarget::Rev(rev) = &self.target {
            args.push(rev.clone());
        }
        Ok(args)
    }

    fn path_args(&self) -> Vec<String> {
        if self.paths.is_empty() {
            return Vec::new();
        }
        let mut args = vec!["--".to_string()];
        args.extend(self.paths.iter().cloned());
        args
    }
}

/// Refine a failed git invocation into the caller-facing taxonomy
fn refine(err: ExecError) -> DiffError {
    if let ExecError::CommandFailed { stderr, .. } = &err {
        let stderr_lower = stderr.to_lowercase();
        if stderr_lower.contains("not a git repository") {
            return DiffError::NotARepository(stderr.trim().to_string());
        }
        if stderr_lower.contains("unknown revision")
            || stderr_lower.contains("bad revision")
            || stderr_lower.contains("invalid object name")
            || stderr_lower.contains("ambiguous argument")
        {
            return DiffError::InvalidRevision(stderr.trim().to_string());
        }
        if stderr_lower.contains("does not exist")
            || stderr_lower.contains("exists on disk, but not in")
        {
            return DiffError::PathNotFound(stderr.trim().to_string());
        }
    }
    DiffError::Exec(err)
}

fn run_git(args: &[String], cwd: &Path) -> Result<String, DiffError> {
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let out = execute(&arg_refs, cwd, GIT_TIMEOUT_MS)?
        .checked()
        .map_err(refine)?;
    Ok(out.stdout_utf8())
}

/// Generate the structured diff for a comparison.
///
/// When the target is the working tree, untracked files are enumerated
/// separately and synthesized as pure-addition records, since `git diff`
/// does not report them.
pub fn diff(req: &DiffRequest, cwd: &Path) -> Result<Vec<DiffFile>, DiffError> {
    let mut args = vec![
        "diff".to_string(),
        "--find-renames".to_string(),
        "--find-copies".to_string(),
    ];
    if let Some(n) = req.context_lines {
        args.push(format!("-U{n}"));
    }
    args.extend(req.ref_args()?);
    args.extend(req.path_args());

    let raw = run_git(&args, cwd)?;
    let mut files = parser::parse(&raw);

    if req.target == DiffTarget::WorkingTree {
        let seen: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
        for path in untracked_paths(req, cwd)? {
            if !seen.contains(&path) {
                files.push(synthesize_untracked(&path, cwd));
            }
        }
    }

    Ok(files)
}

/// Diff a single path, `None` when it is unchanged
pub fn file_diff(
    path: &str,
    req: &DiffRequest,
    cwd: &Path,
) -> Result<Option<DiffFile>, DiffError> {
    let mut narrowed = req.clone();
    narrowed.paths = vec![path.to_string()];
    Ok(diff(&narrowed, cwd)?.into_iter().next())
}

/// Name-only change listing; never generates full diff text
pub fn changed_files(req: &DiffRequest, cwd: &Path) -> Result<Vec<ChangedEntry>, DiffError> {
    let mut args = vec![
        "diff".to_string(),
        "--name-status".to_string(),
        "--find-renames".to_string(),
        "--find-copies".to_string(),
    ];
    args.extend(req.ref_args()?);
    args.extend(req.path_args());

    let raw = run_git(&args, cwd)?;
    let mut entries: Vec<ChangedEntry> = raw.lines().filter_map(parse_name_status).collect();

    if req.target == DiffTarget::WorkingTree {
        let seen: HashSet<String> = entries.iter().map(|e| e.path.clone()).collect();
        for path in untracked_paths(req, cwd)? {
            if !seen.contains(&path) {
                entries.push(ChangedEntry {
                    path,
                    status: FileStatus::Untracked,
                    old_path: None,
                });
            }
        }
    }

    Ok(entries)
}

/// One `--name-status` line: `M\tpath` or `R100\told\tnew`
fn parse_name_status(line: &str) -> Option<ChangedEntry> {
    let mut parts = line.split('\t');
    let code = parts.next()?;
    let first = parts.next()?;

    let status = match code.chars().next()? {
        'A' => FileStatus::Added,
        'D' => FileStatus::Deleted,
        'R' => FileStatus::Renamed,
        'C' => FileStatus::Copied,
        'M' | 'T' => FileStatus::Modified,
        _ => return None,
    };

    if matches!(status, FileStatus::Renamed | FileStatus::Copied) {
        let new = parts.next()?;
        Some(ChangedEntry {
            path: new.to_string(),
            status,
            old_path: Some(first.to_string()),
        })
    } else {
        Some(ChangedEntry {
            path: first.to_string(),
            status,
            old_path: None,
        })
    }
}

fn untracked_paths(req: &DiffRequest, cwd: &Path) -> Result<Vec<String>, DiffError> {
    let mut args = vec![
        "ls-files".to_string(),
        "--others".to_string(),
        "--exclude-standard".to_string(),
    ];
    args.extend(req.path_args());

    let raw = run_git(&args, cwd)?;
    Ok(raw.lines().map(str::to_string).collect())
}

/// Build an all-additions record for a file git does not track yet
fn synthesize_untracked(path: &str, cwd: &Path) -> DiffFile {
    let mut file = DiffFile::new(path, FileStatus::Added);

    // a file that vanished between listing and read is reported empty
    let bytes = std::fs::read(cwd.join(path)).unwrap_or_default();
    file.file_size = Some(bytes.len() as u64);

    if classify(path, Some(&bytes)).is_binary {
        file.is_binary = true;
        return file;
    }

    let content = String::from_utf8_lossy(&bytes);
    let changes: Vec<DiffChange> = content
        .lines()
        .enumerate()
        .map(|(i, line)| DiffChange {
            kind: ChangeKind::Add,
            old_line: None,
            new_line: Some(i as u32 + 1),
            content: line.to_string(),
        })
        .collect();

    if !changes.is_empty() {
        let count = changes.len() as u32;
        file.additions = count;
        file.chunks.push(DiffChunk {
            old_start: 0,
            old_lines: 0,
            new_start: 1,
            new_lines: count,
            header: format!("@@ -0,0 +1,{count} @@"),
            changes,
        });
    }
    file
}

/// Resolve a file's content at a revision or from the working tree.
///
/// Unless `full` is set, files over [`LARGE_FILE_THRESHOLD`] come back
/// truncated to [`PARTIAL_CONTENT_LIMIT`] bytes with `truncated` set.
pub fn file_content(
    path: &str,
    target: &DiffTarget,
    cwd: &Path,
    full: bool,
) -> Result<FileContent, DiffError> {
    let bytes = match target {
        DiffTarget::WorkingTree => std::fs::read(cwd.join(path)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DiffError::PathNotFound(path.to_string())
            } else {
                DiffError::Io {
                    path: path.to_string(),
                    source: e,
                }
            }
        })?,
        DiffTarget::Rev(rev) => {
            let args = vec!["show".to_string(), format!("{rev}:{path}")];
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            execute(&arg_refs, cwd, GIT_TIMEOUT_MS)?
                .checked()
                .map_err(refine)?
                .stdout
        }
    };

    let size = bytes.len() as u64;
    let mut content = FileContent {
        bytes,
        size,
        truncated: false,
    };
    if !full && size > LARGE_FILE_THRESHOLD {
        content.bytes.truncate(PARTIAL_CONTENT_LIMIT as usize);
        content.truncated = true;
    }
    Ok(content)
}

/// List all paths tracked at HEAD, for the full-tree browser
pub fn tracked_paths(cwd: &Path) -> Result<Vec<String>, DiffError> {
    let raw = run_git(&["ls-files".to_string()], cwd)?;
    Ok(raw.lines().map(str::to_string).collect())
}

/// Commits reachable from the target but not the base, newest first
pub fn log(req: &DiffRequest, cwd: &Path) -> Result<Vec<CommitInfo>, DiffError> {
    let base = req.base.as_rev()?;
    let range = match &req.target {
        DiffTarget::Rev(rev) => format!("{base}..{rev}"),
        DiffTarget::WorkingTree => format!("{base}..HEAD"),
    };

    let args = vec![
        "log".to_string(),
        "--format=%H%x09%h%x09%an%x09%aI%x09%s".to_string(),
        range,
    ];
    let raw = run_git(&args, cwd)?;

    Ok(raw
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(5, '\t');
            Some(CommitInfo {
                hash: parts.next()?.to_string(),
                short_hash: parts.next()?.to_string(),
                author: parts.next()?.to_string(),
                date: parts.next()?.to_string(),
                subject: parts.next().unwrap_or("").to_string(),
            })
        })
        .collect())
}

/// Current branch name, or `detached:<short-sha>` on a detached HEAD
pub fn current_branch(cwd: &Path) -> Result<String, DiffError> {
    let branch = run_git(
        &["branch".to_string(), "--show-current".to_string()],
        cwd,
    )?;
    let branch = branch.trim().to_string();
    if !branch.is_empty() {
        return Ok(branch);
    }

    let sha = run_git(
        &[
            "rev-parse".to_string(),
            "--short".to_string(),
            "HEAD".to_string(),
        ],
        cwd,
    )?;
    Ok(format!("detached:{}", sha.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::exec::tests::{git, setup_test_repo};
    use anyhow::Result;
    use std::fs;

    fn head_vs_working() -> DiffRequest {
        DiffRequest::new(DiffTarget::Rev("HEAD".to_string()), DiffTarget::WorkingTree)
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(DiffTarget::parse("working"), DiffTarget::WorkingTree);
        assert_eq!(DiffTarget::parse("."), DiffTarget::WorkingTree);
        assert_eq!(
            DiffTarget::parse("main"),
            DiffTarget::Rev("main".to_string())
        );
    }

    #[test]
    fn test_diff_between_revisions() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("hello.txt"), "hello\neveryone\n")?;
        git(repo.path(), &["commit", "-am", "change greeting"])?;

        let req = DiffRequest::new(
            DiffTarget::Rev("HEAD~1".to_string()),
            DiffTarget::Rev("HEAD".to_string()),
        );
        let files = diff(&req, repo.path())?;

        assert_eq!(files.len(), 1);
        let f = &files[0];
        assert_eq!(f.path, "hello.txt");
        assert_eq!(f.status, FileStatus::Modified);
        assert_eq!(f.additions, 1);
        assert_eq!(f.deletions, 1);
        assert_eq!(f.chunks.len(), 1);
        Ok(())
    }

    #[test]
    fn test_diff_of_identical_revisions_is_empty() -> Result<()> {
        let repo = setup_test_repo()?;
        let req = DiffRequest::new(
            DiffTarget::Rev("HEAD".to_string()),
            DiffTarget::Rev("HEAD".to_string()),
        );
        assert!(diff(&req, repo.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_working_tree_diff_includes_untracked() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("hello.txt"), "hello\nthere\n")?;
        fs::write(repo.path().join("fresh.txt"), "alpha\nbeta\n")?;

        let files = diff(&head_vs_working(), repo.path())?;
        assert_eq!(files.len(), 2);

        let tracked = files.iter().find(|f| f.path == "hello.txt").unwrap();
        assert_eq!(tracked.status, FileStatus::Modified);

        let fresh = files.iter().find(|f| f.path == "fresh.txt").unwrap();
        assert_eq!(fresh.status, FileStatus::Added);
        assert_eq!(fresh.additions, 2);
        assert_eq!(fresh.deletions, 0);
        assert_eq!(fresh.chunks.len(), 1);
        assert_eq!(fresh.chunks[0].new_lines, 2);
        assert!(fresh
            .chunks[0]
            .changes
            .iter()
            .all(|c| c.kind == ChangeKind::Add));
        Ok(())
    }

    #[test]
    fn test_untracked_binary_has_no_chunks() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("blob.png"), [0u8, 1, 2, 3])?;

        let files = diff(&head_vs_working(), repo.path())?;
        let blob = files.iter().find(|f| f.path == "blob.png").unwrap();
        assert!(blob.is_binary);
        assert!(blob.chunks.is_empty());
        assert_eq!(blob.additions, 0);
        assert_eq!(blob.file_size, Some(4));
        Ok(())
    }

    #[test]
    fn test_file_diff_narrows_to_one_path() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("hello.txt"), "changed\n")?;
        fs::write(repo.path().join("other.txt"), "new\n")?;

        let req = head_vs_working();
        let only = file_diff("hello.txt", &req, repo.path())?.unwrap();
        assert_eq!(only.path, "hello.txt");

        assert!(file_diff("missing.txt", &req, repo.path())?.is_none());
        Ok(())
    }

    #[test]
    fn test_changed_files_reports_rename() -> Result<()> {
        let repo = setup_test_repo()?;
        git(repo.path(), &["mv", "hello.txt", "greeting.txt"])?;
        git(repo.path(), &["commit", "-m", "rename"])?;

        let req = DiffRequest::new(
            DiffTarget::Rev("HEAD~1".to_string()),
            DiffTarget::Rev("HEAD".to_string()),
        );
        let entries = changed_files(&req, repo.path())?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, FileStatus::Renamed);
        assert_eq!(entries[0].path, "greeting.txt");
        assert_eq!(entries[0].old_path.as_deref(), Some("hello.txt"));
        Ok(())
    }

    #[test]
    fn test_changed_files_marks_untracked() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("scratch.txt"), "x\n")?;

        let entries = changed_files(&head_vs_working(), repo.path())?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, FileStatus::Untracked);
        Ok(())
    }

    #[test]
    fn test_file_content_at_revision_and_working_tree() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("hello.txt"), "uncommitted\n")?;

        let committed = file_content(
            "hello.txt",
            &DiffTarget::Rev("HEAD".to_string()),
            repo.path(),
            false,
        )?;
        assert_eq!(committed.bytes, b"hello\nworld\n");
        assert!(!committed.truncated);

        let working =
            file_content("hello.txt", &DiffTarget::WorkingTree, repo.path(), false)?;
        assert_eq!(working.bytes, b"uncommitted\n");
        Ok(())
    }

    #[test]
    fn test_file_content_truncates_large_files() -> Result<()> {
        let repo = setup_test_repo()?;
        let big = "x".repeat(2 * 1024 * 1024);
        fs::write(repo.path().join("big.txt"), &big)?;

        let partial = file_content("big.txt", &DiffTarget::WorkingTree, repo.path(), false)?;
        assert!(partial.truncated);
        assert_eq!(partial.bytes.len() as u64, PARTIAL_CONTENT_LIMIT);
        assert_eq!(partial.size, 2_097_152);

        let full = file_content("big.txt", &DiffTarget::WorkingTree, repo.path(), true)?;
        assert!(!full.truncated);
        assert_eq!(full.bytes.len(), big.len());
        Ok(())
    }

    #[test]
    fn test_missing_path_maps_to_path_not_found() -> Result<()> {
        let repo = setup_test_repo()?;
        let err = file_content(
            "nope.txt",
            &DiffTarget::Rev("HEAD".to_string()),
            repo.path(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DiffError::PathNotFound(_)));

        let err =
            file_content("nope.txt", &DiffTarget::WorkingTree, repo.path(), false).unwrap_err();
        assert!(matches!(err, DiffError::PathNotFound(_)));
        Ok(())
    }

    #[test]
    fn test_invalid_revision_maps_to_invalid_revision() -> Result<()> {
        let repo = setup_test_repo()?;
        let req = DiffRequest::new(
            DiffTarget::Rev("no-such-branch".to_string()),
            DiffTarget::Rev("HEAD".to_string()),
        );
        let err = diff(&req, repo.path()).unwrap_err();
        assert!(matches!(err, DiffError::InvalidRevision(_)));
        Ok(())
    }

    #[test]
    fn test_working_tree_base_is_rejected() {
        let req = DiffRequest::new(DiffTarget::WorkingTree, DiffTarget::WorkingTree);
        let err = diff(&req, Path::new(".")).unwrap_err();
        assert!(matches!(err, DiffError::InvalidRevision(_)));
    }

    #[test]
    fn test_log_between_refs() -> Result<()> {
        let repo = setup_test_repo()?;
        fs::write(repo.path().join("hello.txt"), "v2\n")?;
        git(repo.path(), &["commit", "-am", "second commit"])?;

        let req = DiffRequest::new(
            DiffTarget::Rev("HEAD~1".to_string()),
            DiffTarget::WorkingTree,
        );
        let commits = log(&req, repo.path())?;
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].subject, "second commit");
        assert_eq!(commits[0].author, "Test User");
        assert!(commits[0].hash.starts_with(&commits[0].short_hash));
        Ok(())
    }

    #[test]
    fn test_current_branch() -> Result<()> {
        let repo = setup_test_repo()?;
        assert_eq!(current_branch(repo.path())?, "main");

        git(repo.path(), &["checkout", "--detach", "HEAD"])?;
        assert!(current_branch(repo.path())?.starts_with("detached:"));
        Ok(())
    }

    #[test]
    fn test_tracked_paths() -> Result<()> {
        let repo = setup_test_repo()?;
        assert_eq!(tracked_paths(repo.path())?, vec!["hello.txt".to_string()]);
        Ok(())
    }
}
