//! loupe - git diff inspection engine.
//!
//! The library behind a local change viewer: it runs the `git` binary,
//! parses its unified-diff output into structured records, builds annotated
//! file trees, and classifies binary and oversized content. The HTTP layer
//! and UI that consume these records live elsewhere.
//!
//! Typical flow:
//!
//! ```no_run
//! use loupe::{diff, DiffRequest, DiffTarget};
//!
//! let req = DiffRequest::new(
//!     DiffTarget::Rev("main".to_string()),
//!     DiffTarget::WorkingTree,
//! );
//! let files = diff(&req, std::path::Path::new(".")).unwrap();
//! for file in &files {
//!     println!("{} +{} -{}", file.path, file.additions, file.deletions);
//! }
//! ```

pub mod error;
pub mod git;
pub mod models;

pub use error::{DiffError, ExecError};
pub use git::{
    build_tree, changed_files, check_large, classify, current_branch, detect_binary_content,
    diff, execute, execute_stream, file_content, file_diff, flatten_paths, is_binary_extension,
    is_image_extension, is_repository, log, mark_binary, merge_status, repo_root,
    Classification, CommandOutput, CommandStream, DiffRequest, DiffTarget, LargeFileInfo,
    GIT_TIMEOUT_MS, LARGE_FILE_THRESHOLD, PARTIAL_CONTENT_LIMIT,
};
pub use models::{
    ChangeKind, ChangedEntry, CommitInfo, DiffChange, DiffChunk, DiffFile, FileContent,
    FileNode, FileStatus, NodeType,
};
