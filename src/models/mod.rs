mod commit_model;
mod diff_model;
mod file_tree_model;

pub use commit_model::CommitInfo;
pub use diff_model::{
    ChangeKind, ChangedEntry, DiffChange, DiffChunk, DiffFile, FileContent, FileStatus,
};
pub use file_tree_model::{FileNode, NodeType};
