pub mod binary;
pub mod diff;
pub mod exec;
pub mod file_tree;
pub mod parser;

pub use binary::{
    check_large, classify, detect_binary_content, is_binary_extension, is_image_extension,
    Classification, LargeFileInfo, LARGE_FILE_THRESHOLD, PARTIAL_CONTENT_LIMIT,
};
pub use diff::{
    changed_files, current_branch, diff, file_content, file_diff, log, tracked_paths,
    DiffRequest, DiffTarget,
};
pub use exec::{
    execute, execute_checked, execute_stream, is_repository, repo_root, CommandOutput,
    CommandStream, GIT_TIMEOUT_MS,
};
pub use file_tree::{build_tree, flatten_paths, mark_binary, merge_status};
