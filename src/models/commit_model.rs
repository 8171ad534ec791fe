//! Commit metadata for the history listing between two refs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Full commit hash
    pub hash: String,
    /// Abbreviated hash
    pub short_hash: String,
    pub author: String,
    /// Author date, ISO 8601
    pub date: String,
    /// First line of the commit message
    pub subject: String,
}
