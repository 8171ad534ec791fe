//! Hierarchical file tree records for the repository browser.

use serde::{Deserialize, Serialize};

use super::diff_model::FileStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
}

/// A node in the file tree.
///
/// `children` is present exactly for directories, sorted directories-first
/// then lexicographically. Trees are rebuilt wholesale on every request, so
/// consumers must not hold on to node identity across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_binary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            node_type: NodeType::File,
            status: None,
            is_binary: None,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            node_type: NodeType::Directory,
            status: None,
            is_binary: None,
            children: Some(Vec::new()),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_present_iff_directory() {
        assert!(FileNode::file("a.rs", "src/a.rs").children.is_none());
        assert!(FileNode::directory("src", "src").children.is_some());
    }

    #[test]
    fn test_node_serializes_type_tag() {
        let node = FileNode::directory("src", "src");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "directory");
        assert!(json.get("status").is_none());
        assert_eq!(json["children"], serde_json::json!([]));
    }
}
