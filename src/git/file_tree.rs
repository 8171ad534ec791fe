//! File tree construction and annotation.
//!
//! Builds hierarchical trees from flat path lists for the repository
//! browser. Trees are pure rebuilds: no identity survives between calls,
//! and beyond the path listing itself nothing here touches the disk.

use std::collections::HashMap;

use crate::models::{FileNode, FileStatus};

use super::binary::is_binary_extension;

/// Build a tree from a flat list of paths.
///
/// The returned root is an unnamed directory; every directory's children
/// are sorted folders-first, then lexicographically.
pub fn build_tree(paths: &[String]) -> FileNode {
    let mut root = FileNode::directory("", "");
    for path in paths {
        insert_path(&mut root, path);
    }
    sort_tree(&mut root);
    root
}

fn insert_path(root: &mut FileNode, path: &str) {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return;
    }

    let mut node = root;
    for (depth, part) in parts.iter().enumerate() {
        let is_file = depth == parts.len() - 1;
        let node_path = parts[..=depth].join("/");
        let children = node.children.get_or_insert_with(Vec::new);

        let pos = match children.iter().position(|c| c.name == *part) {
            Some(pos) => pos,
            None => {
                children.push(if is_file {
                    FileNode::file(*part, node_path)
                } else {
                    FileNode::directory(*part, node_path)
                });
                children.len() - 1
            }
        };
        node = &mut children[pos];
    }
}

fn sort_tree(node: &mut FileNode) {
    let Some(children) = node.children.as_mut() else {
        return;
    };
    // folders first, then case-sensitive lexicographic
    children.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
    for child in children {
        sort_tree(child);
    }
}

/// Produce a new tree with per-file statuses attached.
///
/// File nodes matching an entry in `statuses` gain that status; every
/// ancestor directory of a changed file is marked `modified` so the UI can
/// bubble a "has changes" indicator. Merging the same map twice yields the
/// same tree as merging once.
pub fn merge_status(tree: &FileNode, statuses: &HashMap<String, FileStatus>) -> FileNode {
    merge_node(tree, statuses).0
}

fn merge_node(node: &FileNode, statuses: &HashMap<String, FileStatus>) -> (FileNode, bool) {
    let mut merged = node.clone();

    if node.is_directory() {
        let mut has_changes = false;
        merged.children = node.children.as_ref().map(|children| {
            children
                .iter()
                .map(|child| {
                    let (child, changed) = merge_node(child, statuses);
                    has_changes |= changed;
                    child
                })
                .collect()
        });
        merged.status = has_changes.then_some(FileStatus::Modified);
        (merged, has_changes)
    } else {
        merged.status = statuses.get(&node.path).copied().or(node.status);
        let changed = merged.status.is_some();
        (merged, changed)
    }
}

/// Produce a new tree with `is_binary` set on file nodes whose extension
/// the classifier recognises. Extension check only, content is never read.
pub fn mark_binary(tree: &FileNode) -> FileNode {
    let mut marked = tree.clone();
    if marked.is_directory() {
        marked.children = tree
            .children
            .as_ref()
            .map(|children| children.iter().map(mark_binary).collect());
    } else if is_binary_extension(&marked.path) {
        marked.is_binary = Some(true);
    }
    marked
}

/// Collect the paths of all file leaves in the tree
pub fn flatten_paths(tree: &FileNode) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(tree, &mut paths);
    paths
}

fn collect_paths(node: &FileNode, out: &mut Vec<String>) {
    match &node.children {
        Some(children) => {
            for child in children {
                collect_paths(child, out);
            }
        }
        None => out.push(node.path.clone()),
    }
}
