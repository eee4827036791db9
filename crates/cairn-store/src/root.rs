// ── Root Directory Operations ──
//
// Manages the store layout:
//   .cairn/
//     cairn.yaml     store configuration
//     graph.json     relation index
//     nodes/         one subdirectory per node type, holding `<id>.md` files

use std::fs;
use std::path::{Path, PathBuf};

use cairn_core::{CairnError, NodeType, Result};
use walkdir::WalkDir;

use crate::config::CairnConfig;
use crate::graph::GraphIndex;

// ── Constants ──

pub const CONFIG_FILE: &str = "cairn.yaml";
pub const GRAPH_FILE: &str = "graph.json";
pub const NODES_DIR: &str = "nodes";

// ── Public API ──

/// Initialize a store at `path`. Idempotent: existing `cairn.yaml` and
/// `graph.json` are left untouched.
pub fn init(path: &Path) -> Result<()> {
    for node_type in NodeType::ALL {
        fs::create_dir_all(type_dir(path, node_type))?;
    }

    if !path.join(CONFIG_FILE).exists() {
        CairnConfig::default().save(path)?;
    }

    if !path.join(GRAPH_FILE).exists() {
        GraphIndex::empty(path).save()?;
    }

    Ok(())
}

pub fn is_initialized(path: &Path) -> bool {
    path.join(CONFIG_FILE).exists() && path.join(NODES_DIR).is_dir()
}

/// Fail with `NotInitialized` unless `init` has run at `path`.
pub fn validate_root(path: &Path) -> Result<()> {
    if is_initialized(path) {
        Ok(())
    } else {
        Err(CairnError::NotInitialized(path.display().to_string()))
    }
}

/// Directory holding nodes of `node_type`, e.g. `nodes/decisions`.
pub fn type_dir(root: &Path, node_type: NodeType) -> PathBuf {
    root.join(NODES_DIR).join(node_type.dir_name())
}

pub fn node_path(root: &Path, node_type: NodeType, id: &str) -> PathBuf {
    type_dir(root, node_type).join(format!("{}.md", id))
}

/// All `.md` files for the given types, sorted by path.
pub fn walk_node_files(root: &Path, types: &[NodeType]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for &node_type in types {
        let dir = type_dir(root, node_type);
        if !dir.exists() {
            continue;
        }
        for entry in WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "md")
            {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_structure() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".cairn");

        init(&root).unwrap();

        assert!(root.join("cairn.yaml").exists());
        assert!(root.join("graph.json").exists());
        for node_type in NodeType::ALL {
            assert!(type_dir(&root, node_type).is_dir());
        }
        assert!(root.join("nodes/decisions").is_dir());
        assert!(validate_root(&root).is_ok());
    }

    #[test]
    fn test_init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".cairn");
        init(&root).unwrap();

        fs::write(root.join("cairn.yaml"), "version: 1\nquery_limit: 3\n").unwrap();
        init(&root).unwrap();

        let content = fs::read_to_string(root.join("cairn.yaml")).unwrap();
        assert_eq!(content, "version: 1\nquery_limit: 3\n");
    }

    #[test]
    fn test_validate_uninitialized_root() {
        let tmp = TempDir::new().unwrap();
        let err = validate_root(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, CairnError::NotInitialized(_)));
    }

    #[test]
    fn test_walk_node_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        init(&root).unwrap();

        fs::write(node_path(&root, NodeType::Decision, "b"), "x").unwrap();
        fs::write(node_path(&root, NodeType::Decision, "a"), "x").unwrap();
        fs::write(node_path(&root, NodeType::Issue, "c"), "x").unwrap();
        fs::write(type_dir(&root, NodeType::Issue).join("notes.txt"), "x").unwrap();

        let all = walk_node_files(&root, &NodeType::ALL);
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|f| f.extension().unwrap() == "md"));

        let decisions = walk_node_files(&root, &[NodeType::Decision]);
        let names: Vec<_> = decisions
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }
}
