//! On-disk storage for the knowledge graph: markdown node files grouped by
//! type, the JSON relation index, and the store configuration.

pub mod config;
pub mod file;
pub mod graph;
pub mod root;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use cairn_core::{CairnError, KnowledgeNode, NodeFilter, NodeRepository, NodeType, Result};

pub use config::CairnConfig;
pub use graph::{DirectedRelation, Direction, GraphIndex, GraphStats};

// ── Types ──

/// Handle to a store directory on disk.
#[derive(Debug, Clone)]
pub struct NodeStore {
    root: PathBuf,
}

// ── Public API ──

impl NodeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open an existing store, failing if `init` never ran there.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        root::validate_root(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn init(&self) -> Result<()> {
        root::init(&self.root)?;
        info!(root = %self.root.display(), "initialized store");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        root::is_initialized(&self.root)
    }

    pub fn node_path(&self, node_type: NodeType, id: &str) -> PathBuf {
        root::node_path(&self.root, node_type, id)
    }

    /// Write a new node file. Fails if a node with the same id and type exists.
    pub fn create(&self, node: &KnowledgeNode) -> Result<PathBuf> {
        let path = self.node_path(node.node_type, &node.id);
        if path.exists() {
            return Err(CairnError::NodeExists(node.id.clone()));
        }
        file::write_node(&path, node)?;
        debug!(id = %node.id, path = %path.display(), "node created");
        Ok(path)
    }

    pub fn read(&self, id: &str, node_type: NodeType) -> Result<KnowledgeNode> {
        let path = self.node_path(node_type, id);
        if !path.exists() {
            return Err(CairnError::NodeNotFound(id.to_string()));
        }
        file::read_node(&path)
    }

    /// Look a node up by id across every type directory.
    pub fn find(&self, id: &str) -> Result<Option<KnowledgeNode>> {
        for node_type in NodeType::ALL {
            match self.read(id, node_type) {
                Ok(node) => return Ok(Some(node)),
                Err(CairnError::NodeNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Apply `edit` to a stored node and write it back. The id, type and
    /// creation time are kept; `modified` is set to now.
    pub fn update<F>(&self, id: &str, node_type: NodeType, edit: F) -> Result<KnowledgeNode>
    where
        F: FnOnce(&mut KnowledgeNode),
    {
        let existing = self.read(id, node_type)?;
        let mut updated = existing.clone();
        edit(&mut updated);
        updated.id = existing.id;
        updated.node_type = existing.node_type;
        updated.created = existing.created;
        updated.modified = Utc::now();

        file::write_node(&self.node_path(node_type, id), &updated)?;
        debug!(id, "node updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &str, node_type: NodeType) -> Result<()> {
        let path = self.node_path(node_type, id);
        if !path.exists() {
            return Err(CairnError::NodeNotFound(id.to_string()));
        }
        fs::remove_file(&path)?;
        debug!(id, "node deleted");
        Ok(())
    }

    /// Nodes matching `filter`. Only the filtered type's directory is read
    /// when the filter names a type.
    pub fn list(&self, filter: Option<&NodeFilter>) -> Result<Vec<KnowledgeNode>> {
        let types: Vec<NodeType> = match filter.and_then(|f| f.node_type) {
            Some(node_type) => vec![node_type],
            None => NodeType::ALL.to_vec(),
        };
        let files = root::walk_node_files(&self.root, &types);
        let nodes = file::read_all_nodes(&files)
            .into_iter()
            .filter(|node| filter.map_or(true, |f| f.matches(node)))
            .collect();
        Ok(nodes)
    }

    pub fn load_config(&self) -> Result<CairnConfig> {
        CairnConfig::load(&self.root)
    }

    pub fn load_graph(&self) -> Result<GraphIndex> {
        GraphIndex::load(&self.root)
    }
}

impl NodeRepository for NodeStore {
    fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<KnowledgeNode>> {
        self.list(filter)
    }

    fn find_node(&self, id: &str) -> Result<Option<KnowledgeNode>> {
        self.find(id)
    }
}

// ── Tests ──
