// ── Storage Interfaces ──
//
// What the ranking engines and the capture flow need from storage.
// The on-disk implementations live in `cairn-store`; plain vectors implement
// the same traits for in-memory use.

use crate::error::Result;
use crate::filter::NodeFilter;
use crate::types::{GraphRelation, KnowledgeNode};

/// Read access to stored nodes.
pub trait NodeRepository {
    /// All nodes matching `filter` (every node when `None`).
    fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<KnowledgeNode>>;

    fn find_node(&self, id: &str) -> Result<Option<KnowledgeNode>>;
}

/// The relation graph index.
pub trait RelationGraph {
    /// Ids connected to `id` by any stored relation, in either direction.
    fn related_node_ids(&self, id: &str) -> Vec<String>;

    /// Insert a relation, or update description/confidence of an existing
    /// (source, target, type) triple.
    fn add_relation(&mut self, relation: GraphRelation) -> Result<()>;
}

// ── Shared Graph Helpers ──

/// Upsert on the (source, target, type) triple. Returns `true` when inserted.
pub fn upsert_relation(relations: &mut Vec<GraphRelation>, relation: GraphRelation) -> bool {
    match relations.iter_mut().find(|r| {
        r.source == relation.source && r.target == relation.target && r.kind == relation.kind
    }) {
        Some(existing) => {
            existing.description = relation.description;
            existing.confidence = relation.confidence;
            false
        }
        None => {
            relations.push(relation);
            true
        }
    }
}

/// Neighbour ids of `id`, deduplicated in first-seen order.
pub fn related_ids(relations: &[GraphRelation], id: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for rel in relations {
        let other = if rel.source == id {
            &rel.target
        } else if rel.target == id {
            &rel.source
        } else {
            continue;
        };
        if !ids.iter().any(|seen| seen == other) {
            ids.push(other.clone());
        }
    }
    ids
}

// ── In-Memory Implementations ──

impl NodeRepository for Vec<KnowledgeNode> {
    fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<KnowledgeNode>> {
        Ok(self
            .iter()
            .filter(|node| filter.map_or(true, |f| f.matches(node)))
            .cloned()
            .collect())
    }

    fn find_node(&self, id: &str) -> Result<Option<KnowledgeNode>> {
        Ok(self.iter().find(|node| node.id == id).cloned())
    }
}

impl RelationGraph for Vec<GraphRelation> {
    fn related_node_ids(&self, id: &str) -> Vec<String> {
        related_ids(self, id)
    }

    fn add_relation(&mut self, relation: GraphRelation) -> Result<()> {
        upsert_relation(self, relation);
        Ok(())
    }
}

// ── Tests ──
