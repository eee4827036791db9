// ── Graph Index ──
//
// `graph.json` holds every relation in the store, one entry per
// (source, target, type) triple. Each mutation rewrites the file atomically.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cairn_core::store::{related_ids, upsert_relation};
use cairn_core::{GraphRelation, RelationGraph, RelationType, Result};

use crate::file::write_atomic;
use crate::root::GRAPH_FILE;

const INDEX_VERSION: &str = "1.0.0";

// ── Types ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GraphData {
    version: String,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    relations: Vec<GraphRelation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectedRelation<'a> {
    pub relation: &'a GraphRelation,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphStats {
    pub total_relations: usize,
    /// Non-zero counts only, in `RelationType::ALL` order.
    pub by_type: Vec<(RelationType, usize)>,
    pub last_updated: DateTime<Utc>,
}

/// Handle to the on-disk relation index.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    path: PathBuf,
    data: GraphData,
}

// ── Public API ──

impl GraphIndex {
    /// An index with no relations that will be written to `root/graph.json`.
    pub fn empty(root: &Path) -> Self {
        Self {
            path: root.join(GRAPH_FILE),
            data: GraphData {
                version: INDEX_VERSION.to_string(),
                last_updated: Utc::now(),
                relations: Vec::new(),
            },
        }
    }

    /// Load `root/graph.json`, or an empty index when the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let mut index = Self::empty(root);
        if index.path.exists() {
            let content = fs::read_to_string(&index.path)?;
            index.data = serde_json::from_str(&content)?;
        }
        Ok(index)
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        write_atomic(&self.path, &json)
    }

    pub fn relations(&self) -> &[GraphRelation] {
        &self.data.relations
    }

    /// Remove one (source, target, type) triple. Returns whether it existed.
    pub fn remove_relation(&mut self, source: &str, target: &str, kind: RelationType) -> Result<bool> {
        let before = self.data.relations.len();
        self.data
            .relations
            .retain(|r| !(r.source == source && r.target == target && r.kind == kind));
        let removed = self.data.relations.len() != before;
        if removed {
            self.touch_and_save()?;
        }
        Ok(removed)
    }

    /// Remove every relation touching `id`. Returns how many were removed.
    pub fn remove_node_relations(&mut self, id: &str) -> Result<usize> {
        let before = self.data.relations.len();
        self.data
            .relations
            .retain(|r| r.source != id && r.target != id);
        let removed = before - self.data.relations.len();
        if removed > 0 {
            self.touch_and_save()?;
        }
        debug!(node = id, removed, "removed node relations");
        Ok(removed)
    }

    /// Relations with `id` at either end, tagged with their direction.
    pub fn node_relations(&self, id: &str) -> Vec<DirectedRelation<'_>> {
        self.data
            .relations
            .iter()
            .filter_map(|relation| {
                let direction = if relation.source == id {
                    Direction::Outgoing
                } else if relation.target == id {
                    Direction::Incoming
                } else {
                    return None;
                };
                Some(DirectedRelation {
                    relation,
                    direction,
                })
            })
            .collect()
    }

    pub fn statistics(&self) -> GraphStats {
        let by_type = RelationType::ALL
            .iter()
            .map(|&kind| {
                let count = self.data.relations.iter().filter(|r| r.kind == kind).count();
                (kind, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        GraphStats {
            total_relations: self.data.relations.len(),
            by_type,
            last_updated: self.data.last_updated,
        }
    }

    fn touch_and_save(&mut self) -> Result<()> {
        self.data.last_updated = Utc::now();
        self.save()
    }
}

impl RelationGraph for GraphIndex {
    fn related_node_ids(&self, id: &str) -> Vec<String> {
        related_ids(&self.data.relations, id)
    }

    fn add_relation(&mut self, relation: GraphRelation) -> Result<()> {
        let inserted = upsert_relation(&mut self.data.relations, relation);
        debug!(inserted, "graph relation upserted");
        self.touch_and_save()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn edge(source: &str, target: &str, kind: RelationType) -> GraphRelation {
        GraphRelation {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            description: Some("test".to_string()),
            confidence: 0.8,
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let index = GraphIndex::load(tmp.path()).unwrap();
        assert!(index.relations().is_empty());
        assert!(!tmp.path().join(GRAPH_FILE).exists());
    }

    #[test]
    fn test_add_persists_and_upserts() {
        let tmp = TempDir::new().unwrap();
        let mut index = GraphIndex::load(tmp.path()).unwrap();
        index.add_relation(edge("a", "b", RelationType::Uses)).unwrap();
        let mut updated = edge("a", "b", RelationType::Uses);
        updated.confidence = 0.95;
        index.add_relation(updated).unwrap();

        let reloaded = GraphIndex::load(tmp.path()).unwrap();
        assert_eq!(reloaded.relations().len(), 1);
        assert_eq!(reloaded.relations()[0].confidence, 0.95);

        let json = fs::read_to_string(tmp.path().join(GRAPH_FILE)).unwrap();
        assert!(json.contains("\"version\": \"1.0.0\""));
        assert!(json.contains("\"type\": \"uses\""));
    }

    #[test]
    fn test_remove_relation_and_node_relations() {
        let tmp = TempDir::new().unwrap();
        let mut index = GraphIndex::load(tmp.path()).unwrap();
        index.add_relation(edge("a", "b", RelationType::Uses)).unwrap();
        index.add_relation(edge("a", "b", RelationType::Affects)).unwrap();
        index.add_relation(edge("c", "a", RelationType::RelatesTo)).unwrap();
        index.add_relation(edge("b", "c", RelationType::Uses)).unwrap();

        assert!(index.remove_relation("a", "b", RelationType::Affects).unwrap());
        assert!(!index.remove_relation("a", "b", RelationType::Affects).unwrap());
        assert_eq!(index.remove_node_relations("a").unwrap(), 2);

        let reloaded = GraphIndex::load(tmp.path()).unwrap();
        assert_eq!(reloaded.relations(), &[edge("b", "c", RelationType::Uses)]);
    }

    #[test]
    fn test_directions_and_related_ids() {
        let tmp = TempDir::new().unwrap();
        let mut index = GraphIndex::empty(tmp.path());
        index.add_relation(edge("a", "b", RelationType::Uses)).unwrap();
        index.add_relation(edge("c", "a", RelationType::Affects)).unwrap();

        let directed = index.node_relations("a");
        assert_eq!(directed.len(), 2);
        assert_eq!(directed[0].direction, Direction::Outgoing);
        assert_eq!(directed[1].direction, Direction::Incoming);
        assert_eq!(directed[1].relation.source, "c");
        assert!(index.node_relations("z").is_empty());
        assert_eq!(index.related_node_ids("a"), vec!["b", "c"]);
    }

    #[test]
    fn test_statistics() {
        let tmp = TempDir::new().unwrap();
        let mut index = GraphIndex::empty(tmp.path());
        index.add_relation(edge("a", "b", RelationType::Uses)).unwrap();
        index.add_relation(edge("b", "c", RelationType::Uses)).unwrap();
        index.add_relation(edge("a", "c", RelationType::Supersedes)).unwrap();
        let saved_at = GraphIndex::load(tmp.path()).unwrap().statistics().last_updated;

        let stats = index.statistics();
        assert_eq!(stats.last_updated, saved_at);
        assert_eq!(stats.total_relations, 3);
        assert_eq!(
            stats.by_type,
            vec![(RelationType::Uses, 2), (RelationType::Supersedes, 1)]
        );
    }
}
