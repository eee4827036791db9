// ── Node Filter ──
//
// Hard pre-filter applied by storage before any ranking happens.
// Every present field must match; absent fields match everything.

use crate::types::{KnowledgeNode, NodeStatus, NodeType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    pub node_type: Option<NodeType>,
    /// All listed tags must be present on the node.
    pub tags: Vec<String>,
    pub status: Option<NodeStatus>,
    pub min_confidence: Option<f64>,
    /// Node must carry an embedded relation targeting this id.
    pub related_to: Option<String>,
    /// Case-insensitive substring of `title content tags`.
    pub search_query: Option<String>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_min_confidence(mut self, min: f64) -> Self {
        self.min_confidence = Some(min);
        self
    }

    pub fn with_related_to(mut self, id: impl Into<String>) -> Self {
        self.related_to = Some(id.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    pub fn matches(&self, node: &KnowledgeNode) -> bool {
        if self.node_type.is_some_and(|t| t != node.node_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != node.status) {
            return false;
        }
        if self.min_confidence.is_some_and(|min| node.confidence < min) {
            return false;
        }
        if !self.tags.iter().all(|tag| node.has_tag(tag)) {
            return false;
        }
        if let Some(related) = &self.related_to {
            if !node.relations.iter().any(|r| &r.target == related) {
                return false;
            }
        }
        if let Some(query) = &self.search_query {
            if !node.searchable_text().contains(&query.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

// ── Tests ──
