// ── Node and Relation Edits ──

use anyhow::{bail, Context, Result};
use tracing::info;

use cairn_classify::{reclassify, Classification};
use cairn_core::{GraphRelation, KnowledgeNode, NodeStatus, RelationGraph, RelationType};
use cairn_store::{GraphIndex, NodeStore};

use crate::check_confidence;

// ── Types ──

/// Fields to replace on an existing node. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub references: Option<Vec<String>>,
    pub status: Option<NodeStatus>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub node: KnowledgeNode,
    /// Set when the edited text now reads as a different type. The node keeps
    /// its type; the caller decides whether to act on it.
    pub drift: Option<Classification>,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub node: KnowledgeNode,
    pub removed_relations: usize,
}

#[derive(Debug, Clone)]
pub struct RelateRequest {
    pub source: String,
    pub target: String,
    pub kind: RelationType,
    pub description: Option<String>,
    pub confidence: f64,
    /// Also add the reverse edge with the same type.
    pub bidirectional: bool,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.references.is_none()
            && self.status.is_none()
            && self.confidence.is_none()
    }

    fn touches_text(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }
}

impl RelateRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            description: None,
            confidence: 0.8,
            bidirectional: false,
        }
    }
}

// ── Helpers ──

fn require_node(store: &NodeStore, id: &str) -> Result<KnowledgeNode> {
    store
        .find(id)
        .with_context(|| format!("looking up node {}", id))?
        .with_context(|| format!("node not found: {}", id))
}

// ── Public API ──

pub fn update_node(store: &NodeStore, id: &str, update: NodeUpdate) -> Result<UpdateOutcome> {
    if update.is_empty() {
        bail!("no fields to update");
    }
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            bail!("title must not be empty");
        }
    }
    if let Some(confidence) = update.confidence {
        check_confidence(confidence)?;
    }

    let existing = require_node(store, id)?;
    let touches_text = update.touches_text();
    let node = store.update(id, existing.node_type, |node| {
        if let Some(title) = update.title {
            node.title = title.trim().to_string();
        }
        if let Some(content) = update.content {
            node.content = content;
        }
        if let Some(tags) = update.tags {
            node.tags = tags;
        }
        if let Some(references) = update.references {
            node.references = references;
        }
        if let Some(status) = update.status {
            node.status = status;
        }
        if let Some(confidence) = update.confidence {
            node.confidence = confidence;
        }
    })?;

    let drift = if touches_text {
        reclassify(node.node_type, &node.title, &node.content)
    } else {
        None
    };

    info!(id, drift = drift.is_some(), "updated node");
    Ok(UpdateOutcome { node, drift })
}

/// Delete a node file and every graph relation that touches it.
pub fn delete_node(store: &NodeStore, graph: &mut GraphIndex, id: &str) -> Result<DeleteOutcome> {
    let node = require_node(store, id)?;
    store.delete(id, node.node_type)?;
    let removed_relations = graph
        .remove_node_relations(id)
        .context("updating graph index")?;

    info!(id, removed_relations, "deleted node");
    Ok(DeleteOutcome {
        node,
        removed_relations,
    })
}

/// Add an explicit relation between two existing nodes. Returns the source
/// and target nodes.
pub fn relate(
    store: &NodeStore,
    graph: &mut GraphIndex,
    request: RelateRequest,
) -> Result<(KnowledgeNode, KnowledgeNode)> {
    check_confidence(request.confidence)?;
    if request.source == request.target {
        bail!("a node cannot relate to itself: {}", request.source);
    }
    let source = require_node(store, &request.source)?;
    let target = require_node(store, &request.target)?;

    graph.add_relation(GraphRelation {
        source: source.id.clone(),
        target: target.id.clone(),
        kind: request.kind,
        description: request.description.clone(),
        confidence: request.confidence,
    })?;

    if request.bidirectional {
        graph.add_relation(GraphRelation {
            source: target.id.clone(),
            target: source.id.clone(),
            kind: request.kind,
            description: request.description.map(|d| format!("Reverse: {}", d)),
            confidence: request.confidence,
        })?;
    }

    info!(
        source = %source.id,
        target = %target.id,
        kind = %request.kind,
        bidirectional = request.bidirectional,
        "related nodes"
    );
    Ok((source, target))
}

/// Remove a relation from the graph index. Returns whether it existed.
pub fn unrelate(
    graph: &mut GraphIndex,
    source: &str,
    target: &str,
    kind: RelationType,
) -> Result<bool> {
    let removed = graph.remove_relation(source, target, kind)?;
    info!(source, target, %kind, removed, "unrelated nodes");
    Ok(removed)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{capture, CaptureRequest};
    use cairn_core::NodeType;
    use cairn_store::{CairnConfig, Direction};
    use tempfile::TempDir;

    fn setup() -> (TempDir, NodeStore, GraphIndex) {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let store = NodeStore::new(tmp.path().join(".cairn"));
        store.init().expect("failed to init store");
        let graph = store.load_graph().expect("failed to load graph");
        (tmp, store, graph)
    }

    fn add(store: &NodeStore, graph: &mut GraphIndex, title: &str, node_type: NodeType) -> String {
        let request = CaptureRequest {
            node_type: Some(node_type),
            ..CaptureRequest::new(title, format!("About {}", title))
        };
        capture(store, graph, &CairnConfig::default(), request)
            .unwrap()
            .node
            .id
    }

    #[test]
    fn test_update_fields() {
        let (_tmp, store, mut graph) = setup();
        let id = add(&store, &mut graph, "Cache layer", NodeType::Component);

        let outcome = update_node(
            &store,
            &id,
            NodeUpdate {
                tags: Some(vec!["cache".to_string()]),
                status: Some(NodeStatus::Superseded),
                confidence: Some(0.4),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(outcome.drift.is_none());
        let stored = store.read(&id, NodeType::Component).unwrap();
        assert_eq!(stored.tags, vec!["cache"]);
        assert_eq!(stored.status, NodeStatus::Superseded);
        assert_eq!(stored.confidence, 0.4);
        assert_eq!(stored.title, "Cache layer");
    }

    #[test]
    fn test_update_reports_type_drift() {
        let (_tmp, store, mut graph) = setup();
        let id = add(&store, &mut graph, "Storage notes", NodeType::Concept);

        let outcome = update_node(
            &store,
            &id,
            NodeUpdate {
                title: Some("Decision to use PostgreSQL".to_string()),
                content: Some(
                    "We decided to choose PostgreSQL instead of MySQL because we selected this option over the alternatives"
                        .to_string(),
                ),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(outcome.node.node_type, NodeType::Concept);
        assert_eq!(outcome.drift.unwrap().node_type, NodeType::Decision);
    }

    #[test]
    fn test_update_rejects_bad_input() {
        let (_tmp, store, mut graph) = setup();
        let id = add(&store, &mut graph, "Thing", NodeType::Concept);

        assert!(update_node(&store, &id, NodeUpdate::default()).is_err());
        let blank = NodeUpdate {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(update_node(&store, &id, blank).is_err());
        let status = NodeUpdate {
            status: Some(NodeStatus::Active),
            ..Default::default()
        };
        assert!(update_node(&store, "missing", status).is_err());
    }

    #[test]
    fn test_relate_and_unrelate() {
        let (_tmp, store, mut graph) = setup();
        let a = add(&store, &mut graph, "Api gateway", NodeType::Component);
        let b = add(&store, &mut graph, "Rate limiter", NodeType::Component);

        let mut request = RelateRequest::new(&a, &b, RelationType::Uses);
        request.description = Some("throttles requests".to_string());
        request.bidirectional = true;
        let (source, target) = relate(&store, &mut graph, request).unwrap();
        assert_eq!(source.id, a);
        assert_eq!(target.id, b);

        let directed = graph.node_relations(&b);
        assert_eq!(directed.len(), 2);
        let reverse = directed
            .iter()
            .find(|d| d.direction == Direction::Outgoing)
            .unwrap();
        assert_eq!(
            reverse.relation.description.as_deref(),
            Some("Reverse: throttles requests")
        );

        assert!(unrelate(&mut graph, &a, &b, RelationType::Uses).unwrap());
        assert!(!unrelate(&mut graph, &a, &b, RelationType::Uses).unwrap());
        assert_eq!(store.load_graph().unwrap().relations().len(), 1);
    }

    #[test]
    fn test_relate_requires_existing_nodes() {
        let (_tmp, store, mut graph) = setup();
        let a = add(&store, &mut graph, "Lonely", NodeType::Concept);
        assert!(relate(&store, &mut graph, RelateRequest::new(&a, "ghost", RelationType::Uses)).is_err());
        assert!(relate(&store, &mut graph, RelateRequest::new(&a, &a, RelationType::Uses)).is_err());
        assert!(graph.relations().is_empty());
    }

    #[test]
    fn test_delete_removes_relations() {
        let (_tmp, store, mut graph) = setup();
        let a = add(&store, &mut graph, "Old auth", NodeType::Component);
        let b = add(&store, &mut graph, "New auth", NodeType::Component);
        let c = add(&store, &mut graph, "Session store", NodeType::Component);
        relate(&store, &mut graph, RelateRequest::new(&b, &a, RelationType::Supersedes)).unwrap();
        relate(&store, &mut graph, RelateRequest::new(&b, &c, RelationType::Uses)).unwrap();

        let outcome = delete_node(&store, &mut graph, &a).unwrap();
        assert_eq!(outcome.node.title, "Old auth");
        assert_eq!(outcome.removed_relations, 1);
        assert!(store.find(&a).unwrap().is_none());
        assert_eq!(graph.relations().len(), 1);

        assert!(delete_node(&store, &mut graph, &a).is_err());
    }
}
