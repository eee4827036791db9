//! Capture orchestration: classify incoming text, build the node, infer its
//! relations against the stored graph and persist everything.

pub mod edit;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::info;

use cairn_classify::{classify, Classification, ClassificationRequest};
use cairn_core::id::{generate_node_id, generate_session_id};
use cairn_core::{
    CaptureSource, GraphRelation, KnowledgeNode, NodeStatus, NodeType, Relation, RelationGraph,
    RelationType,
};
use cairn_enrich::{group_by_action, infer_relations, InferredRelation};
use cairn_store::{CairnConfig, GraphIndex, NodeStore};

pub use edit::{
    delete_node, relate, unrelate, update_node, DeleteOutcome, NodeUpdate, RelateRequest,
    UpdateOutcome,
};

const DEFAULT_CONFIDENCE: f64 = 0.8;
const MAX_TITLE_LEN: usize = 200;

// ── Types ──

#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    pub title: String,
    pub content: String,
    /// Skips classification when set.
    pub node_type: Option<NodeType>,
    pub tags: Vec<String>,
    pub references: Vec<String>,
    pub session: Option<String>,
    pub source: CaptureSource,
    pub confidence: Option<f64>,
    /// Existing nodes to link with an explicit `relates_to`.
    pub related_to: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub node: KnowledgeNode,
    pub path: PathBuf,
    pub classification: Classification,
    /// Relations written with the node.
    pub created_relations: Vec<InferredRelation>,
    /// Inferred relations below the auto-create threshold.
    pub suggested_relations: Vec<InferredRelation>,
}

impl CaptureRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

// ── Helpers ──

pub(crate) fn check_confidence(confidence: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&confidence) {
        bail!("confidence must be between 0.0 and 1.0, got {}", confidence);
    }
    Ok(confidence)
}

fn validate(request: &CaptureRequest) -> Result<()> {
    let title_len = request.title.trim().chars().count();
    if title_len == 0 {
        bail!("title must not be empty");
    }
    if title_len > MAX_TITLE_LEN {
        bail!("title must be at most {} characters", MAX_TITLE_LEN);
    }
    if request.content.trim().is_empty() {
        bail!("content must not be empty");
    }
    if let Some(confidence) = request.confidence {
        check_confidence(confidence)?;
    }
    Ok(())
}

fn explicit_relation(source: &str, target: &str, confidence: f64) -> InferredRelation {
    InferredRelation {
        source: source.to_string(),
        target: target.to_string(),
        relation_type: RelationType::RelatesTo,
        confidence,
        reasoning: "Linked at capture".to_string(),
    }
}

// ── Public API ──

/// Capture a new node into the store and graph index.
pub fn capture(
    store: &NodeStore,
    graph: &mut GraphIndex,
    config: &CairnConfig,
    request: CaptureRequest,
) -> Result<CaptureOutcome> {
    validate(&request)?;

    let mut classify_request = ClassificationRequest::new(&request.title, &request.content)
        .with_source(request.source);
    classify_request.user_hint = request.node_type;
    let classification = classify(&classify_request);

    let now = Utc::now();
    let mut node = KnowledgeNode::new(
        generate_node_id(&request.title),
        classification.node_type,
        request.title.trim(),
        request.content,
    );
    node.tags = request.tags;
    node.references = request.references;
    node.source = request.source;
    node.confidence = request.confidence.unwrap_or(DEFAULT_CONFIDENCE);
    node.session = Some(request.session.unwrap_or_else(|| generate_session_id(now)));
    node.created = now;
    node.modified = now;
    if classification.needs_review {
        node.status = NodeStatus::NeedsReview;
    }

    let existing = store.list(None).context("loading nodes for relation inference")?;
    let inferred = infer_relations(&node, &existing);
    let groups = group_by_action(inferred, config.auto_relate_threshold);

    let mut created_relations = groups.auto_create;
    for target in &request.related_to {
        if !existing.iter().any(|n| &n.id == target) {
            bail!("related node not found: {}", target);
        }
        if !created_relations.iter().any(|r| &r.target == target) {
            created_relations.push(explicit_relation(&node.id, target, node.confidence));
        }
    }
    node.relations = created_relations
        .iter()
        .map(InferredRelation::to_relation)
        .collect::<Vec<Relation>>();

    let path = store
        .create(&node)
        .with_context(|| format!("writing node {}", node.id))?;

    for relation in &created_relations {
        let edge: GraphRelation = relation.to_graph_relation();
        graph
            .add_relation(edge)
            .with_context(|| format!("indexing relation {} -> {}", relation.source, relation.target))?;
    }

    info!(
        id = %node.id,
        node_type = %node.node_type,
        relations = created_relations.len(),
        suggested = groups.suggest.len(),
        "captured node"
    );

    Ok(CaptureOutcome {
        node,
        path,
        classification,
        created_relations,
        suggested_relations: groups.suggest,
    })
}

// ── Tests ──
