// ── Relation Inference ──
//
// Proposes typed relations from a newly captured node to existing ones.
// Each candidate pair is checked against an ordered rule table; the first rule
// that fires produces the relation, so a pair yields at most one.

use std::collections::HashSet;

use cairn_core::{GraphRelation, KnowledgeNode, NodeType, Relation, RelationType};
use tracing::debug;

/// Relations at or above this confidence are written without asking.
pub const DEFAULT_AUTO_CREATE_THRESHOLD: f64 = 0.7;

const SUPERSESSION_KEYWORDS: &[&str] = &[
    "supersedes",
    "replaces",
    "instead of",
    "rather than",
    "deprecates",
    "obsoletes",
    "upgrades from",
];

// ── Types ──

#[derive(Debug, Clone, PartialEq)]
pub struct InferredRelation {
    pub source: String,
    pub target: String,
    pub relation_type: RelationType,
    pub confidence: f64,
    pub reasoning: String,
}

/// Pairwise evidence between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelationSignals {
    /// Jaccard index of the case-folded tag sets.
    pub tag_overlap: f64,
    /// Number of file references the two nodes share.
    pub file_overlap: usize,
    pub same_session: bool,
    /// Jaccard index of title words longer than three characters.
    pub title_similarity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationGroups {
    pub auto_create: Vec<InferredRelation>,
    pub suggest: Vec<InferredRelation>,
}

impl InferredRelation {
    /// The graph-index form, carrying the reasoning as its description.
    pub fn to_graph_relation(&self) -> GraphRelation {
        GraphRelation {
            source: self.source.clone(),
            target: self.target.clone(),
            kind: self.relation_type,
            description: Some(self.reasoning.clone()),
            confidence: self.confidence,
        }
    }

    /// The form embedded in the source node's front matter.
    pub fn to_relation(&self) -> Relation {
        Relation {
            kind: self.relation_type,
            target: self.target.clone(),
            description: Some(self.reasoning.clone()),
            confidence: self.confidence,
        }
    }
}

// ── Rules ──

type Predicate = fn(&KnowledgeNode, &KnowledgeNode, &RelationSignals) -> bool;

struct RelationRule {
    applies: Predicate,
    relation_type: RelationType,
    confidence: fn(&RelationSignals) -> f64,
    reasoning: fn(&RelationSignals) -> String,
}

fn is_pair(source: &KnowledgeNode, target: &KnowledgeNode, from: NodeType, to: NodeType) -> bool {
    source.node_type == from && target.node_type == to
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Evaluated top to bottom; the first rule whose predicate holds wins.
const RULES: &[RelationRule] = &[
    RelationRule {
        applies: |s, t, sig| {
            is_pair(s, t, NodeType::Decision, NodeType::Component)
                && (sig.tag_overlap > 0.3 || sig.file_overlap > 0)
        },
        relation_type: RelationType::Affects,
        confidence: |sig| 0.7 + sig.tag_overlap * 0.2,
        reasoning: |sig| {
            format!(
                "Decision affects component (tag overlap: {})",
                percent(sig.tag_overlap)
            )
        },
    },
    RelationRule {
        applies: |s, t, sig| {
            is_pair(s, t, NodeType::Component, NodeType::Pattern)
                && (sig.tag_overlap > 0.4 || mentions_pattern(&s.content, &t.title))
        },
        relation_type: RelationType::Implements,
        confidence: |_| 0.75,
        reasoning: |_| "Component implements pattern".to_string(),
    },
    RelationRule {
        applies: |s, t, sig| {
            is_pair(s, t, NodeType::Component, NodeType::Component) && sig.file_overlap > 0
        },
        relation_type: RelationType::Uses,
        confidence: |_| 0.8,
        reasoning: |sig| format!("Shared file references: {} file(s)", sig.file_overlap),
    },
    RelationRule {
        applies: |s, t, _| {
            is_pair(s, t, NodeType::Decision, NodeType::Decision)
                && (mentions_supersession(&s.content, &t.title)
                    || mentions_supersession(&s.title, &t.title))
        },
        relation_type: RelationType::Supersedes,
        confidence: |_| 0.85,
        reasoning: |_| "Decision supersedes previous decision".to_string(),
    },
    RelationRule {
        applies: |s, t, sig| {
            is_pair(s, t, NodeType::Convention, NodeType::Component) && sig.tag_overlap > 0.3
        },
        relation_type: RelationType::RelatesTo,
        confidence: |_| 0.65,
        reasoning: |_| "Convention relates to component".to_string(),
    },
    RelationRule {
        applies: |_, _, sig| sig.same_session && sig.tag_overlap > 0.2,
        relation_type: RelationType::RelatesTo,
        confidence: |_| 0.6,
        reasoning: |_| "Created in same session with shared tags".to_string(),
    },
    RelationRule {
        applies: |_, _, sig| sig.tag_overlap > 0.5,
        relation_type: RelationType::RelatesTo,
        confidence: |sig| 0.55 + sig.tag_overlap * 0.15,
        reasoning: |sig| format!("High tag overlap: {}", percent(sig.tag_overlap)),
    },
];

fn first_matching_rule(
    source: &KnowledgeNode,
    target: &KnowledgeNode,
    signals: &RelationSignals,
) -> Option<InferredRelation> {
    RULES
        .iter()
        .find(|rule| (rule.applies)(source, target, signals))
        .map(|rule| InferredRelation {
            source: source.id.clone(),
            target: target.id.clone(),
            relation_type: rule.relation_type,
            confidence: (rule.confidence)(signals),
            reasoning: (rule.reasoning)(signals),
        })
}

// ── Signals ──

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

fn tag_set(tags: &[String]) -> HashSet<String> {
    tags.iter().map(|t| t.to_lowercase()).collect()
}

fn title_words(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

fn shared_references(a: &[String], b: &[String]) -> usize {
    let theirs: HashSet<&str> = b.iter().map(String::as_str).collect();
    let ours: HashSet<&str> = a.iter().map(String::as_str).collect();
    ours.intersection(&theirs).count()
}

pub fn signals_between(source: &KnowledgeNode, target: &KnowledgeNode) -> RelationSignals {
    let same_session = match (&source.session, &target.session) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    };

    RelationSignals {
        tag_overlap: jaccard(&tag_set(&source.tags), &tag_set(&target.tags)),
        file_overlap: shared_references(&source.references, &target.references),
        same_session,
        title_similarity: jaccard(&title_words(&source.title), &title_words(&target.title)),
    }
}

/// Whether `content` names the pattern, either verbatim, without a trailing
/// " pattern", or with its first hyphen read as a space.
fn mentions_pattern(content: &str, pattern_title: &str) -> bool {
    let content = content.to_lowercase();
    let title = pattern_title.to_lowercase();
    let variants = [
        title.clone(),
        title.replacen(" pattern", "", 1),
        title.replacen('-', " ", 1),
    ];
    variants
        .iter()
        .any(|needle| !needle.is_empty() && content.contains(needle.as_str()))
}

fn mentions_supersession(text: &str, target_title: &str) -> bool {
    let text = text.to_lowercase();
    let target = target_title.to_lowercase();
    if target.is_empty() || !text.contains(&target) {
        return false;
    }
    SUPERSESSION_KEYWORDS.iter().any(|k| text.contains(k))
}

// ── Public API ──

/// Relations from `new_node` to each candidate, highest confidence first.
/// The node itself is skipped if it appears among the candidates.
pub fn infer_relations(
    new_node: &KnowledgeNode,
    candidates: &[KnowledgeNode],
) -> Vec<InferredRelation> {
    let mut inferred: Vec<InferredRelation> = candidates
        .iter()
        .filter(|candidate| candidate.id != new_node.id)
        .filter_map(|candidate| {
            let signals = signals_between(new_node, candidate);
            first_matching_rule(new_node, candidate, &signals)
        })
        .collect();

    inferred.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    debug!(node = %new_node.id, count = inferred.len(), "inferred relations");
    inferred
}

pub fn filter_by_confidence(relations: &[InferredRelation], min: f64) -> Vec<InferredRelation> {
    relations
        .iter()
        .filter(|r| r.confidence >= min)
        .cloned()
        .collect()
}

/// Split into relations to write now and relations to only suggest.
pub fn group_by_action(relations: Vec<InferredRelation>, threshold: f64) -> RelationGroups {
    let (auto_create, suggest): (Vec<_>, Vec<_>) = relations
        .into_iter()
        .partition(|r| r.confidence >= threshold);
    RelationGroups {
        auto_create,
        suggest,
    }
}

// ── Tests ──
