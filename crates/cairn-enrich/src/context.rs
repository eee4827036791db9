// ── Context Relevance ──
//
// Ranks nodes against what the user is working on right now. A node's score
// is built by running an ordered list of steps: additive factors first, then
// the status multiplier over the running total, then the connectivity bonus.

use chrono::{DateTime, Utc};
use tracing::debug;

use cairn_core::{KnowledgeNode, NodeStatus, NodeType};

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "in", "to", "for", "of", "and", "or", "but", "with", "from",
    "this", "that", "these", "those", "will", "would", "should", "could", "can", "may",
];

const HIGH_RELEVANCE: f64 = 1.0;
const MEDIUM_RELEVANCE: f64 = 0.5;

// ── Types ──

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSignals {
    pub current_file: Option<String>,
    pub current_task: Option<String>,
    pub recent_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredNode<'a> {
    pub node: &'a KnowledgeNode,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceGroups<'a> {
    pub high: Vec<ScoredNode<'a>>,
    pub medium: Vec<ScoredNode<'a>>,
    pub low: Vec<ScoredNode<'a>>,
}

// ── Scoring Steps ──

struct Contribution {
    value: f64,
    reason: Option<String>,
}

impl Contribution {
    fn silent(value: f64) -> Self {
        Self { value, reason: None }
    }

    fn because(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: Some(reason.into()),
        }
    }
}

type StepFn = fn(&KnowledgeNode, &ContextSignals, DateTime<Utc>) -> Option<Contribution>;

enum Step {
    /// Added to the running score.
    Add(StepFn),
    /// Multiplies the running score.
    Scale(StepFn),
}

const PIPELINE: &[Step] = &[
    Step::Add(current_file_step),
    Step::Add(similar_file_step),
    Step::Add(recent_files_step),
    Step::Add(task_keywords_step),
    Step::Add(type_weight_step),
    Step::Add(confidence_step),
    Step::Add(recency_step),
    Step::Scale(status_step),
    Step::Add(connectivity_step),
];

fn current_file_step(
    node: &KnowledgeNode,
    signals: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    let current = signals.current_file.as_deref()?;
    node.references
        .iter()
        .any(|r| r == current)
        .then(|| Contribution::because(1.0, "References current file"))
}

fn similar_file_step(
    node: &KnowledgeNode,
    signals: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    let current = signals.current_file.as_deref()?;
    node.references
        .iter()
        .any(|r| files_are_similar(current, r))
        .then(|| Contribution::because(0.6, "References similar file"))
}

fn recent_files_step(
    node: &KnowledgeNode,
    signals: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    let matches = signals
        .recent_files
        .iter()
        .filter(|f| node.references.contains(f))
        .count();
    if matches == 0 {
        return None;
    }
    let fraction = (matches as f64 / signals.recent_files.len() as f64).min(1.0);
    Some(Contribution::because(
        0.4 * fraction,
        format!("References {} recent file(s)", matches),
    ))
}

fn task_keywords_step(
    node: &KnowledgeNode,
    signals: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    let keywords = extract_keywords(signals.current_task.as_deref()?);
    if keywords.is_empty() {
        return None;
    }
    let text = node.searchable_text();
    let matched = keywords.iter().filter(|k| text.contains(k.as_str())).count();
    let fraction = matched as f64 / keywords.len() as f64;
    (fraction > 0.3).then(|| {
        Contribution::because(
            fraction * 0.8,
            format!("Matches task keywords ({:.0}%)", fraction * 100.0),
        )
    })
}

fn type_weight(node_type: NodeType) -> f64 {
    match node_type {
        NodeType::Decision => 0.3,
        NodeType::Convention => 0.25,
        NodeType::Component => 0.2,
        NodeType::Pattern => 0.2,
        NodeType::Concept => 0.15,
        NodeType::Issue => 0.1,
        NodeType::Session => 0.05,
    }
}

fn type_weight_step(
    node: &KnowledgeNode,
    _: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    Some(Contribution::silent(type_weight(node.node_type)))
}

fn confidence_step(
    node: &KnowledgeNode,
    _: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    Some(Contribution::silent(node.confidence * 0.2))
}

fn recency_step(
    node: &KnowledgeNode,
    _: &ContextSignals,
    now: DateTime<Utc>,
) -> Option<Contribution> {
    let recency = (0.3 - node.age_in_days(now) / 30.0 * 0.1).max(0.0);
    if recency > 0.1 {
        Some(Contribution::because(recency, "Recently modified"))
    } else {
        Some(Contribution::silent(recency))
    }
}

fn status_step(
    node: &KnowledgeNode,
    _: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    match node.status {
        NodeStatus::Superseded => Some(Contribution::because(0.3, "Superseded (low priority)")),
        NodeStatus::NeedsReview => Some(Contribution::silent(0.8)),
        NodeStatus::Active => None,
    }
}

fn connectivity_step(
    node: &KnowledgeNode,
    _: &ContextSignals,
    _: DateTime<Utc>,
) -> Option<Contribution> {
    let count = node.relations.len();
    (count > 3).then(|| Contribution::because(0.15, format!("Well-connected ({} relations)", count)))
}

fn score_node<'a>(
    node: &'a KnowledgeNode,
    signals: &ContextSignals,
    now: DateTime<Utc>,
) -> ScoredNode<'a> {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    for step in PIPELINE {
        let (apply, is_scale) = match step {
            Step::Add(f) => (f, false),
            Step::Scale(f) => (f, true),
        };
        let Some(contribution) = apply(node, signals, now) else {
            continue;
        };
        if is_scale {
            score *= contribution.value;
        } else {
            score += contribution.value;
        }
        reasons.extend(contribution.reason);
    }

    ScoredNode {
        node,
        score,
        reasons,
    }
}

// ── Helpers ──

fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Same non-empty directory, same file stem, or one stem containing the other
/// (e.g. `auth.rs` and `auth_test.rs`).
pub fn files_are_similar(a: &str, b: &str) -> bool {
    let (dir_a, name_a) = split_path(a);
    let (dir_b, name_b) = split_path(b);
    if !dir_a.is_empty() && dir_a == dir_b {
        return true;
    }

    let (stem_a, stem_b) = (file_stem(name_a), file_stem(name_b));
    if stem_a.is_empty() || stem_b.is_empty() {
        return false;
    }
    stem_a.contains(stem_b) || stem_b.contains(stem_a)
}

/// Lower-cased words longer than three characters, minus stop words,
/// deduplicated in order of first appearance.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in text.to_lowercase().split_whitespace() {
        if word.chars().count() <= 3 || STOP_WORDS.contains(&word) {
            continue;
        }
        if !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

// ── Public API ──

pub fn score_nodes_for_context<'a>(
    nodes: &'a [KnowledgeNode],
    signals: &ContextSignals,
) -> Vec<ScoredNode<'a>> {
    score_nodes_for_context_at(nodes, signals, Utc::now())
}

/// Score every node against `signals` as of `now`, dropping non-positive
/// scores. Highest score first.
pub fn score_nodes_for_context_at<'a>(
    nodes: &'a [KnowledgeNode],
    signals: &ContextSignals,
    now: DateTime<Utc>,
) -> Vec<ScoredNode<'a>> {
    let mut scored: Vec<ScoredNode<'a>> = nodes
        .iter()
        .map(|node| score_node(node, signals, now))
        .filter(|s| s.score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    debug!(candidates = nodes.len(), scored = scored.len(), "context scoring");
    scored
}

pub fn group_by_relevance(scored: Vec<ScoredNode<'_>>) -> RelevanceGroups<'_> {
    let mut groups = RelevanceGroups::default();
    for entry in scored {
        if entry.score >= HIGH_RELEVANCE {
            groups.high.push(entry);
        } else if entry.score >= MEDIUM_RELEVANCE {
            groups.medium.push(entry);
        } else {
            groups.low.push(entry);
        }
    }
    groups
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::{Relation, RelationType};
    use chrono::Duration;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// A node old enough that recency contributes nothing.
    fn stale_node(id: &str, node_type: NodeType, now: DateTime<Utc>) -> KnowledgeNode {
        let mut node = KnowledgeNode::new(id, node_type, id, "");
        node.confidence = 0.5;
        node.modified = now - Duration::days(300);
        node
    }

    fn with_file(file: &str) -> ContextSignals {
        ContextSignals {
            current_file: Some(file.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_current_file_outranks_identical_node() {
        let now = Utc::now();
        let mut referencing = stale_node("a", NodeType::Concept, now);
        referencing.references = vec!["src/auth/login.rs".to_string()];
        let mut other = stale_node("b", NodeType::Concept, now);
        other.references = vec!["docs/readme.md".to_string()];

        let nodes = vec![other, referencing];
        let scored = score_nodes_for_context_at(&nodes, &with_file("src/auth/login.rs"), now);
        assert_eq!(scored[0].node.id, "a");
        assert!(scored[0].score > scored[1].score);
        assert_eq!(scored[0].reasons[0], "References current file");
    }

    #[test]
    fn test_base_score_without_signals() {
        let now = Utc::now();
        let nodes = vec![stale_node("d", NodeType::Decision, now)];
        let scored = score_nodes_for_context_at(&nodes, &ContextSignals::default(), now);
        assert!(approx(scored[0].score, 0.3 + 0.1));
        assert!(scored[0].reasons.is_empty());
    }

    #[test]
    fn test_status_scales_accumulated_score() {
        let now = Utc::now();
        let mut node = stale_node("d", NodeType::Decision, now);
        node.references = vec!["src/a.rs".to_string()];
        node.status = NodeStatus::Superseded;

        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &with_file("src/a.rs"), now);
        // (1.0 exact + 0.6 same directory + 0.3 type + 0.1 confidence) * 0.3
        assert!(approx(scored[0].score, 0.6));
        assert_eq!(
            scored[0].reasons,
            vec![
                "References current file",
                "References similar file",
                "Superseded (low priority)"
            ]
        );
    }

    #[test]
    fn test_similar_file_counted_once() {
        let now = Utc::now();
        let mut node = stale_node("c", NodeType::Concept, now);
        node.references = vec![
            "src/auth/logout.rs".to_string(),
            "src/auth/session.rs".to_string(),
        ];

        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &with_file("src/auth/login.rs"), now);
        assert!(approx(scored[0].score, 0.6 + 0.15 + 0.1));
        assert_eq!(scored[0].reasons, vec!["References similar file"]);
    }

    #[test]
    fn test_connectivity_bonus_follows_status() {
        let now = Utc::now();
        let mut node = stale_node("d", NodeType::Decision, now);
        node.status = NodeStatus::Superseded;
        node.relations = (0..4)
            .map(|i| Relation {
                kind: RelationType::RelatesTo,
                target: format!("n{}", i),
                description: None,
                confidence: 0.7,
            })
            .collect();

        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &ContextSignals::default(), now);
        assert!(approx(scored[0].score, 0.4 * 0.3 + 0.15));
        assert_eq!(scored[0].reasons.last().unwrap(), "Well-connected (4 relations)");
    }

    #[test]
    fn test_needs_review_is_penalised() {
        let now = Utc::now();
        let mut node = stale_node("c", NodeType::Component, now);
        node.status = NodeStatus::NeedsReview;
        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &ContextSignals::default(), now);
        assert!(approx(scored[0].score, 0.3 * 0.8));
    }

    #[test]
    fn test_recent_files_fraction() {
        let now = Utc::now();
        let mut node = stale_node("c", NodeType::Session, now);
        node.references = vec!["a.rs".to_string(), "b.rs".to_string()];
        let signals = ContextSignals {
            recent_files: ["a.rs", "b.rs", "c.rs", "d.rs"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            ..Default::default()
        };

        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &signals, now);
        assert!(approx(scored[0].score, 0.2 + 0.05 + 0.1));
        assert_eq!(scored[0].reasons, vec!["References 2 recent file(s)"]);
    }

    #[test]
    fn test_task_keywords() {
        let now = Utc::now();
        let mut node = stale_node("c", NodeType::Component, now);
        node.title = "Authentication service".to_string();
        node.tags = vec!["tokens".to_string()];
        let signals = ContextSignals {
            current_task: Some("Refactor the authentication tokens".to_string()),
            ..Default::default()
        };

        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &signals, now);
        // refactor, authentication, tokens: two of three match.
        assert!(approx(scored[0].score, 2.0 / 3.0 * 0.8 + 0.2 + 0.1));
        assert_eq!(scored[0].reasons, vec!["Matches task keywords (67%)"]);
    }

    #[test]
    fn test_task_keywords_need_more_than_threshold() {
        let now = Utc::now();
        let mut node = stale_node("c", NodeType::Component, now);
        node.title = "alpha bravo charlie".to_string();
        let task = "alpha bravo charlie delta echo foxtrot golf hotel india juliet";
        let signals = ContextSignals {
            current_task: Some(task.to_string()),
            ..Default::default()
        };

        // Three of ten keywords sits exactly on the threshold.
        let nodes = vec![node.clone()];
        let scored = score_nodes_for_context_at(&nodes, &signals, now);
        assert!(approx(scored[0].score, 0.2 + 0.1));
        assert!(scored[0].reasons.is_empty());

        node.title = "alpha bravo charlie delta".to_string();
        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &signals, now);
        assert!(approx(scored[0].score, 0.4 * 0.8 + 0.2 + 0.1));
        assert_eq!(scored[0].reasons, vec!["Matches task keywords (40%)"]);
    }

    #[test]
    fn test_recently_modified() {
        let now = Utc::now();
        let mut node = stale_node("p", NodeType::Pattern, now);
        node.modified = now;
        let nodes = vec![node];
        let scored = score_nodes_for_context_at(&nodes, &ContextSignals::default(), now);
        assert!(approx(scored[0].score, 0.2 + 0.1 + 0.3));
        assert_eq!(scored[0].reasons, vec!["Recently modified"]);
    }

    #[test]
    fn test_files_are_similar() {
        assert!(files_are_similar("src/auth/login.rs", "src/auth/logout.rs"));
        assert!(files_are_similar("src/auth.rs", "tests/auth.rs"));
        assert!(files_are_similar("src/auth.rs", "tests/auth_test.rs"));
        assert!(!files_are_similar("src/auth.rs", "tests/billing.rs"));
        assert!(!files_are_similar("auth.rs", "billing.rs"));
        assert!(!files_are_similar(".env", "src/main.rs"));
    }

    #[test]
    fn test_extract_keywords() {
        let keywords =
            extract_keywords("Refactor the Authentication flow with these authentication helpers");
        assert_eq!(keywords, vec!["refactor", "authentication", "flow", "helpers"]);
        assert!(extract_keywords("fix the bug").is_empty());
    }

    #[test]
    fn test_group_by_relevance_partitions() {
        let now = Utc::now();
        let nodes: Vec<KnowledgeNode> = (0..4)
            .map(|i| stale_node(&format!("n{}", i), NodeType::Concept, now))
            .collect();
        let scored: Vec<ScoredNode> = nodes
            .iter()
            .zip([1.4, 1.0, 0.5, 0.49])
            .map(|(node, score)| ScoredNode {
                node,
                score,
                reasons: Vec::new(),
            })
            .collect();

        let groups = group_by_relevance(scored);
        let ids = |group: &[ScoredNode]| -> Vec<String> {
            group.iter().map(|s| s.node.id.clone()).collect()
        };
        assert_eq!(ids(&groups.high), vec!["n0", "n1"]);
        assert_eq!(ids(&groups.medium), vec!["n2"]);
        assert_eq!(ids(&groups.low), vec!["n3"]);
    }

    #[test]
    fn test_results_sorted_descending() {
        let now = Utc::now();
        let nodes: Vec<KnowledgeNode> = NodeType::ALL
            .iter()
            .map(|t| stale_node(t.as_str(), *t, now))
            .collect();
        let scored = score_nodes_for_context_at(&nodes, &ContextSignals::default(), now);
        assert_eq!(scored.len(), nodes.len());
        assert_eq!(scored[0].node.id, "decision");
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
