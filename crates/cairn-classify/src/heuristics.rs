// ── Keyword Heuristics ──
//
// Each node type owns an ordered list of weighted keyword groups. A keyword
// counts once when it occurs anywhere in the lower-cased text (substring
// containment, so "decide" and "decided" both fire on "decided").

use cairn_core::{CaptureSource, NodeType};

// ── Tables ──

pub struct KeywordGroup {
    pub keywords: &'static [&'static str],
    pub weight: f64,
}

const fn group(keywords: &'static [&'static str], weight: f64) -> KeywordGroup {
    KeywordGroup { keywords, weight }
}

const DECISION: &[KeywordGroup] = &[
    group(&["chose", "choose", "decided", "decide", "selected", "select"], 1.0),
    group(&["decision", "choice", "selection"], 0.9),
    group(&["adopt", "use", "switch to", "move to"], 0.8),
    group(&["instead of", "over", "rather than", "vs"], 0.7),
    group(&["because", "since", "reason", "rationale"], 0.6),
    group(&["alternative", "option", "considered"], 0.5),
];

const COMPONENT: &[KeywordGroup] = &[
    group(&["service", "module", "class", "function", "method"], 1.0),
    group(&["component", "controller", "model", "view"], 0.9),
    group(&["handles", "manages", "implements", "provides"], 0.8),
    group(&["api", "endpoint", "route", "handler"], 0.7),
    group(&["created", "built", "implemented"], 0.6),
];

const CONVENTION: &[KeywordGroup] = &[
    group(&["always", "never", "must", "should", "shall"], 1.0),
    group(&["convention", "standard", "practice", "guideline"], 0.9),
    group(&["rule", "policy", "requirement"], 0.8),
    group(&["style", "format", "naming", "pattern"], 0.7),
    group(&["all", "every", "each", "any"], 0.6),
];

const CONCEPT: &[KeywordGroup] = &[
    group(&["concept", "idea", "notion", "model"], 1.0),
    group(&["represents", "means", "refers to", "is"], 0.9),
    group(&["lifecycle", "workflow", "process", "flow"], 0.8),
    group(&["state", "status", "phase", "stage"], 0.7),
    group(&["domain", "business", "entity"], 0.6),
];

const SESSION: &[KeywordGroup] = &[
    group(&["session", "worked on", "accomplished", "completed"], 1.0),
    group(&["today", "this session", "summary"], 0.9),
    group(&["implemented", "fixed", "added", "updated"], 0.7),
    group(&["progress", "status update"], 0.6),
];

const PATTERN: &[KeywordGroup] = &[
    group(&["pattern", "approach", "strategy", "technique"], 1.0),
    group(&["reusable", "generic", "abstract", "common"], 0.9),
    group(&["design pattern", "architectural pattern"], 0.95),
    group(&["factory", "singleton", "observer", "repository"], 0.8),
    group(&["template", "blueprint", "recipe"], 0.7),
];

const ISSUE: &[KeywordGroup] = &[
    group(&["issue", "problem", "bug", "error", "defect"], 1.0),
    group(&["broken", "failing", "not working"], 0.9),
    group(&["debt", "technical debt", "todo", "fixme"], 0.8),
    group(&["bottleneck", "performance", "slow"], 0.7),
    group(&["needs fix", "needs refactor", "improvement needed"], 0.6),
];

/// Additive per-type boost for the capture origin. `Manual` boosts nothing.
const CONTEXT_BOOSTS: &[(CaptureSource, NodeType, f64)] = &[
    (CaptureSource::HookWrite, NodeType::Component, 0.3),
    (CaptureSource::HookWrite, NodeType::Convention, 0.2),
    (CaptureSource::HookCommit, NodeType::Decision, 0.3),
    (CaptureSource::HookCommit, NodeType::Issue, 0.2),
    (CaptureSource::HookSession, NodeType::Session, 0.5),
];

/// Fixed divisor turning a raw keyword score into a confidence.
pub const SCORE_NORMALIZATION: f64 = 10.0;

/// Heuristic results never claim certainty.
pub const MAX_HEURISTIC_CONFIDENCE: f64 = 0.95;

const MAX_REASONING_KEYWORDS: usize = 3;
const RUNNER_UP_RATIO: f64 = 0.7;

pub fn keyword_groups(node_type: NodeType) -> &'static [KeywordGroup] {
    match node_type {
        NodeType::Decision => DECISION,
        NodeType::Component => COMPONENT,
        NodeType::Convention => CONVENTION,
        NodeType::Concept => CONCEPT,
        NodeType::Session => SESSION,
        NodeType::Pattern => PATTERN,
        NodeType::Issue => ISSUE,
    }
}

fn context_boost(source: CaptureSource, node_type: NodeType) -> f64 {
    CONTEXT_BOOSTS
        .iter()
        .filter(|(s, t, _)| *s == source && *t == node_type)
        .map(|(_, _, boost)| boost)
        .sum()
}

// ── Types ──

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub node_type: NodeType,
    pub confidence: f64,
    pub reasoning: String,
}

// ── Scoring ──

fn classification_text(title: &str, content: &str) -> String {
    format!("{} {}", title, content).to_lowercase()
}

fn keyword_score(node_type: NodeType, text: &str) -> f64 {
    keyword_groups(node_type)
        .iter()
        .map(|g| g.weight * g.keywords.iter().filter(|k| text.contains(*k)).count() as f64)
        .sum()
}

pub(crate) fn to_confidence(score: f64) -> f64 {
    (score / SCORE_NORMALIZATION).min(MAX_HEURISTIC_CONFIDENCE)
}

/// Per-type scores in declaration order, including the context boost.
pub fn score_types(text: &str, source: Option<CaptureSource>) -> Vec<(NodeType, f64)> {
    let source = source.unwrap_or_default();
    NodeType::ALL
        .iter()
        .map(|&t| (t, keyword_score(t, text) + context_boost(source, t)))
        .collect()
}

/// Boost-free positive scores, highest first. Ties keep declaration order.
pub fn ranked_scores(title: &str, content: &str) -> Vec<(NodeType, f64)> {
    let text = classification_text(title, content);
    let mut scores: Vec<(NodeType, f64)> = score_types(&text, None)
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}

/// Pick the best-scoring type for the text. Falls back to `Concept` when
/// nothing matches.
pub fn classify_node_type(
    title: &str,
    content: &str,
    source: Option<CaptureSource>,
) -> ClassificationResult {
    let text = classification_text(title, content);
    let scores = score_types(&text, source);

    let mut best_type = NodeType::Concept;
    let mut best_score = 0.0;
    for &(node_type, score) in &scores {
        if score > best_score {
            best_type = node_type;
            best_score = score;
        }
    }

    ClassificationResult {
        node_type: best_type,
        confidence: to_confidence(best_score),
        reasoning: reasoning(best_type, best_score, &text, &scores),
    }
}

fn reasoning(chosen: NodeType, chosen_score: f64, text: &str, scores: &[(NodeType, f64)]) -> String {
    let matched: Vec<&str> = keyword_groups(chosen)
        .iter()
        .flat_map(|g| g.keywords.iter().copied())
        .filter(|k| text.contains(k))
        .take(MAX_REASONING_KEYWORDS)
        .collect();

    let mut reasoning = format!(
        "Classified as '{}' based on keywords: {}",
        chosen,
        matched.join(", ")
    );

    let mut others: Vec<&(NodeType, f64)> = scores.iter().filter(|(t, _)| *t != chosen).collect();
    others.sort_by(|a, b| b.1.total_cmp(&a.1));
    if let Some((runner_up, score)) = others.first() {
        if *score > chosen_score * RUNNER_UP_RATIO {
            reasoning.push_str(&format!(
                ". Also considered '{}' (score: {:.2})",
                runner_up, score
            ));
        }
    }

    reasoning
}

/// Up to three candidate types by raw keyword score, without context boost.
pub fn suggest_alternatives(title: &str, content: &str) -> Vec<ClassificationResult> {
    ranked_scores(title, content)
        .into_iter()
        .take(3)
        .map(|(node_type, score)| ClassificationResult {
            node_type,
            confidence: to_confidence(score),
            reasoning: format!("Score: {:.2}", score),
        })
        .collect()
}

// ── Tests ──
