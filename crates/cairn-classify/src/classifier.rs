// ── Classifier ──
//
// Entry point used by capture: honours a caller-supplied type, otherwise runs
// the keyword heuristics and flags low-confidence results for review.

use cairn_core::{CaptureSource, NodeType};
use tracing::debug;

use crate::heuristics::{classify_node_type, ranked_scores, to_confidence};

/// Heuristic confidence below this is flagged for review.
pub const NEEDS_REVIEW_THRESHOLD: f64 = 0.6;

/// Minimum confidence before `reclassify` reports a type change.
pub const RECLASSIFY_THRESHOLD: f64 = 0.7;

const USER_HINT_CONFIDENCE: f64 = 0.95;
const MAX_ALTERNATIVES: usize = 3;

// ── Types ──

#[derive(Debug, Clone, Default)]
pub struct ClassificationRequest {
    pub title: String,
    pub content: String,
    pub source: Option<CaptureSource>,
    pub user_hint: Option<NodeType>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alternative {
    pub node_type: NodeType,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub node_type: NodeType,
    pub confidence: f64,
    pub reasoning: String,
    /// Only populated when `needs_review` is set. Never contains `node_type`.
    pub alternatives: Vec<Alternative>,
    pub needs_review: bool,
}

impl ClassificationRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: CaptureSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_hint(mut self, hint: NodeType) -> Self {
        self.user_hint = Some(hint);
        self
    }
}

// ── Public API ──

pub fn classify(request: &ClassificationRequest) -> Classification {
    if let Some(hint) = request.user_hint {
        return Classification {
            node_type: hint,
            confidence: USER_HINT_CONFIDENCE,
            reasoning: "User-specified type".to_string(),
            alternatives: Vec::new(),
            needs_review: false,
        };
    }

    let result = classify_node_type(&request.title, &request.content, request.source);
    debug!(
        node_type = %result.node_type,
        confidence = result.confidence,
        "heuristic classification"
    );

    if result.confidence >= NEEDS_REVIEW_THRESHOLD {
        return Classification {
            node_type: result.node_type,
            confidence: result.confidence,
            reasoning: result.reasoning,
            alternatives: Vec::new(),
            needs_review: false,
        };
    }

    let alternatives = ranked_scores(&request.title, &request.content)
        .into_iter()
        .filter(|(node_type, _)| *node_type != result.node_type)
        .take(MAX_ALTERNATIVES)
        .map(|(node_type, score)| Alternative {
            node_type,
            confidence: to_confidence(score),
        })
        .collect();

    Classification {
        node_type: result.node_type,
        confidence: result.confidence,
        reasoning: format!("{} (low confidence - review recommended)", result.reasoning),
        alternatives,
        needs_review: true,
    }
}

pub fn classify_batch(requests: &[ClassificationRequest]) -> Vec<Classification> {
    requests.iter().map(classify).collect()
}

/// Re-run classification after an edit. Returns the new classification only
/// when it disagrees with `current_type` and is confident enough to act on.
pub fn reclassify(current_type: NodeType, title: &str, content: &str) -> Option<Classification> {
    let result = classify(&ClassificationRequest::new(title, content));
    if result.node_type != current_type && result.confidence >= RECLASSIFY_THRESHOLD {
        debug!(from = %current_type, to = %result.node_type, "type drift detected");
        Some(result)
    } else {
        None
    }
}

// ── Tests ──
