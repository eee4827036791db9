//! Keyword-heuristic classification of captured text into one of the seven
//! node types.

pub mod classifier;
pub mod heuristics;

pub use classifier::{
    classify, classify_batch, reclassify, Alternative, Classification, ClassificationRequest,
    NEEDS_REVIEW_THRESHOLD, RECLASSIFY_THRESHOLD,
};
pub use heuristics::{classify_node_type, suggest_alternatives, ClassificationResult};
