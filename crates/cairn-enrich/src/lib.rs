//! Enrichment of the knowledge graph: rule-based relation inference between
//! nodes and relevance scoring of nodes against the current working context.

pub mod context;
pub mod relations;

pub use context::{
    extract_keywords, files_are_similar, group_by_relevance, score_nodes_for_context,
    score_nodes_for_context_at, ContextSignals, RelevanceGroups, ScoredNode,
};
pub use relations::{
    filter_by_confidence, group_by_action, infer_relations, signals_between, InferredRelation,
    RelationGroups, RelationSignals, DEFAULT_AUTO_CREATE_THRESHOLD,
};
