//! Ranking over a snapshot of stored nodes: filtered search, tag and file
//! lookups, full-text scoring and relation-graph traversal.
//!
//! Every entry point borrows the node slice it is given and returns
//! `SearchResult`s pointing into it; nothing is cached between calls.

pub mod ranking;
pub mod traverse;

pub use ranking::{
    find_by_file_reference, find_by_tags, full_text_search, search, search_at, SearchResult,
    TagMatchMode, DEFAULT_LIMIT,
};
pub use traverse::{find_related, DEFAULT_MAX_DEPTH, DEPTH_DECAY};
