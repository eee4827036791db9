// ── Ranking ──

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::debug;

use cairn_core::{CairnError, KnowledgeNode, NodeFilter};

pub const DEFAULT_LIMIT: usize = 50;

const TYPE_MATCH_BOOST: f64 = 0.2;
const TAG_MATCH_WEIGHT: f64 = 0.3;
const TEXT_MATCH_WEIGHT: f64 = 0.5;
const RELATED_TO_BOOST: f64 = 0.3;
const MAX_RECENCY_BOOST: f64 = 0.2;
const RECENCY_HORIZON_DAYS: f64 = 365.0;
/// Occurrences of a single term beyond this add nothing.
const TERM_OCCURRENCE_CAP: usize = 5;

// ── Types ──

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<'a> {
    pub node: &'a KnowledgeNode,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMatchMode {
    /// Every requested tag must be present.
    #[default]
    All,
    /// At least one requested tag must be present.
    Any,
}

impl FromStr for TagMatchMode {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TagMatchMode::All),
            "any" => Ok(TagMatchMode::Any),
            other => Err(CairnError::UnknownVariant {
                kind: "tag match mode",
                value: other.to_string(),
            }),
        }
    }
}

// ── Scoring Helpers ──

/// Fraction of `requested` tags the node carries.
fn tag_score(node: &KnowledgeNode, requested: &[String]) -> f64 {
    if requested.is_empty() {
        return 0.0;
    }
    let matched = requested.iter().filter(|tag| node.has_tag(tag)).count();
    matched as f64 / requested.len() as f64
}

/// Mean over terms of `min(occurrences, 5) / 5`, occurrences being
/// non-overlapping matches in the node's searchable text.
fn text_score(node: &KnowledgeNode, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let text = node.searchable_text();
    let total: f64 = terms
        .iter()
        .map(|term| {
            let occurrences = text.matches(term.as_str()).count().min(TERM_OCCURRENCE_CAP);
            occurrences as f64 / TERM_OCCURRENCE_CAP as f64
        })
        .sum();
    (total / terms.len() as f64).min(1.0)
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn recency_boost(node: &KnowledgeNode, now: DateTime<Utc>) -> f64 {
    (MAX_RECENCY_BOOST - node.age_in_days(now) / RECENCY_HORIZON_DAYS * MAX_RECENCY_BOOST).max(0.0)
}

fn relevance(node: &KnowledgeNode, filter: &NodeFilter, now: DateTime<Utc>) -> f64 {
    let mut score = node.confidence;

    if filter.node_type == Some(node.node_type) {
        score += TYPE_MATCH_BOOST;
    }
    if !filter.tags.is_empty() {
        score += tag_score(node, &filter.tags) * TAG_MATCH_WEIGHT;
    }
    if let Some(query) = &filter.search_query {
        score += text_score(node, &query_terms(query)) * TEXT_MATCH_WEIGHT;
    }
    if let Some(related) = &filter.related_to {
        if node.relations.iter().any(|r| &r.target == related) {
            score += RELATED_TO_BOOST;
        }
    }

    (score + recency_boost(node, now)).min(1.0)
}

fn sort_descending(results: &mut [SearchResult<'_>]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

// ── Public API ──

pub fn search<'a>(
    nodes: &'a [KnowledgeNode],
    filter: &NodeFilter,
    limit: usize,
    offset: usize,
) -> Vec<SearchResult<'a>> {
    search_at(nodes, filter, limit, offset, Utc::now())
}

/// Nodes matching `filter`, ranked by relevance as of `now`, then the page
/// `[offset, offset + limit)`.
pub fn search_at<'a>(
    nodes: &'a [KnowledgeNode],
    filter: &NodeFilter,
    limit: usize,
    offset: usize,
    now: DateTime<Utc>,
) -> Vec<SearchResult<'a>> {
    let mut results: Vec<SearchResult<'a>> = nodes
        .iter()
        .filter(|node| filter.matches(node))
        .map(|node| SearchResult {
            node,
            score: relevance(node, filter, now),
        })
        .collect();
    sort_descending(&mut results);
    debug!(matched = results.len(), offset, limit, "filtered search");

    results.into_iter().skip(offset).take(limit).collect()
}

pub fn find_by_tags<'a>(
    nodes: &'a [KnowledgeNode],
    tags: &[String],
    mode: TagMatchMode,
) -> Vec<SearchResult<'a>> {
    let mut results: Vec<SearchResult<'a>> = nodes
        .iter()
        .filter(|node| match mode {
            TagMatchMode::All => tags.iter().all(|tag| node.has_tag(tag)),
            TagMatchMode::Any => tags.iter().any(|tag| node.has_tag(tag)),
        })
        .map(|node| SearchResult {
            node,
            score: tag_score(node, tags),
        })
        .collect();
    sort_descending(&mut results);
    results
}

pub fn full_text_search<'a>(
    nodes: &'a [KnowledgeNode],
    query: &str,
    limit: usize,
) -> Vec<SearchResult<'a>> {
    let terms = query_terms(query);
    let mut results: Vec<SearchResult<'a>> = nodes
        .iter()
        .map(|node| SearchResult {
            node,
            score: text_score(node, &terms),
        })
        .filter(|r| r.score > 0.0)
        .collect();
    sort_descending(&mut results);
    results.truncate(limit);
    results
}

/// Nodes with a reference equal to or containing `path`, all scored 1.0.
pub fn find_by_file_reference<'a>(nodes: &'a [KnowledgeNode], path: &str) -> Vec<SearchResult<'a>> {
    nodes
        .iter()
        .filter(|node| node.references.iter().any(|r| r.contains(path)))
        .map(|node| SearchResult { node, score: 1.0 })
        .collect()
}

// ── Tests ──
