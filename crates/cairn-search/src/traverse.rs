// ── Relation Traversal ──

use std::collections::{HashMap, HashSet};

use tracing::debug;

use cairn_core::{KnowledgeNode, RelationGraph};

use crate::ranking::SearchResult;

pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Score multiplier applied per hop away from the origin.
pub const DEPTH_DECAY: f64 = 0.7;

struct Traversal<'a, 'g, G: RelationGraph> {
    by_id: HashMap<&'a str, &'a KnowledgeNode>,
    graph: &'g G,
    max_depth: usize,
    visited: HashSet<String>,
    /// Best result per node, in first-reached order.
    results: Vec<SearchResult<'a>>,
    positions: HashMap<&'a str, usize>,
}

impl<'a, 'g, G: RelationGraph> Traversal<'a, 'g, G> {
    fn visit(&mut self, id: &str, depth: usize) {
        if depth >= self.max_depth || !self.visited.insert(id.to_string()) {
            return;
        }

        for related_id in self.graph.related_node_ids(id) {
            if self.visited.contains(&related_id) {
                continue;
            }
            let Some(node) = self.by_id.get(related_id.as_str()).copied() else {
                continue;
            };

            let hops = depth as i32 + 1;
            self.record(node, node.confidence * DEPTH_DECAY.powi(hops));
            self.visit(&related_id, depth + 1);
        }
    }

    fn record(&mut self, node: &'a KnowledgeNode, score: f64) {
        match self.positions.get(node.id.as_str()) {
            Some(&pos) => {
                let existing = &mut self.results[pos];
                existing.score = existing.score.max(score);
            }
            None => {
                self.positions.insert(node.id.as_str(), self.results.len());
                self.results.push(SearchResult { node, score });
            }
        }
    }
}

/// Nodes reachable from `node_id` within `max_depth` hops, scored
/// `confidence * 0.7^hops` (best path wins), highest first. The origin is
/// never part of the result and ids missing from `nodes` are skipped.
pub fn find_related<'a, G: RelationGraph>(
    nodes: &'a [KnowledgeNode],
    graph: &G,
    node_id: &str,
    max_depth: usize,
) -> Vec<SearchResult<'a>> {
    let mut traversal = Traversal {
        by_id: nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
        graph,
        max_depth,
        visited: HashSet::new(),
        results: Vec::new(),
        positions: HashMap::new(),
    };
    traversal.visit(node_id, 0);

    let mut results = traversal.results;
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    debug!(origin = node_id, max_depth, found = results.len(), "relation traversal");
    results
}

// ── Tests ──
