// ── Markdown Rendering ──
//
// Tool results are plain markdown text. Nothing here touches storage.

use std::str::FromStr;

use cairn_capture::{CaptureOutcome, DeleteOutcome, UpdateOutcome};
use cairn_core::{KnowledgeNode, NodeStatus, NodeType, RelationType};
use cairn_enrich::{ContextSignals, InferredRelation, ScoredNode};
use cairn_search::SearchResult;
use cairn_store::{DirectedRelation, Direction, GraphStats};

const QUERY_PREVIEW_CHARS: usize = 200;
const CONTEXT_PREVIEW_CHARS: usize = 300;
const LISTED_RELATIONS: usize = 3;
const LISTED_REFERENCES: usize = 3;
const RECENT_ACTIVITY: usize = 5;
const LISTED_REVIEWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusDetail {
    #[default]
    Summary,
    Full,
}

impl FromStr for StatusDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(StatusDetail::Summary),
            "full" => Ok(StatusDetail::Full),
            other => Err(format!("unknown status detail: {other} (expected summary or full)")),
        }
    }
}

// ── Helpers ──

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

fn tag_list(tags: &[String]) -> String {
    if tags.is_empty() {
        "none".to_string()
    } else {
        tags.join(", ")
    }
}

/// First `max_chars` characters of `content`, with "..." when cut.
fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn relation_lines(relations: &[InferredRelation]) -> Vec<String> {
    relations
        .iter()
        .map(|r| {
            format!(
                "- {} -> {} ({}): {}",
                r.relation_type,
                r.target,
                percent(r.confidence),
                r.reasoning
            )
        })
        .collect()
}

fn direct_relation_line(directed: &DirectedRelation<'_>) -> String {
    let relation = directed.relation;
    let mut line = match directed.direction {
        Direction::Outgoing => format!("- {} -> {}", relation.kind, relation.target),
        Direction::Incoming => format!("- {} <- {}", relation.kind, relation.source),
    };
    line.push_str(&format!(" ({})", percent(relation.confidence)));
    if let Some(description) = &relation.description {
        line.push_str(&format!(": {}", description));
    }
    line
}

fn count_lines<T: std::fmt::Display>(counts: &[(T, usize)]) -> Vec<String> {
    counts
        .iter()
        .map(|(label, count)| format!("- **{}**: {}", label, count))
        .collect()
}

// ── Public API ──

pub fn capture_report(outcome: &CaptureOutcome, auto_classified: bool) -> String {
    let node = &outcome.node;
    let mut out = vec![
        format!("Created {} node: {}", node.node_type, node.id),
        String::new(),
        format!("Title: {}", node.title),
        format!("Type: {}", node.node_type),
        format!("Tags: {}", tag_list(&node.tags)),
        format!("Confidence: {:.2}", node.confidence),
    ];

    if auto_classified {
        let classification = &outcome.classification;
        out.push(format!(
            "Auto-classified as '{}' (confidence: {})",
            classification.node_type,
            percent(classification.confidence)
        ));
        if classification.needs_review && !classification.alternatives.is_empty() {
            let alternatives: Vec<String> = classification
                .alternatives
                .iter()
                .map(|a| format!("{} ({})", a.node_type, percent(a.confidence)))
                .collect();
            out.push(format!(
                "Low confidence, marked for review. Alternatives: {}",
                alternatives.join(", ")
            ));
        }
    }

    if !outcome.created_relations.is_empty() {
        out.push(String::new());
        out.push("Relations created:".to_string());
        out.extend(relation_lines(&outcome.created_relations));
    }
    if !outcome.suggested_relations.is_empty() {
        out.push(String::new());
        out.push("Suggested relations (not created):".to_string());
        out.extend(relation_lines(&outcome.suggested_relations));
    }

    out.push(String::new());
    out.push(format!("Saved to {}", outcome.path.display()));
    out.join("\n")
}

pub fn update_report(outcome: &UpdateOutcome) -> String {
    let node = &outcome.node;
    let mut out = vec![
        format!("Updated {} node: {}", node.node_type, node.id),
        String::new(),
        format!("Title: {}", node.title),
        format!("Tags: {}", tag_list(&node.tags)),
        format!("Status: {}", node.status),
        format!("Confidence: {:.2}", node.confidence),
    ];
    if let Some(drift) = &outcome.drift {
        out.push(String::new());
        out.push(format!(
            "Content now reads as '{}' ({}). The node is still a {}.",
            drift.node_type,
            percent(drift.confidence),
            node.node_type
        ));
    }
    out.join("\n")
}

pub fn delete_report(outcome: &DeleteOutcome) -> String {
    format!(
        "Deleted {} node: {} ({})\nRemoved {} relation(s) from the graph.",
        outcome.node.node_type, outcome.node.id, outcome.node.title, outcome.removed_relations
    )
}

pub fn relate_report(
    source: &KnowledgeNode,
    target: &KnowledgeNode,
    kind: RelationType,
    description: Option<&str>,
    bidirectional: bool,
) -> String {
    let mut out = vec![
        "Created relationship:".to_string(),
        String::new(),
        format!("{} ({})", source.title, source.id),
        format!("  {}", kind.as_str().to_uppercase()),
        format!("{} ({})", target.title, target.id),
    ];
    if let Some(description) = description {
        out.push(String::new());
        out.push(format!("Description: {}", description));
    }
    if bidirectional {
        out.push("(bidirectional relationship created)".to_string());
    }
    out.join("\n")
}

pub fn unrelate_report(source: &str, target: &str, kind: RelationType, removed: bool) -> String {
    if removed {
        format!("Removed {} relation: {} -> {}", kind, source, target)
    } else {
        format!("No {} relation from {} to {}", kind, source, target)
    }
}

pub fn query_report(results: &[SearchResult<'_>]) -> String {
    if results.is_empty() {
        return "No nodes found matching the query criteria.".to_string();
    }

    let mut out = vec![format!("Found {} node(s):", results.len())];
    for SearchResult { node, score } in results {
        out.push(String::new());
        out.push(format!("## {}", node.title));
        out.push(format!("- **ID**: {}", node.id));
        out.push(format!("- **Type**: {}", node.node_type));
        out.push(format!("- **Tags**: {}", tag_list(&node.tags)));
        out.push(format!("- **Confidence**: {:.2}", node.confidence));
        out.push(format!("- **Score**: {:.2}", score));
        out.push(format!("- **Status**: {}", node.status));
        out.push(format!("- **Modified**: {}", node.modified.format("%Y-%m-%d")));
        if !node.relations.is_empty() {
            out.push(format!("- **Relations**: {} related node(s)", node.relations.len()));
        }
        out.push(format!("- **Preview**: {}", preview(&node.content, QUERY_PREVIEW_CHARS)));
    }
    out.join("\n")
}

/// Traversal results plus the edges stored on `origin` itself.
pub fn related_report(
    origin: &KnowledgeNode,
    results: &[SearchResult<'_>],
    direct: &[DirectedRelation<'_>],
    depth: usize,
) -> String {
    if results.is_empty() && direct.is_empty() {
        return format!(
            "No nodes related to {} ({}) within depth {}.",
            origin.title, origin.id, depth
        );
    }

    let mut out = vec![
        format!("# Related to {} ({} nodes)", origin.title, results.len()),
        String::new(),
    ];
    out.extend(results.iter().map(|r| {
        format!(
            "- **{}** ({}, {}) score {:.2}",
            r.node.title, r.node.node_type, r.node.id, r.score
        )
    }));
    if !direct.is_empty() {
        out.extend([String::new(), "## Direct Relations".to_string(), String::new()]);
        out.extend(direct.iter().map(direct_relation_line));
    }
    out.join("\n")
}

pub fn context_report(scored: &[ScoredNode<'_>], signals: &ContextSignals) -> String {
    if scored.is_empty() {
        return "No relevant knowledge found for the current context.".to_string();
    }

    let mut out = vec![format!("# Relevant Knowledge ({} nodes)", scored.len())];
    if let Some(file) = &signals.current_file {
        out.push(format!("**Current File**: {}", file));
    }
    if let Some(task) = &signals.current_task {
        out.push(format!("**Current Task**: {}", task));
    }

    for ScoredNode {
        node,
        score,
        reasons,
    } in scored
    {
        out.push(String::new());
        out.push(format!("## {}", node.title));
        out.push(format!("- **Type**: {}", node.node_type));
        out.push(format!("- **Relevance**: {}", percent(*score)));
        out.push(format!("- **Why**: {}", reasons.join("; ")));
        out.push(format!("- **Tags**: {}", tag_list(&node.tags)));
        if !node.references.is_empty() {
            let shown: Vec<&str> = node
                .references
                .iter()
                .take(LISTED_REFERENCES)
                .map(String::as_str)
                .collect();
            out.push(format!("- **References**: {}", shown.join(", ")));
        }
        out.push(String::new());
        out.push(preview(&node.content, CONTEXT_PREVIEW_CHARS));
        if !node.relations.is_empty() {
            let targets: Vec<&str> = node
                .relations
                .iter()
                .take(LISTED_RELATIONS)
                .map(|r| r.target.as_str())
                .collect();
            let mut line = format!("**Related to**: {}", targets.join(", "));
            if node.relations.len() > LISTED_RELATIONS {
                line.push_str(&format!(" (+{} more)", node.relations.len() - LISTED_RELATIONS));
            }
            out.push(String::new());
            out.push(line);
        }
    }
    out.join("\n")
}

pub fn status_report(nodes: &[KnowledgeNode], stats: &GraphStats, detail: StatusDetail) -> String {
    let by_type: Vec<(NodeType, usize)> = NodeType::ALL
        .iter()
        .map(|&t| (t, nodes.iter().filter(|n| n.node_type == t).count()))
        .filter(|(_, count)| *count > 0)
        .collect();
    let by_status: Vec<(NodeStatus, usize)> = NodeStatus::ALL
        .iter()
        .map(|&s| (s, nodes.iter().filter(|n| n.status == s).count()))
        .filter(|(_, count)| *count > 0)
        .collect();
    let high = nodes.iter().filter(|n| n.confidence >= 0.8).count();
    let low = nodes.iter().filter(|n| n.confidence < 0.5).count();

    let mut out = vec![
        "# Knowledge Graph Status".to_string(),
        String::new(),
        format!("**Total Nodes**: {}", nodes.len()),
        format!("**Total Relations**: {}", stats.total_relations),
        String::new(),
        "## Nodes by Type".to_string(),
        String::new(),
    ];
    out.extend(count_lines(&by_type));
    out.extend([String::new(), "## Nodes by Status".to_string(), String::new()]);
    out.extend(count_lines(&by_status));
    out.extend([
        String::new(),
        "## Confidence Distribution".to_string(),
        String::new(),
        format!("- **High (>=0.8)**: {}", high),
        format!("- **Medium (0.5-0.8)**: {}", nodes.len() - high - low),
        format!("- **Low (<0.5)**: {}", low),
    ]);

    if detail == StatusDetail::Full {
        out.extend([
            String::new(),
            format!(
                "**Graph Updated**: {}",
                stats.last_updated.format("%Y-%m-%d %H:%M UTC")
            ),
        ]);
        if !stats.by_type.is_empty() {
            out.extend([String::new(), "## Relations by Type".to_string(), String::new()]);
            out.extend(count_lines(&stats.by_type));
        }

        let mut recent: Vec<&KnowledgeNode> = nodes.iter().collect();
        recent.sort_by(|a, b| b.modified.cmp(&a.modified));
        if !recent.is_empty() {
            out.extend([String::new(), "## Recent Activity".to_string(), String::new()]);
            out.extend(recent.iter().take(RECENT_ACTIVITY).map(|n| {
                format!(
                    "- **{}** ({}) - {}",
                    n.title,
                    n.node_type,
                    n.modified.format("%Y-%m-%d")
                )
            }));
        }

        let review: Vec<&KnowledgeNode> = nodes
            .iter()
            .filter(|n| n.status == NodeStatus::NeedsReview)
            .collect();
        if !review.is_empty() {
            out.extend([
                String::new(),
                format!("## Nodes Needing Review: {}", review.len()),
                String::new(),
            ]);
            out.extend(
                review
                    .iter()
                    .take(LISTED_REVIEWS)
                    .map(|n| format!("- **{}** ({})", n.title, n.id)),
            );
            if review.len() > LISTED_REVIEWS {
                out.push(format!("  ... and {} more", review.len() - LISTED_REVIEWS));
            }
        }
    }

    out.join("\n")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_classify::{Alternative, Classification};
    use cairn_core::{GraphRelation, Relation};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn node(id: &str, node_type: NodeType, title: &str, tags: &[&str]) -> KnowledgeNode {
        let mut node = KnowledgeNode::new(id, node_type, title, "Body text");
        node.tags = tags.iter().map(|t| t.to_string()).collect();
        node.modified = Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap();
        node.created = node.modified;
        node
    }

    fn inferred(target: &str, kind: RelationType, confidence: f64, reasoning: &str) -> InferredRelation {
        InferredRelation {
            source: "use-jwt-1a2b3c4d".to_string(),
            target: target.to_string(),
            relation_type: kind,
            confidence,
            reasoning: reasoning.to_string(),
        }
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
    }

    #[test]
    fn test_capture_report() {
        let outcome = CaptureOutcome {
            node: node("use-jwt-1a2b3c4d", NodeType::Decision, "Use JWT", &["auth"]),
            path: PathBuf::from(".cairn/nodes/decisions/use-jwt-1a2b3c4d.md"),
            classification: Classification {
                node_type: NodeType::Decision,
                confidence: 0.45,
                reasoning: "Matched keywords".to_string(),
                alternatives: vec![Alternative {
                    node_type: NodeType::Convention,
                    confidence: 0.3,
                }],
                needs_review: true,
            },
            created_relations: vec![inferred(
                "auth-service-9f8e7d6c",
                RelationType::Affects,
                0.9,
                "Decision affects component (tag overlap: 100%)",
            )],
            suggested_relations: Vec::new(),
        };

        insta::assert_snapshot!(capture_report(&outcome, true), @r"
        Created decision node: use-jwt-1a2b3c4d

        Title: Use JWT
        Type: decision
        Tags: auth
        Confidence: 0.80
        Auto-classified as 'decision' (confidence: 45%)
        Low confidence, marked for review. Alternatives: convention (30%)

        Relations created:
        - affects -> auth-service-9f8e7d6c (90%): Decision affects component (tag overlap: 100%)

        Saved to .cairn/nodes/decisions/use-jwt-1a2b3c4d.md
        ");

        let hinted = capture_report(&outcome, false);
        assert!(!hinted.contains("Auto-classified"));
    }

    #[test]
    fn test_relate_report() {
        let source = node("b", NodeType::Decision, "New auth", &[]);
        let target = node("a", NodeType::Decision, "Old auth", &[]);
        let report = relate_report(
            &source,
            &target,
            RelationType::Supersedes,
            Some("Replaced sessions"),
            true,
        );
        insta::assert_snapshot!(report, @r"
        Created relationship:

        New auth (b)
          SUPERSEDES
        Old auth (a)

        Description: Replaced sessions
        (bidirectional relationship created)
        ");
    }

    #[test]
    fn test_query_report() {
        assert_eq!(query_report(&[]), "No nodes found matching the query criteria.");

        let mut pg = node("pg", NodeType::Decision, "Use PostgreSQL", &["database"]);
        pg.relations.push(Relation {
            kind: RelationType::Affects,
            target: "api".to_string(),
            description: None,
            confidence: 0.8,
        });
        let results = vec![SearchResult {
            node: &pg,
            score: 0.75,
        }];
        insta::assert_snapshot!(query_report(&results), @r"
        Found 1 node(s):

        ## Use PostgreSQL
        - **ID**: pg
        - **Type**: decision
        - **Tags**: database
        - **Confidence**: 0.80
        - **Score**: 0.75
        - **Status**: active
        - **Modified**: 2026-02-24
        - **Relations**: 1 related node(s)
        - **Preview**: Body text
        ");
    }

    #[test]
    fn test_related_report() {
        let gateway = node("gateway", NodeType::Component, "Api gateway", &[]);
        let limiter = node("limiter", NodeType::Component, "Rate limiter", &[]);
        let outgoing = GraphRelation {
            source: "gateway".to_string(),
            target: "limiter".to_string(),
            kind: RelationType::Uses,
            description: Some("throttles requests".to_string()),
            confidence: 0.8,
        };
        let incoming = GraphRelation {
            source: "jwt".to_string(),
            target: "gateway".to_string(),
            kind: RelationType::Affects,
            description: None,
            confidence: 0.9,
        };
        let direct = vec![
            DirectedRelation {
                relation: &outgoing,
                direction: Direction::Outgoing,
            },
            DirectedRelation {
                relation: &incoming,
                direction: Direction::Incoming,
            },
        ];
        let results = vec![SearchResult {
            node: &limiter,
            score: 0.63,
        }];

        insta::assert_snapshot!(related_report(&gateway, &results, &direct, 2), @r"
        # Related to Api gateway (1 nodes)

        - **Rate limiter** (component, limiter) score 0.63

        ## Direct Relations

        - uses -> limiter (80%): throttles requests
        - affects <- jwt (90%)
        ");
        assert_eq!(
            related_report(&gateway, &[], &[], 3),
            "No nodes related to Api gateway (gateway) within depth 3."
        );
    }

    #[test]
    fn test_context_report() {
        let mut auth = node("auth", NodeType::Component, "Auth service", &["auth"]);
        auth.references = vec!["src/auth.rs".to_string()];
        for target in ["a", "b", "c", "d"] {
            auth.relations.push(Relation {
                kind: RelationType::Uses,
                target: target.to_string(),
                description: None,
                confidence: 0.8,
            });
        }
        let scored = vec![ScoredNode {
            node: &auth,
            score: 0.5,
            reasons: vec!["References current file".to_string()],
        }];
        let signals = ContextSignals {
            current_file: Some("src/auth.rs".to_string()),
            ..Default::default()
        };

        insta::assert_snapshot!(context_report(&scored, &signals), @r"
        # Relevant Knowledge (1 nodes)
        **Current File**: src/auth.rs

        ## Auth service
        - **Type**: component
        - **Relevance**: 50%
        - **Why**: References current file
        - **Tags**: auth
        - **References**: src/auth.rs

        Body text

        **Related to**: a, b, c (+1 more)
        ");
        assert!(context_report(&[], &signals).starts_with("No relevant knowledge"));

        let mut many = auth.clone();
        many.references = ["a.rs", "b.rs", "c.rs", "d.rs"].map(String::from).to_vec();
        let scored = vec![ScoredNode {
            node: &many,
            score: 0.5,
            reasons: Vec::new(),
        }];
        let report = context_report(&scored, &signals);
        assert!(report.contains("- **References**: a.rs, b.rs, c.rs\n"));
    }

    #[test]
    fn test_status_report_summary() {
        let mut weak = node("weak", NodeType::Concept, "Weak idea", &[]);
        weak.confidence = 0.3;
        weak.status = NodeStatus::NeedsReview;
        let nodes = vec![
            node("pg", NodeType::Decision, "Use PostgreSQL", &[]),
            node("redis", NodeType::Decision, "Use Redis", &[]),
            weak,
        ];
        let stats = GraphStats {
            total_relations: 2,
            by_type: vec![(RelationType::Uses, 2)],
            last_updated: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
        };

        insta::assert_snapshot!(status_report(&nodes, &stats, StatusDetail::Summary), @r"
        # Knowledge Graph Status

        **Total Nodes**: 3
        **Total Relations**: 2

        ## Nodes by Type

        - **decision**: 2
        - **concept**: 1

        ## Nodes by Status

        - **active**: 2
        - **needs_review**: 1

        ## Confidence Distribution

        - **High (>=0.8)**: 2
        - **Medium (0.5-0.8)**: 0
        - **Low (<0.5)**: 1
        ");

        let full = status_report(&nodes, &stats, StatusDetail::Full);
        assert!(full.contains("**Graph Updated**: 2026-03-01 12:30 UTC"));
        assert!(full.contains("## Relations by Type\n\n- **uses**: 2"));
        assert!(full.contains("## Recent Activity"));
        assert!(full.contains("## Nodes Needing Review: 1\n\n- **Weak idea** (weak)"));
    }

    #[test]
    fn test_small_reports() {
        let mut pg = node("pg", NodeType::Decision, "Use PostgreSQL", &[]);
        assert_eq!(
            unrelate_report("a", "b", RelationType::Uses, false),
            "No uses relation from a to b"
        );
        assert_eq!(
            delete_report(&DeleteOutcome {
                node: pg.clone(),
                removed_relations: 2,
            }),
            "Deleted decision node: pg (Use PostgreSQL)\nRemoved 2 relation(s) from the graph."
        );

        pg.node_type = NodeType::Concept;
        let report = update_report(&UpdateOutcome {
            node: pg,
            drift: Some(Classification {
                node_type: NodeType::Decision,
                confidence: 0.7,
                reasoning: String::new(),
                alternatives: Vec::new(),
                needs_review: false,
            }),
        });
        assert!(report.ends_with("Content now reads as 'decision' (70%). The node is still a concept."));
    }
}
