//! MCP server exposing the knowledge graph over stdio.

pub mod format;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use rmcp::model::*;
use rmcp::schemars::JsonSchema;
use rmcp::serde::Deserialize;
use rmcp::{tool, ServerHandler, ServiceExt};
use tracing::info;

use cairn_capture::{CaptureRequest, NodeUpdate, RelateRequest};
use cairn_core::{CaptureSource, NodeFilter, NodeStatus, NodeType, RelationType};
use cairn_enrich::{score_nodes_for_context, ContextSignals};
use cairn_search::{find_related, search};
use cairn_store::NodeStore;

use format::StatusDetail;

/// Session id used for captures that don't name one.
pub const SESSION_ENV: &str = "CAIRN_SESSION_ID";

const MAX_CONTEXT_NODES: usize = 20;
const MAX_RELATED_DEPTH: usize = 5;

// ── Types ──

/// Input for the cairn_capture tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct CaptureInput {
    /// Short title for the knowledge node
    title: String,
    /// Markdown body
    content: String,
    /// Node type (decision, component, convention, concept, session, pattern, issue).
    /// Classified automatically when omitted.
    #[serde(rename = "type")]
    node_type: Option<String>,
    tags: Option<Vec<String>>,
    /// File paths this knowledge refers to
    references: Option<Vec<String>>,
    session: Option<String>,
    /// Capture source (manual, hook_write, hook_commit, hook_session)
    source: Option<String>,
    /// Confidence between 0.0 and 1.0 (default 0.8)
    confidence: Option<f64>,
    /// Ids of existing nodes to link with relates_to
    related_to: Option<Vec<String>>,
}

/// Input for the cairn_query tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct QueryInput {
    /// Case-insensitive text to look for in title, content and tags
    query: Option<String>,
    #[serde(rename = "type")]
    node_type: Option<String>,
    /// Every listed tag must be present
    tags: Option<Vec<String>>,
    status: Option<String>,
    min_confidence: Option<f64>,
    /// Only nodes with a relation to this id
    related_to: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

/// Input for the cairn_related tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct RelatedInput {
    id: String,
    /// Hops to follow (1-5)
    depth: Option<usize>,
}

/// Input for the cairn_context tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct ContextInput {
    current_file: Option<String>,
    current_task: Option<String>,
    recent_files: Option<Vec<String>>,
    /// Maximum nodes to return (1-20)
    max_nodes: Option<usize>,
}

/// Input for the cairn_status tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct StatusInput {
    /// "summary" (default) or "full"
    detail: Option<String>,
}

/// Input for the cairn_update tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateInput {
    id: String,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    references: Option<Vec<String>>,
    status: Option<String>,
    confidence: Option<f64>,
}

/// Input for the cairn_delete tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct DeleteInput {
    id: String,
}

/// Input for the cairn_relate tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct RelateInput {
    source: String,
    target: String,
    /// Relation type (affects, uses, supersedes, relates_to, implements, depends_on, derived_from)
    #[serde(rename = "type")]
    kind: String,
    description: Option<String>,
    confidence: Option<f64>,
    /// Also create the reverse relation
    bidirectional: Option<bool>,
}

/// Input for the cairn_unrelate tool.
#[derive(Debug, Deserialize, JsonSchema)]
struct UnrelateInput {
    source: String,
    target: String,
    #[serde(rename = "type")]
    kind: String,
}

/// The cairn MCP server. Every tool call opens the store fresh.
#[derive(Clone)]
pub struct CairnServer {
    root: PathBuf,
}

// ── Helpers ──

fn internal(e: impl std::fmt::Display) -> rmcp::Error {
    rmcp::Error::internal_error(format!("{e:#}"), None)
}

fn parse<T>(value: &str) -> Result<T, rmcp::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| rmcp::Error::invalid_params(e.to_string(), None))
}

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, rmcp::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map(parse::<T>).transpose()
}

fn text(body: String) -> Result<CallToolResult, rmcp::Error> {
    Ok(CallToolResult::success(vec![Content::text(body)]))
}

// ── Public API ──

#[tool(tool_box)]
impl CairnServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn store(&self) -> Result<NodeStore, rmcp::Error> {
        NodeStore::open(&self.root).map_err(internal)
    }

    #[tool(
        name = "cairn_capture",
        description = "Capture a knowledge node. The type is classified automatically when omitted, and relations to existing nodes are inferred."
    )]
    fn cairn_capture(&self, #[tool(aggr)] input: CaptureInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let config = store.load_config().map_err(internal)?;
        let mut graph = store.load_graph().map_err(internal)?;

        let node_type: Option<NodeType> = parse_opt(input.node_type.as_deref())?;
        let source: Option<CaptureSource> = parse_opt(input.source.as_deref())?;
        let request = CaptureRequest {
            title: input.title,
            content: input.content,
            node_type,
            tags: input.tags.unwrap_or_default(),
            references: input.references.unwrap_or_default(),
            session: input.session.or_else(|| std::env::var(SESSION_ENV).ok()),
            source: source.unwrap_or_default(),
            confidence: input.confidence,
            related_to: input.related_to.unwrap_or_default(),
        };

        let outcome = cairn_capture::capture(&store, &mut graph, &config, request).map_err(internal)?;
        text(format::capture_report(&outcome, node_type.is_none()))
    }

    #[tool(
        name = "cairn_query",
        description = "Search knowledge nodes by text, type, tags, status, confidence or relation. Results are ranked by relevance."
    )]
    fn cairn_query(&self, #[tool(aggr)] input: QueryInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let config = store.load_config().map_err(internal)?;

        let filter = NodeFilter {
            node_type: parse_opt(input.node_type.as_deref())?,
            tags: input.tags.unwrap_or_default(),
            status: parse_opt(input.status.as_deref())?,
            min_confidence: input.min_confidence,
            related_to: input.related_to,
            search_query: input.query.filter(|q| !q.trim().is_empty()),
        };
        let nodes = store.list(Some(&filter)).map_err(internal)?;
        let results = search(
            &nodes,
            &filter,
            input.limit.unwrap_or(config.query_limit),
            input.offset.unwrap_or(0),
        );
        text(format::query_report(&results))
    }

    #[tool(
        name = "cairn_related",
        description = "List nodes reachable from a node through the relation graph, scored by confidence and distance, plus the node's own incoming and outgoing relations."
    )]
    fn cairn_related(&self, #[tool(aggr)] input: RelatedInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let config = store.load_config().map_err(internal)?;
        let graph = store.load_graph().map_err(internal)?;

        let depth = input
            .depth
            .unwrap_or(config.related_depth)
            .clamp(1, MAX_RELATED_DEPTH);
        let nodes = store.list(None).map_err(internal)?;
        let origin = nodes
            .iter()
            .find(|n| n.id == input.id)
            .ok_or_else(|| rmcp::Error::invalid_params(format!("node not found: {}", input.id), None))?;

        let results = find_related(&nodes, &graph, &input.id, depth);
        let direct = graph.node_relations(&input.id);
        text(format::related_report(origin, &results, &direct, depth))
    }

    #[tool(
        name = "cairn_context",
        description = "Rank knowledge nodes by relevance to the current file, task and recently touched files."
    )]
    fn cairn_context(&self, #[tool(aggr)] input: ContextInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let config = store.load_config().map_err(internal)?;

        let max_nodes = input
            .max_nodes
            .unwrap_or(config.context_limit)
            .clamp(1, MAX_CONTEXT_NODES);
        let signals = ContextSignals {
            current_file: input.current_file,
            current_task: input.current_task,
            recent_files: input.recent_files.unwrap_or_default(),
        };

        let nodes = store.list(None).map_err(internal)?;
        let mut scored = score_nodes_for_context(&nodes, &signals);
        scored.truncate(max_nodes);
        text(format::context_report(&scored, &signals))
    }

    #[tool(
        name = "cairn_status",
        description = "Summarize the knowledge graph: node counts by type and status, confidence distribution and relations."
    )]
    fn cairn_status(&self, #[tool(aggr)] input: StatusInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let graph = store.load_graph().map_err(internal)?;
        let detail: StatusDetail = parse_opt(input.detail.as_deref())?.unwrap_or_default();

        let nodes = store.list(None).map_err(internal)?;
        text(format::status_report(&nodes, &graph.statistics(), detail))
    }

    #[tool(
        name = "cairn_update",
        description = "Update fields of an existing node. Reports when the new text reads as a different type."
    )]
    fn cairn_update(&self, #[tool(aggr)] input: UpdateInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let status: Option<NodeStatus> = parse_opt(input.status.as_deref())?;
        let update = NodeUpdate {
            title: input.title,
            content: input.content,
            tags: input.tags,
            references: input.references,
            status,
            confidence: input.confidence,
        };

        let outcome = cairn_capture::update_node(&store, &input.id, update).map_err(internal)?;
        text(format::update_report(&outcome))
    }

    #[tool(
        name = "cairn_delete",
        description = "Delete a node and every relation that touches it."
    )]
    fn cairn_delete(&self, #[tool(aggr)] input: DeleteInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let mut graph = store.load_graph().map_err(internal)?;
        let outcome = cairn_capture::delete_node(&store, &mut graph, &input.id).map_err(internal)?;
        text(format::delete_report(&outcome))
    }

    #[tool(
        name = "cairn_relate",
        description = "Create a typed relation between two existing nodes."
    )]
    fn cairn_relate(&self, #[tool(aggr)] input: RelateInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let mut graph = store.load_graph().map_err(internal)?;

        let kind: RelationType = parse(&input.kind)?;
        let bidirectional = input.bidirectional.unwrap_or(false);
        let mut request = RelateRequest::new(input.source, input.target, kind);
        request.description = input.description.clone();
        request.bidirectional = bidirectional;
        if let Some(confidence) = input.confidence {
            request.confidence = confidence;
        }

        let (source, target) = cairn_capture::relate(&store, &mut graph, request).map_err(internal)?;
        text(format::relate_report(
            &source,
            &target,
            kind,
            input.description.as_deref(),
            bidirectional,
        ))
    }

    #[tool(
        name = "cairn_unrelate",
        description = "Remove a typed relation between two nodes."
    )]
    fn cairn_unrelate(&self, #[tool(aggr)] input: UnrelateInput) -> Result<CallToolResult, rmcp::Error> {
        let store = self.store()?;
        let mut graph = store.load_graph().map_err(internal)?;

        let kind: RelationType = parse(&input.kind)?;
        let removed = cairn_capture::unrelate(&mut graph, &input.source, &input.target, kind)
            .map_err(internal)?;
        text(format::unrelate_report(&input.source, &input.target, kind, removed))
    }
}

#[tool(tool_box)]
impl ServerHandler for CairnServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Cairn knowledge graph for a codebase. Use cairn_context at the start of a task \
                 to load relevant decisions and conventions, cairn_query and cairn_related to \
                 explore, and cairn_capture to record new knowledge. cairn_relate, cairn_update \
                 and cairn_delete maintain the graph."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

/// Start the cairn MCP server on stdio transport.
pub async fn run_mcp_server(root: PathBuf) -> Result<()> {
    let store = NodeStore::open(&root)?;
    info!(root = %store.root().display(), "serving knowledge graph over stdio");

    let server = CairnServer::new(root);
    let service = server
        .serve(rmcp::transport::io::stdio())
        .await
        .map_err(|e| anyhow::anyhow!("failed to start MCP server: {e}"))?;

    service.waiting().await?;

    Ok(())
}

// ── Tests ──
