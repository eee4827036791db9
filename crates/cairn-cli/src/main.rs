use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cairn_classify::{classify, ClassificationRequest};
use cairn_core::{CaptureSource, NodeFilter, NodeType};
use cairn_mcp::format::{self, StatusDetail};
use cairn_store::NodeStore;

// ── CLI Definition ──

#[derive(Parser)]
#[command(name = "cairn", about = "Knowledge graph memory for coding agents")]
struct Cli {
    /// Store directory
    #[arg(long, global = true, env = "CAIRN_ROOT", default_value = ".cairn")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store directory layout
    Init,
    /// Serve the knowledge graph over MCP on stdio
    Serve,
    /// Classify a title and content without storing anything
    Classify {
        title: String,
        content: String,
        /// Capture source (manual, hook_write, hook_commit, hook_session)
        #[arg(long)]
        source: Option<CaptureSource>,
    },
    /// Search stored nodes
    Search {
        query: String,
        #[arg(long = "type")]
        node_type: Option<NodeType>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Summarize the store
    Status {
        /// Include relations, recent activity and nodes needing review
        #[arg(long)]
        full: bool,
    },
}

// ── Commands ──

fn init_store(root: &Path) -> Result<String> {
    NodeStore::new(root)
        .init()
        .with_context(|| format!("initializing {}", root.display()))?;
    Ok(format!("initialized cairn store at {}", root.display()))
}

fn classify_text(title: &str, content: &str, source: Option<CaptureSource>) -> String {
    let mut request = ClassificationRequest::new(title, content);
    request.source = source;
    let result = classify(&request);

    let mut out = vec![
        format!("Type: {}", result.node_type),
        format!("Confidence: {:.0}%", result.confidence * 100.0),
        format!("Reasoning: {}", result.reasoning),
    ];
    if result.needs_review {
        let alternatives: Vec<String> = result
            .alternatives
            .iter()
            .map(|a| format!("{} ({:.0}%)", a.node_type, a.confidence * 100.0))
            .collect();
        out.push(format!("Alternatives: {}", alternatives.join(", ")));
    }
    out.join("\n")
}

fn search_store(
    root: &Path,
    query: &str,
    node_type: Option<NodeType>,
    limit: Option<usize>,
) -> Result<String> {
    let store = NodeStore::open(root)?;
    let config = store.load_config()?;

    let mut filter = NodeFilter::new().with_query(query);
    filter.node_type = node_type;
    let nodes = store.list(Some(&filter))?;
    let results = cairn_search::search(&nodes, &filter, limit.unwrap_or(config.query_limit), 0);
    Ok(format::query_report(&results))
}

fn store_status(root: &Path, full: bool) -> Result<String> {
    let store = NodeStore::open(root)?;
    let graph = store.load_graph()?;
    let nodes = store.list(None)?;
    let detail = if full {
        StatusDetail::Full
    } else {
        StatusDetail::Summary
    };
    Ok(format::status_report(&nodes, &graph.statistics(), detail))
}

// ── Main ──

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cairn=info".parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Commands::Init => init_store(&cli.root)?,
        Commands::Serve => {
            cairn_mcp::run_mcp_server(cli.root).await?;
            return Ok(());
        }
        Commands::Classify {
            title,
            content,
            source,
        } => classify_text(&title, &content, source),
        Commands::Search {
            query,
            node_type,
            limit,
        } => search_store(&cli.root, &query, node_type, limit)?,
        Commands::Status { full } => store_status(&cli.root, full)?,
    };
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing() {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

// ── Tests ──
