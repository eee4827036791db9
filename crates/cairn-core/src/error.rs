// ── Error Types ──

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CairnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing frontmatter in {path}")]
    MissingFrontmatter { path: String },

    #[error("invalid frontmatter in {path}: {reason}")]
    InvalidFrontmatter { path: String, reason: String },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("not a cairn directory: {0} (run `cairn init`)")]
    NotInitialized(String),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, CairnError>;
