// ── Types ──

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CairnError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Decision,
    Component,
    Convention,
    Concept,
    Session,
    Pattern,
    Issue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Active,
    NeedsReview,
    Superseded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Affects,
    Uses,
    Supersedes,
    RelatesTo,
    Implements,
    DependsOn,
    DerivedFrom,
}

/// Where a captured node came from. Also used as the classifier's context tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    #[default]
    Manual,
    HookWrite,
    HookCommit,
    HookSession,
}

/// A typed edge embedded in a node's frontmatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub confidence: f64,
}

/// A relation as stored in the graph index, carrying its source node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphRelation {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: RelationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub confidence: f64,
}

/// A knowledge node: one captured observation in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default)]
    pub source: CaptureSource,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub status: NodeStatus,

    /// Not part of the frontmatter; stored as the markdown body.
    #[serde(skip)]
    pub content: String,
}

fn default_confidence() -> f64 {
    0.8
}

// ── Helpers ──

impl NodeType {
    /// Declaration order. Classifier ties resolve to the earlier entry.
    pub const ALL: [NodeType; 7] = [
        NodeType::Decision,
        NodeType::Component,
        NodeType::Convention,
        NodeType::Concept,
        NodeType::Session,
        NodeType::Pattern,
        NodeType::Issue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Decision => "decision",
            NodeType::Component => "component",
            NodeType::Convention => "convention",
            NodeType::Concept => "concept",
            NodeType::Session => "session",
            NodeType::Pattern => "pattern",
            NodeType::Issue => "issue",
        }
    }

    /// Directory holding nodes of this type, e.g. `decisions`.
    pub fn dir_name(self) -> String {
        format!("{}s", self.as_str())
    }
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 3] = [
        NodeStatus::Active,
        NodeStatus::NeedsReview,
        NodeStatus::Superseded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Active => "active",
            NodeStatus::NeedsReview => "needs_review",
            NodeStatus::Superseded => "superseded",
        }
    }
}

impl RelationType {
    pub const ALL: [RelationType; 7] = [
        RelationType::Affects,
        RelationType::Uses,
        RelationType::Supersedes,
        RelationType::RelatesTo,
        RelationType::Implements,
        RelationType::DependsOn,
        RelationType::DerivedFrom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Affects => "affects",
            RelationType::Uses => "uses",
            RelationType::Supersedes => "supersedes",
            RelationType::RelatesTo => "relates_to",
            RelationType::Implements => "implements",
            RelationType::DependsOn => "depends_on",
            RelationType::DerivedFrom => "derived_from",
        }
    }
}

impl CaptureSource {
    pub const ALL: [CaptureSource; 4] = [
        CaptureSource::Manual,
        CaptureSource::HookWrite,
        CaptureSource::HookCommit,
        CaptureSource::HookSession,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureSource::Manual => "manual",
            CaptureSource::HookWrite => "hook_write",
            CaptureSource::HookCommit => "hook_commit",
            CaptureSource::HookSession => "hook_session",
        }
    }
}

fn parse_variant<T: Copy>(
    all: &[T],
    as_str: fn(T) -> &'static str,
    kind: &'static str,
    value: &str,
) -> Result<T, CairnError> {
    all.iter()
        .copied()
        .find(|v| as_str(*v) == value)
        .ok_or_else(|| CairnError::UnknownVariant {
            kind,
            value: value.to_string(),
        })
}

impl FromStr for NodeType {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(&NodeType::ALL, NodeType::as_str, "node type", s)
    }
}

impl FromStr for NodeStatus {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(&NodeStatus::ALL, NodeStatus::as_str, "node status", s)
    }
}

impl FromStr for RelationType {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(&RelationType::ALL, RelationType::as_str, "relation type", s)
    }
}

impl FromStr for CaptureSource {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(&CaptureSource::ALL, CaptureSource::as_str, "capture source", s)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl KnowledgeNode {
    /// Build a node with default metadata, stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            node_type,
            title: title.into(),
            tags: Vec::new(),
            relations: Vec::new(),
            confidence: default_confidence(),
            created: now,
            modified: now,
            session: None,
            source: CaptureSource::Manual,
            references: Vec::new(),
            status: NodeStatus::Active,
            content: content.into(),
        }
    }

    /// Lower-cased `title content tags`, the text every matcher searches.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.content, self.tags.join(" ")).to_lowercase()
    }

    /// Fractional days between `modified` and `now`. Negative for future timestamps.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.modified).num_milliseconds() as f64 / 86_400_000.0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl GraphRelation {
    /// The embedded form of this relation, as seen from its source node.
    pub fn to_relation(&self) -> Relation {
        Relation {
            kind: self.kind,
            target: self.target.clone(),
            description: self.description.clone(),
            confidence: self.confidence,
        }
    }
}

// ── Tests ──
