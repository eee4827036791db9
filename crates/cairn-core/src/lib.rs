pub mod error;
pub mod filter;
pub mod frontmatter;
pub mod id;
pub mod store;
pub mod types;

pub use error::{CairnError, Result};
pub use filter::NodeFilter;
pub use store::{NodeRepository, RelationGraph};
pub use types::{
    CaptureSource, GraphRelation, KnowledgeNode, NodeStatus, NodeType, Relation, RelationType,
};
