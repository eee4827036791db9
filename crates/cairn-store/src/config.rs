// ── Store Configuration ──

use std::fs;
use std::path::Path;

use cairn_core::Result;
use cairn_search::{DEFAULT_LIMIT, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};

use crate::file::write_atomic;
use crate::root::CONFIG_FILE;

/// Contents of `cairn.yaml`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    pub version: u32,
    /// Inferred relations at or above this confidence are written on capture.
    pub auto_relate_threshold: f64,
    pub query_limit: usize,
    pub context_limit: usize,
    pub related_depth: usize,
}

impl Default for CairnConfig {
    fn default() -> Self {
        Self {
            version: 1,
            auto_relate_threshold: 0.7,
            query_limit: DEFAULT_LIMIT,
            context_limit: 10,
            related_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CairnConfig {
    /// Load `cairn.yaml` from `root`, or the defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        write_atomic(&root.join(CONFIG_FILE), &yaml)
    }
}

// ── Tests ──
