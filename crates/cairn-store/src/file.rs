// ── File I/O ──
//
// Read and write node files. Every write goes through a sibling `.tmp` file
// and a rename so readers never observe a partial file.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use cairn_core::frontmatter;
use cairn_core::{KnowledgeNode, Result};
use tracing::warn;

// ── Public API ──

/// Write `content` to `path` via a temporary file and rename.
/// Creates parent directories if they don't exist.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Read a `.md` file and parse it into a `KnowledgeNode`.
pub fn read_node(path: &Path) -> Result<KnowledgeNode> {
    let content = fs::read_to_string(path)?;
    frontmatter::parse(&content, &path.display().to_string())
}

pub fn write_node(path: &Path, node: &KnowledgeNode) -> Result<()> {
    let content = frontmatter::serialize(node)?;
    write_atomic(path, &content)
}

/// Parse every file in `files`. Unreadable or invalid files are skipped with
/// a warning.
pub fn read_all_nodes(files: &[PathBuf]) -> Vec<KnowledgeNode> {
    let mut nodes = Vec::with_capacity(files.len());
    for path in files {
        match read_node(path) {
            Ok(node) => nodes.push(node),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping node file"),
        }
    }
    nodes
}

// ── Helpers ──

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

// ── Tests ──
