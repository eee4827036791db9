// ── Frontmatter Parsing and Serialization ──
//
// A node file is YAML frontmatter between `---` fences, then the content:
//   `---\n{yaml}---\n\n{content}\n`
// Serialization writes one blank separator line and one trailing newline, and
// parsing strips exactly one of each, so content round-trips unchanged.

use crate::error::{CairnError, Result};
use crate::types::KnowledgeNode;

// ── Public API ──

/// Parse a markdown string with YAML frontmatter into a `KnowledgeNode`.
pub fn parse(input: &str, path: &str) -> Result<KnowledgeNode> {
    let (yaml, body) = split_frontmatter(input, path)?;

    let mut node: KnowledgeNode =
        serde_yaml::from_str(yaml).map_err(|e| CairnError::InvalidFrontmatter {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    node.content = body.strip_suffix('\n').unwrap_or(body).to_string();
    Ok(node)
}

/// Serialize a `KnowledgeNode` into a markdown string with YAML frontmatter.
pub fn serialize(node: &KnowledgeNode) -> Result<String> {
    let yaml = serde_yaml::to_string(node)?;

    let mut output = String::with_capacity(yaml.len() + node.content.len() + 16);
    output.push_str("---\n");
    output.push_str(&yaml);
    output.push_str("---\n");

    if !node.content.is_empty() {
        output.push('\n');
        output.push_str(&node.content);
        output.push('\n');
    }

    Ok(output)
}

// ── Helpers ──

/// Split a markdown string into frontmatter YAML and body.
fn split_frontmatter<'a>(input: &'a str, path: &str) -> Result<(&'a str, &'a str)> {
    let missing = || CairnError::MissingFrontmatter {
        path: path.to_string(),
    };

    let rest = input.trim_start().strip_prefix("---").ok_or_else(missing)?;
    let after_opening = rest.find('\n').map(|pos| &rest[pos + 1..]).ok_or_else(missing)?;

    let closing_pos = find_closing_fence(after_opening).ok_or_else(missing)?;
    let yaml = &after_opening[..closing_pos];
    let after_closing = &after_opening[closing_pos..];

    let body = match after_closing.find('\n') {
        Some(pos) => {
            let rest = &after_closing[pos + 1..];
            rest.strip_prefix('\n').unwrap_or(rest)
        }
        None => "",
    };

    Ok((yaml, body))
}

/// Byte offset of the closing `---` fence; it must start a line.
fn find_closing_fence(content: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with("---") {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

// ── Tests ──
