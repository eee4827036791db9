// ── Identifier Generation ──

use chrono::{DateTime, Utc};
use uuid::Uuid;

const MAX_SLUG_LEN: usize = 50;

/// Node id: a lower-case slug of the title plus 8 hex chars of a fresh UUID.
pub fn generate_node_id(title: &str) -> String {
    let mut slug = slugify(title);
    if slug.is_empty() {
        slug.push_str("node");
    }
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", slug, &suffix[..8])
}

/// Session id derived from a UTC timestamp, e.g. `session-2026-02-24T10-00-00Z`.
pub fn generate_session_id(now: DateTime<Utc>) -> String {
    format!("session-{}", now.format("%Y-%m-%dT%H-%M-%SZ"))
}

fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

// ── Tests ──
