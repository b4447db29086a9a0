//! Local text search over the script collection.

use shared_types::Script;

/// Scripts matching `query`, in input order.
///
/// A blank query matches everything. Otherwise the query is matched
/// case-insensitively as a substring of the title, style, tags or lyrics;
/// one hit in any field is enough. Missing fields simply do not match.
pub fn filter<'a>(query: &str, scripts: &'a [Script]) -> Vec<&'a Script> {
    if query.trim().is_empty() {
        return scripts.iter().collect();
    }
    let needle = query.to_lowercase();
    scripts
        .iter()
        .filter(|script| matches(script, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn matches(script: &Script, needle: &str) -> bool {
    contains(&script.title, needle)
        || script
            .style
            .as_deref()
            .is_some_and(|style| contains(style, needle))
        || script.tags.iter().any(|tag| contains(tag, needle))
        || (script.tags.len() > 1 && contains(&script.tags.to_wire(), needle))
        || contains(&script.lyrics, needle)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
