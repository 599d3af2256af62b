//! Tag merging: union of the comma-split and space-split tag columns.
//! Splitting itself is an upstream (adapter) concern.

use std::collections::HashSet;

/// Order-preserving deduplicated union of two tag lists. Empty and
/// whitespace-only entries are dropped.
pub fn merge_tags(tags_comma: &[String], tags_space: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for tag in tags_comma.iter().chain(tags_space.iter()) {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_string()) {
            merged.push(tag.to_string());
        }
    }
    merged
}
