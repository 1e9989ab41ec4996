use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

use crate::types::{FlatNode, MatchKind, SearchMatch, SearchResponse};

/// Whether a search result set keeps the ancestors of matching rows so the
/// tree context stays visible, or surfaces the matching rows alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AncestorPolicy {
    #[default]
    MatchesOnly,
    IncludeAncestors,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub regex: bool,
    pub whole_word: bool,
    pub search_keys: bool,
    pub search_values: bool,
    pub search_paths: bool,
    pub ancestors: AncestorPolicy,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            regex: false,
            whole_word: false,
            search_keys: true,
            search_values: true,
            search_paths: true,
            ancestors: AncestorPolicy::default(),
        }
    }
}

/// Predicate over flattened rows, built once per term change. An empty term
/// matches everything. Matching never touches the underlying tree; it only
/// decides which rows are surfaced.
#[derive(Debug)]
pub struct SearchFilter {
    term: String,
    re: Option<Regex>,
    options: SearchOptions,
}

impl SearchFilter {
    pub fn new(term: &str) -> Self {
        Self::with_options(term, SearchOptions::default())
    }

    pub fn with_options(term: &str, options: SearchOptions) -> Self {
        let re = if options.regex {
            Regex::new(term).ok()
        } else {
            None
        };
        let term = if options.case_sensitive {
            term.to_string()
        } else {
            term.to_lowercase()
        };
        Self { term, re, options }
    }

    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn matches(&self, node: &FlatNode) -> bool {
        self.is_empty() || self.classify(node).is_some()
    }

    /// First matching field in key → value → path order, with the matched
    /// text. `None` for non-matching rows; callers handle the empty term.
    fn classify(&self, node: &FlatNode) -> Option<(MatchKind, String)> {
        if self.options.search_keys && self.text_matches(&node.key) {
            return Some((MatchKind::Key, node.key.clone()));
        }
        if self.options.search_values {
            if let Some(text) = node.value.as_ref().and_then(scalar_text) {
                if self.text_matches(&text) {
                    return Some((MatchKind::Value, text));
                }
            }
        }
        if self.options.search_paths && self.text_matches(&node.id) {
            return Some((MatchKind::Path, node.id.clone()));
        }
        None
    }

    fn text_matches(&self, text: &str) -> bool {
        let folded;
        let text = if self.options.case_sensitive {
            text
        } else {
            folded = text.to_lowercase();
            &folded
        };
        if let Some(re) = &self.re {
            re.is_match(text)
        } else if self.options.whole_word {
            text.split(|c: char| !c.is_alphanumeric())
                .any(|word| word == self.term)
        } else {
            text.contains(&self.term)
        }
    }

    /// Filter a flat projection down to surfaced rows, preserving order.
    pub fn filter(&self, nodes: &[FlatNode]) -> Vec<FlatNode> {
        if self.is_empty() {
            return nodes.to_vec();
        }
        let mask: Vec<bool> = nodes.par_iter().map(|n| self.classify(n).is_some()).collect();
        let keep = match self.options.ancestors {
            AncestorPolicy::MatchesOnly => mask,
            AncestorPolicy::IncludeAncestors => with_ancestors(nodes, mask),
        };
        nodes
            .iter()
            .zip(keep)
            .filter_map(|(node, kept)| kept.then(|| node.clone()))
            .collect()
    }

    /// Paged search over a flat projection with per-match detail.
    pub fn search(&self, nodes: &[FlatNode], offset: usize, limit: usize) -> SearchResponse {
        if self.is_empty() {
            return SearchResponse {
                results: Vec::new(),
                total_count: 0,
                has_more: false,
            };
        }
        let all: Vec<SearchMatch> = nodes
            .par_iter()
            .filter_map(|node| {
                self.classify(node).map(|(match_kind, match_text)| SearchMatch {
                    context: (match_kind == MatchKind::Value)
                        .then(|| format!("in key: {}", node.key)),
                    node: node.clone(),
                    match_kind,
                    match_text,
                })
            })
            .collect();
        let total_count = all.len();
        let results: Vec<SearchMatch> = all.into_iter().skip(offset).take(limit).collect();
        let has_more = offset + limit < total_count;
        SearchResponse {
            results,
            total_count,
            has_more,
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extend a match mask so every ancestor of a matching row is kept. Relies on
/// the pre-order layout of the flat projection: a row's ancestor chain is the
/// nearest preceding rows of strictly decreasing depth.
fn with_ancestors(nodes: &[FlatNode], mask: Vec<bool>) -> Vec<bool> {
    let mut keep = mask.clone();
    let mut chain: Vec<usize> = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        while chain
            .last()
            .is_some_and(|&ancestor| nodes[ancestor].depth >= node.depth)
        {
            chain.pop();
        }
        if mask[index] {
            for &ancestor in &chain {
                keep[ancestor] = true;
            }
        }
        chain.push(index);
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{build_tree, TreeLimits};
    use serde_json::json;
    use std::collections::HashSet;

    fn rows(value: serde_json::Value, open: &[&str]) -> Vec<FlatNode> {
        let expanded: HashSet<String> = open.iter().map(|s| s.to_string()).collect();
        build_tree(&value, &expanded, TreeLimits::default()).flat
    }

    #[test]
    fn case_insensitive_value_match() {
        let flat = rows(json!({"user": {"name": "Alice"}}), &["root", "root.user"]);
        let filter = SearchFilter::new("alice");
        let hits = filter.filter(&flat);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "root.user.name");
    }

    #[test]
    fn empty_term_matches_everything() {
        let flat = rows(json!({"a": 1, "b": 2}), &["root"]);
        assert_eq!(SearchFilter::new("").filter(&flat).len(), flat.len());
        assert_eq!(SearchFilter::new("   ").filter(&flat).len(), flat.len());
    }

    #[test]
    fn matches_on_key_and_path() {
        let flat = rows(json!({"users": [7]}), &["root", "root.users"]);
        let by_key = SearchFilter::new("USERS").filter(&flat);
        assert!(by_key.iter().any(|n| n.id == "root.users"));
        // index row matches through its path substring
        let by_path = SearchFilter::new("users[0]").filter(&flat);
        assert!(by_path.iter().any(|n| n.id == "root.users[0]"));
    }

    #[test]
    fn numbers_and_bools_match_stringified() {
        let flat = rows(json!({"count": 42, "on": true}), &["root"]);
        assert!(SearchFilter::new("42")
            .filter(&flat)
            .iter()
            .any(|n| n.id == "root.count"));
        assert!(SearchFilter::new("true")
            .filter(&flat)
            .iter()
            .any(|n| n.id == "root.on"));
    }

    #[test]
    fn whole_word_mode() {
        let flat = rows(json!({"cat": 1, "category": 2}), &["root"]);
        let opts = SearchOptions {
            whole_word: true,
            search_paths: false,
            ..SearchOptions::default()
        };
        let hits = SearchFilter::with_options("cat", opts).filter(&flat);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "root.cat");
    }

    #[test]
    fn regex_mode() {
        let flat = rows(json!({"id_1": "x", "id_2": "y", "name": "z"}), &["root"]);
        let opts = SearchOptions {
            regex: true,
            search_values: false,
            search_paths: false,
            ..SearchOptions::default()
        };
        let hits = SearchFilter::with_options(r"^id_\d$", opts).filter(&flat);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn case_sensitive_mode() {
        let flat = rows(json!({"name": "Alice"}), &["root"]);
        let opts = SearchOptions {
            case_sensitive: true,
            ..SearchOptions::default()
        };
        assert!(SearchFilter::with_options("alice", opts.clone())
            .filter(&flat)
            .is_empty());
        assert_eq!(SearchFilter::with_options("Alice", opts).filter(&flat).len(), 1);
    }

    #[test]
    fn include_ancestors_keeps_the_chain() {
        let flat = rows(
            json!({"user": {"name": "Alice"}, "other": 1}),
            &["root", "root.user"],
        );
        let opts = SearchOptions {
            ancestors: AncestorPolicy::IncludeAncestors,
            ..SearchOptions::default()
        };
        let ids: Vec<String> = SearchFilter::with_options("alice", opts)
            .filter(&flat)
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["root", "root.user", "root.user.name"]);
    }

    #[test]
    fn matches_only_drops_non_matching_ancestors() {
        let flat = rows(json!({"user": {"name": "Alice"}}), &["root", "root.user"]);
        let ids: Vec<String> = SearchFilter::new("alice")
            .filter(&flat)
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["root.user.name"]);
    }

    #[test]
    fn paged_search_reports_totals() {
        let items: Vec<String> = (0..25).map(|i| format!("item-{i}")).collect();
        let flat = rows(json!(items), &["root"]);
        let filter = SearchFilter::new("item");
        let page = filter.search(&flat, 0, 10);
        assert_eq!(page.results.len(), 10);
        assert_eq!(page.total_count, 25);
        assert!(page.has_more);
        assert_eq!(page.results[0].match_kind, MatchKind::Value);
        assert_eq!(page.results[0].context.as_deref(), Some("in key: 0"));

        let last = filter.search(&flat, 20, 10);
        assert_eq!(last.results.len(), 5);
        assert!(!last.has_more);
    }

    #[test]
    fn empty_term_search_returns_nothing() {
        let flat = rows(json!({"a": 1}), &["root"]);
        let page = SearchFilter::new("").search(&flat, 0, 10);
        assert_eq!(page.total_count, 0);
        assert!(page.results.is_empty());
    }
}
