//! Subdomain collapsing within a category
//!
//! Once every hostname has exactly one category, a subdomain whose parent
//! domain sits in the *same* category is redundant: the parent's
//! suffix-wildcard rule already covers it. The merger removes such entries.
//! It never looks across categories (that boundary is a classification
//! decision, settled by the resolver) and never collapses rewrite entries,
//! whose targets are not substitutable along the domain hierarchy.

use std::collections::BTreeSet;

use hn_core::hostname::Hostname;
use hn_core::types::CategorySet;

/// Counts of entries merged away, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub remove: usize,
    pub low_priority: usize,
    pub high_priority: usize,
}

impl MergeStats {
    pub fn total(&self) -> usize {
        self.remove + self.low_priority + self.high_priority
    }
}

/// Collapse redundant subdomains in each plain category set.
///
/// Exact-duplicate removal already happened for free when the resolver
/// keyed entries by hostname; only hierarchy containment is decided here.
pub fn merge(categories: &mut CategorySet) -> MergeStats {
    MergeStats {
        remove: collapse(&mut categories.remove),
        low_priority: collapse(&mut categories.low_priority),
        high_priority: collapse(&mut categories.high_priority),
        // categories.rewrite intentionally untouched
    }
}

/// Drop every hostname that is a strict subdomain of another member.
fn collapse(set: &mut BTreeSet<Hostname>) -> usize {
    let before = set.len();
    // Walking ancestors of each hostname is O(n * labels) and avoids the
    // quadratic pairwise scan on large lists.
    let retained: BTreeSet<Hostname> = set
        .iter()
        .filter(|host| !has_ancestor_in(host, set))
        .cloned()
        .collect();
    *set = retained;
    before - set.len()
}

fn has_ancestor_in(host: &Hostname, set: &BTreeSet<Hostname>) -> bool {
    let mut cursor = host.as_str();
    while let Some(dot) = cursor.find('.') {
        cursor = &cursor[dot + 1..];
        if !cursor.contains('.') {
            // Bare TLD; no valid hostname left to find.
            return false;
        }
        if let Ok(ancestor) = Hostname::normalize(cursor) {
            if set.contains(&ancestor) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_core::types::CategorySet;

    fn host(s: &str) -> Hostname {
        Hostname::normalize(s).unwrap()
    }

    fn set_of(hosts: &[&str]) -> BTreeSet<Hostname> {
        hosts.iter().map(|h| host(h)).collect()
    }

    #[test]
    fn test_collapse_strict_subdomains() {
        let mut categories = CategorySet::new();
        categories.remove = set_of(&[
            "example.com",
            "a.example.com",
            "b.a.example.com",
            "other.org",
        ]);

        let stats = merge(&mut categories);
        assert_eq!(categories.remove, set_of(&["example.com", "other.org"]));
        assert_eq!(stats.remove, 2);
    }

    #[test]
    fn test_no_cross_category_collapse() {
        let mut categories = CategorySet::new();
        categories.remove = set_of(&["example.com"]);
        categories.high_priority = set_of(&["docs.example.com"]);

        merge(&mut categories);
        // docs.example.com keeps its own classification even though its
        // parent sits in another category.
        assert_eq!(categories.high_priority, set_of(&["docs.example.com"]));
        assert_eq!(categories.remove, set_of(&["example.com"]));
    }

    #[test]
    fn test_siblings_survive() {
        let mut categories = CategorySet::new();
        categories.low_priority = set_of(&["a.example.com", "b.example.com"]);

        let stats = merge(&mut categories);
        assert_eq!(stats.total(), 0);
        assert_eq!(categories.low_priority.len(), 2);
    }

    #[test]
    fn test_lookalike_suffix_is_not_a_subdomain() {
        let mut categories = CategorySet::new();
        categories.remove = set_of(&["example.com", "notexample.com"]);

        let stats = merge(&mut categories);
        assert_eq!(stats.total(), 0);
        assert_eq!(categories.remove.len(), 2);
    }

    #[test]
    fn test_rewrite_entries_never_collapse() {
        let mut categories = CategorySet::new();
        categories
            .rewrite
            .insert(host("example.com"), host("mirror.example.org"));
        categories
            .rewrite
            .insert(host("sub.example.com"), host("other.example.org"));

        merge(&mut categories);
        assert_eq!(categories.rewrite.len(), 2);
    }

    #[test]
    fn test_merge_property_no_contained_pairs() {
        let mut categories = CategorySet::new();
        categories.remove = set_of(&[
            "x.com",
            "a.x.com",
            "b.a.x.com",
            "y.org",
            "c.y.org",
            "z.net",
        ]);
        merge(&mut categories);

        for a in &categories.remove {
            for b in &categories.remove {
                assert!(!a.is_subdomain_of(b), "{a} still contained by {b}");
            }
        }
    }
}
