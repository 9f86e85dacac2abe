//! Core type definitions for the hostnames rule compiler
//!
//! These types flow through every pipeline stage: parsers emit [`Claim`]s,
//! the resolver collapses them into [`ResolvedEntry`]s grouped in a
//! [`CategorySet`], and the optimizer compacts each set into patterns.

use std::collections::{BTreeMap, BTreeSet};

use crate::hostname::Hostname;

// =============================================================================
// Category
// =============================================================================

/// Classification assigned to a hostname.
///
/// The set is closed on purpose: category strings in directives and tabular
/// sources are validated against it at parse time, so a typo can never mint
/// a phantom category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    /// Drop the hostname from results entirely
    Remove = 0,
    /// Demote the hostname in result ranking
    LowPriority = 1,
    /// Promote the hostname in result ranking
    HighPriority = 2,
    /// Replace the hostname with another one
    Rewrite = 3,
    /// Exclude the hostname from every emitted category
    Skip = 4,
}

impl Category {
    /// Canonical string form, as used in directive files and config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::LowPriority => "low_priority",
            Self::HighPriority => "high_priority",
            Self::Rewrite => "rewrite",
            Self::Skip => "skip",
        }
    }

    /// Parse a category string. Unknown values are rejected, not defaulted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "remove" => Some(Self::Remove),
            "low_priority" => Some(Self::LowPriority),
            "high_priority" => Some(Self::HighPriority),
            "rewrite" => Some(Self::Rewrite),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    /// Tie-break rank when claims of equal source priority disagree.
    /// The most consequential action wins: Remove > HighPriority >
    /// LowPriority > Rewrite. Skip ranks last.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Remove => 4,
            Self::HighPriority => 3,
            Self::LowPriority => 2,
            Self::Rewrite => 1,
            Self::Skip => 0,
        }
    }

}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Claim Origin
// =============================================================================

/// Where a classification claim came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A configured source list; greater priority outranks lesser.
    Source { priority: u32 },
    /// A manual override directive; outranks every source claim.
    Manual,
}

impl Origin {
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }

    /// Source priority, or `None` for manual claims.
    pub fn source_priority(&self) -> Option<u32> {
        match self {
            Self::Source { priority } => Some(*priority),
            Self::Manual => None,
        }
    }
}

// =============================================================================
// Claims and Resolved Entries
// =============================================================================

/// One source's or override's proposed classification for one hostname,
/// prior to conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub hostname: Hostname,
    pub category: Category,
    pub origin: Origin,
    /// Present only when `category == Rewrite`.
    pub rewrite_target: Option<Hostname>,
}

impl Claim {
    pub fn new(hostname: Hostname, category: Category, origin: Origin) -> Self {
        Self {
            hostname,
            category,
            origin,
            rewrite_target: None,
        }
    }

    pub fn rewrite(hostname: Hostname, target: Hostname, origin: Origin) -> Self {
        Self {
            hostname,
            category: Category::Rewrite,
            origin,
            rewrite_target: Some(target),
        }
    }
}

/// The single surviving classification for a hostname after conflict
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub hostname: Hostname,
    pub category: Category,
    pub rewrite_target: Option<Hostname>,
}

// =============================================================================
// Category Set
// =============================================================================

/// Per-category hostname sets produced by the resolver.
///
/// Invariant: a hostname appears in at most one set; `Skip` winners appear
/// in none. Built fresh each run, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    pub remove: BTreeSet<Hostname>,
    pub low_priority: BTreeSet<Hostname>,
    pub high_priority: BTreeSet<Hostname>,
    /// Rewrite entries carry their replacement hostname.
    pub rewrite: BTreeMap<Hostname, Hostname>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutable hostname set for a plain (non-rewrite) category.
    pub fn set_mut(&mut self, category: Category) -> Option<&mut BTreeSet<Hostname>> {
        match category {
            Category::Remove => Some(&mut self.remove),
            Category::LowPriority => Some(&mut self.low_priority),
            Category::HighPriority => Some(&mut self.high_priority),
            Category::Rewrite | Category::Skip => None,
        }
    }

    /// Insert a resolved entry into its category's set.
    /// `Skip` entries land in no set by construction.
    pub fn insert(&mut self, entry: ResolvedEntry) {
        match entry.category {
            Category::Rewrite => {
                if let Some(target) = entry.rewrite_target {
                    self.rewrite.insert(entry.hostname, target);
                }
            }
            Category::Skip => {}
            other => {
                if let Some(set) = self.set_mut(other) {
                    set.insert(entry.hostname);
                }
            }
        }
    }

    /// Total hostnames across all output sets.
    pub fn len(&self) -> usize {
        self.remove.len() + self.low_priority.len() + self.high_priority.len() + self.rewrite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The category a hostname resolved into, if any.
    pub fn category_of(&self, hostname: &Hostname) -> Option<Category> {
        if self.remove.contains(hostname) {
            Some(Category::Remove)
        } else if self.low_priority.contains(hostname) {
            Some(Category::LowPriority)
        } else if self.high_priority.contains(hostname) {
            Some(Category::HighPriority)
        } else if self.rewrite.contains_key(hostname) {
            Some(Category::Rewrite)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(s: &str) -> Hostname {
        Hostname::normalize(s).unwrap()
    }

    #[test]
    fn test_category_roundtrip() {
        for cat in [
            Category::Remove,
            Category::LowPriority,
            Category::HighPriority,
            Category::Rewrite,
            Category::Skip,
        ] {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(Category::parse("blocklist"), None);
        assert_eq!(Category::parse("REMOVE"), None);
    }

    #[test]
    fn test_category_precedence_order() {
        assert!(Category::Remove.precedence() > Category::HighPriority.precedence());
        assert!(Category::HighPriority.precedence() > Category::LowPriority.precedence());
        assert!(Category::LowPriority.precedence() > Category::Rewrite.precedence());
        assert!(Category::Rewrite.precedence() > Category::Skip.precedence());
    }

    #[test]
    fn test_category_set_exclusive_lookup() {
        let mut set = CategorySet::new();
        set.insert(ResolvedEntry {
            hostname: host("example.com"),
            category: Category::Remove,
            rewrite_target: None,
        });
        set.insert(ResolvedEntry {
            hostname: host("old.example.org"),
            category: Category::Rewrite,
            rewrite_target: Some(host("new.example.org")),
        });
        set.insert(ResolvedEntry {
            hostname: host("gone.example.net"),
            category: Category::Skip,
            rewrite_target: None,
        });

        assert_eq!(set.category_of(&host("example.com")), Some(Category::Remove));
        assert_eq!(
            set.category_of(&host("old.example.org")),
            Some(Category::Rewrite)
        );
        assert_eq!(set.category_of(&host("gone.example.net")), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_skip_absent_from_all_sets() {
        let mut set = CategorySet::new();
        set.insert(ResolvedEntry {
            hostname: host("skipped.example.com"),
            category: Category::Skip,
            rewrite_target: None,
        });
        assert!(set.is_empty());
    }
}
