//! Pattern compaction
//!
//! Folds sibling hostnames that share a direct parent domain into one
//! alternation pattern once the group is large enough to pay for itself.
//! Purely size-reducing: the matched set of the output equals the matched
//! set of one suffix pattern per input hostname, exactly.

use std::collections::{BTreeMap, BTreeSet};

use hn_core::hostname::Hostname;
use hn_core::pattern::CompactPattern;

/// Tuning for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// When false, every hostname becomes its own suffix pattern.
    pub enabled: bool,
    /// Minimum sibling-group size worth folding into one pattern.
    pub group_threshold: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            group_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Hostnames fed in.
    pub before: usize,
    /// Patterns emitted.
    pub after: usize,
    /// Hostnames that were folded into group patterns.
    pub compacted: usize,
}

/// Compact one category's merged hostname set into patterns.
///
/// Output order is deterministic: patterns sort by their rendered form via
/// the derived ordering, independent of input order.
pub fn optimize_set(hostnames: &BTreeSet<Hostname>, options: OptimizeOptions) -> (Vec<CompactPattern>, OptimizeStats) {
    let mut stats = OptimizeStats {
        before: hostnames.len(),
        ..Default::default()
    };

    if !options.enabled || options.group_threshold < 2 {
        let patterns: Vec<CompactPattern> = hostnames
            .iter()
            .map(|h| CompactPattern::Suffix(h.clone()))
            .collect();
        stats.after = patterns.len();
        return (patterns, stats);
    }

    // Bucket by direct parent; hostnames with no parent hostname (bare
    // registrable domains) can only ever be suffix patterns.
    let mut groups: BTreeMap<String, Vec<&Hostname>> = BTreeMap::new();
    let mut singles: Vec<&Hostname> = Vec::new();
    for host in hostnames {
        match host.parent() {
            Some(parent) => groups.entry(parent.to_string()).or_default().push(host),
            None => singles.push(host),
        }
    }

    let mut patterns = Vec::new();
    for (parent, members) in groups {
        if members.len() >= options.group_threshold {
            let heads: Vec<String> = members
                .iter()
                .filter_map(|h| h.as_str().strip_suffix(parent.as_str()))
                .filter_map(|p| p.strip_suffix('.'))
                .map(str::to_string)
                .collect();
            stats.compacted += members.len();
            patterns.push(CompactPattern::Group { parent, heads });
        } else {
            patterns.extend(members.into_iter().map(|h| CompactPattern::Suffix(h.clone())));
        }
    }
    patterns.extend(singles.into_iter().map(|h| CompactPattern::Suffix(h.clone())));

    patterns.sort();
    stats.after = patterns.len();
    (patterns, stats)
}
