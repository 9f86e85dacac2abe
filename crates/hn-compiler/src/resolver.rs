//! Classification conflict resolution
//!
//! The resolver sees the complete claim stream for a run and decides one
//! category per hostname. Manual overrides win outright; otherwise the
//! highest-priority source wins; equal-priority disagreements fall back to
//! category precedence. Nothing here is an error: every override,
//! tie-break and drop is recorded in the conflict report and the run goes
//! on.

use std::collections::BTreeMap;

use hn_core::hostname::Hostname;
use hn_core::types::{Category, CategorySet, Claim, ResolvedEntry};

use crate::overrides::OverrideTable;

// =============================================================================
// Conflict Report
// =============================================================================

/// How a contested hostname was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// A manual directive displaced one or more source claims.
    ManualOverride,
    /// Equal-priority sources disagreed; category precedence decided.
    PriorityTie,
    /// The winning claim was unusable and the hostname was dropped.
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// `Rewrite` without a replacement hostname.
    RewriteWithoutTarget,
    /// `Rewrite` whose target equals the hostname itself.
    SelfRewrite,
}

/// One recorded resolution outcome, kept for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub hostname: Hostname,
    /// Every category that was claimed for this hostname.
    pub competing: Vec<Category>,
    /// The surviving category, `None` when the hostname was dropped.
    pub winner: Option<Category>,
    pub kind: ConflictKind,
}

/// Resolution output: the category sets plus everything worth reporting.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub categories: CategorySet,
    pub conflicts: Vec<Conflict>,
    /// Hostnames dropped by an unusable winning claim.
    pub dropped: usize,
    /// Hostnames settled as `Skip` (absent from all output sets).
    pub skipped: usize,
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolve the full claim stream into per-category hostname sets.
///
/// Claims must already be normalized; `overrides` supplies the manual
/// claims (they need not also appear in `claims`). Exactly one resolved
/// entry survives per distinct hostname.
pub fn resolve(claims: Vec<Claim>, overrides: &OverrideTable) -> Resolution {
    let mut groups: BTreeMap<Hostname, Vec<Claim>> = BTreeMap::new();
    for claim in claims {
        groups.entry(claim.hostname.clone()).or_default().push(claim);
    }
    // Manual claims join their group; hostnames only mentioned by a
    // directive still get an entry of their own.
    for claim in overrides.claims() {
        groups
            .entry(claim.hostname.clone())
            .or_default()
            .push(claim.clone());
    }

    let mut resolution = Resolution::default();

    for (hostname, group) in groups {
        let competing = competing_categories(&group);
        let Some((winner, kind)) = pick_winner(&group) else {
            continue;
        };

        log::debug!(
            "resolved {} -> {} from {} claim(s)",
            hostname,
            winner.category,
            group.len()
        );

        if let Some(kind) = kind {
            resolution.conflicts.push(Conflict {
                hostname: hostname.clone(),
                competing: competing.clone(),
                winner: Some(winner.category),
                kind,
            });
        }

        // Validate the winning claim before it reaches any category set.
        if winner.category == Category::Rewrite {
            let reason = match &winner.rewrite_target {
                None => Some(DropReason::RewriteWithoutTarget),
                Some(target) if *target == hostname => Some(DropReason::SelfRewrite),
                Some(_) => None,
            };
            if let Some(reason) = reason {
                resolution.dropped += 1;
                resolution.conflicts.push(Conflict {
                    hostname,
                    competing,
                    winner: None,
                    kind: ConflictKind::Dropped(reason),
                });
                continue;
            }
        }

        if winner.category == Category::Skip {
            resolution.skipped += 1;
        }

        resolution.categories.insert(ResolvedEntry {
            hostname,
            category: winner.category,
            rewrite_target: winner.rewrite_target.clone(),
        });
    }

    resolution
}

/// Distinct categories claimed within a group, in claim order.
fn competing_categories(group: &[Claim]) -> Vec<Category> {
    let mut seen = Vec::new();
    for claim in group {
        if !seen.contains(&claim.category) {
            seen.push(claim.category);
        }
    }
    seen
}

/// Pick the surviving claim and note whether the pick is worth reporting.
/// Returns `None` only for an empty group.
fn pick_winner(group: &[Claim]) -> Option<(&Claim, Option<ConflictKind>)> {
    if let Some(manual) = group.iter().find(|c| c.origin.is_manual()) {
        let displaced = group
            .iter()
            .any(|c| !c.origin.is_manual() && c.category != manual.category);
        let kind = displaced.then_some(ConflictKind::ManualOverride);
        return Some((manual, kind));
    }

    // Source claims only: highest priority wins; within that priority the
    // most consequential category wins.
    let top_priority = group
        .iter()
        .filter_map(|c| c.origin.source_priority())
        .max()?;
    let contenders: Vec<&Claim> = group
        .iter()
        .filter(|c| c.origin.source_priority() == Some(top_priority))
        .collect();

    let winner = contenders
        .iter()
        .copied()
        .max_by_key(|c| c.category.precedence())?;

    let tied = contenders.iter().any(|c| c.category != winner.category);
    let kind = tied.then_some(ConflictKind::PriorityTie);
    Some((winner, kind))
}
