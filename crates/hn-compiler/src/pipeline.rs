//! Pipeline orchestration
//!
//! Sequences parse -> resolve -> merge -> optimize over whatever sources
//! the fetcher managed to retrieve. Fetching itself lives outside this
//! crate; the pipeline consumes per-source outcomes and treats a failed
//! fetch as one more thing to report, never a reason to abort. The only
//! fatal condition is a run with nothing usable at all: every source
//! failed and the override table is empty.

use std::collections::BTreeMap;

use hn_core::hostname::Hostname;
use hn_core::pattern::CompactPattern;
use hn_core::types::{Category, Claim, Origin};
use thiserror::Error;

use crate::merger;
use crate::optimizer::{self, OptimizeOptions};
use crate::overrides::{DirectiveError, OverrideTable};
use crate::parser::{self, FormatTag};
use crate::resolver::{self, Conflict};

// =============================================================================
// Configuration
// =============================================================================

/// One configured source list.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    /// Stable identifier used in the summary (config name or URL).
    pub id: String,
    pub format: FormatTag,
    /// Category claimed for every entry the source yields.
    pub default_category: Category,
    /// Rank among sources; greater outranks lesser at resolution time.
    pub priority: u32,
}

/// Immutable per-run configuration, threaded explicitly.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub optimize: OptimizeOptions,
}

// =============================================================================
// Fetch Outcomes
// =============================================================================

/// What the fetcher delivered for one source.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub spec: SourceSpec,
    pub payload: Result<String, FetchFailure>,
}

/// A source that could not be retrieved or decoded. Recorded, not raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FetchFailure(pub String);

// =============================================================================
// Run Output
// =============================================================================

/// The final category -> pattern mapping handed to the rule sink.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub remove: Vec<CompactPattern>,
    pub low_priority: Vec<CompactPattern>,
    pub high_priority: Vec<CompactPattern>,
    /// Rewrite pairs `(hostname, target)`, in hostname order.
    pub rewrite: Vec<(Hostname, Hostname)>,
}

/// Per-source parse accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub claims: usize,
    pub skipped: usize,
    pub comments: usize,
    /// Present when the fetch failed; all other counts are then zero.
    pub failure: Option<String>,
}

/// Aggregate run statistics for logging and reporting.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub per_source: BTreeMap<String, SourceSummary>,
    /// Distinct hostnames seen across all inputs.
    pub hostnames_resolved: usize,
    /// Hostnames dropped by unresolvable winning claims.
    pub dropped: usize,
    /// Hostnames settled as skip.
    pub skipped_by_directive: usize,
    /// Subdomains collapsed away by the merger.
    pub merged_away: usize,
    /// Hostnames folded into group patterns.
    pub pattern_compacted: usize,
    /// Final per-category entry counts (hostnames, pre-compaction).
    pub category_counts: BTreeMap<Category, usize>,
    pub directive_errors: usize,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rules: RuleSet,
    pub summary: RunSummary,
    pub conflicts: Vec<Conflict>,
    pub directive_errors: Vec<DirectiveError>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every source failed and no override directives exist; the run has
    /// nothing to work with and produces no output.
    #[error("no usable input: all {failed} source(s) failed and the override table is empty")]
    NoUsableInput { failed: usize },
}

// =============================================================================
// Run
// =============================================================================

/// Execute one full pipeline run.
///
/// `outcomes` holds every configured source's fetch result; `override_text`
/// is the raw directive file (empty string for none). Deterministic for
/// identical inputs.
pub fn run(
    config: &PipelineConfig,
    outcomes: Vec<FetchOutcome>,
    override_text: &str,
) -> Result<RunOutput, PipelineError> {
    let (overrides, directive_errors) = OverrideTable::parse(override_text);
    for err in &directive_errors {
        log::warn!("override directive {err}");
    }

    let mut summary = RunSummary {
        directive_errors: directive_errors.len(),
        ..Default::default()
    };
    let mut claims: Vec<Claim> = Vec::new();
    let mut failed = 0usize;

    for outcome in outcomes {
        let spec = outcome.spec;
        let entry = summary.per_source.entry(spec.id.clone()).or_default();
        match outcome.payload {
            Ok(text) => {
                let parsed = parser::parse_source(
                    &text,
                    &spec.format,
                    spec.default_category,
                    Origin::Source {
                        priority: spec.priority,
                    },
                );
                log::info!(
                    "source '{}': {} claim(s), {} skipped line(s)",
                    spec.id,
                    parsed.claims.len(),
                    parsed.skipped
                );
                entry.claims = parsed.claims.len();
                entry.skipped = parsed.skipped;
                entry.comments = parsed.comments;
                claims.extend(parsed.claims);
            }
            Err(failure) => {
                log::warn!("source '{}' failed: {failure}", spec.id);
                entry.failure = Some(failure.0);
                failed += 1;
            }
        }
    }

    if claims.is_empty() && overrides.is_empty() {
        return Err(PipelineError::NoUsableInput { failed });
    }

    let resolution = resolver::resolve(claims, &overrides);
    summary.hostnames_resolved =
        resolution.categories.len() + resolution.dropped + resolution.skipped;
    summary.dropped = resolution.dropped;
    summary.skipped_by_directive = resolution.skipped;

    let mut categories = resolution.categories;
    let merge_stats = merger::merge(&mut categories);
    summary.merged_away = merge_stats.total();

    let mut rules = RuleSet::default();
    let mut compacted = 0usize;
    for (category, set, out) in [
        (Category::Remove, &categories.remove, &mut rules.remove),
        (
            Category::LowPriority,
            &categories.low_priority,
            &mut rules.low_priority,
        ),
        (
            Category::HighPriority,
            &categories.high_priority,
            &mut rules.high_priority,
        ),
    ] {
        let (patterns, stats) = optimizer::optimize_set(set, config.optimize);
        compacted += stats.compacted;
        summary.category_counts.insert(category, set.len());
        *out = patterns;
    }
    summary.pattern_compacted = compacted;
    summary
        .category_counts
        .insert(Category::Rewrite, categories.rewrite.len());

    rules.rewrite = categories
        .rewrite
        .iter()
        .map(|(host, target)| (host.clone(), target.clone()))
        .collect();

    Ok(RunOutput {
        rules,
        summary,
        conflicts: resolution.conflicts,
        directive_errors,
    })
}
