//! Rule sink and run reporting
//!
//! The pipeline hands over an in-memory rule set; this module owns the
//! serialization format (JSON, one object keyed by category, patterns as
//! anchored regex strings) and the human-readable summary.

use std::collections::BTreeMap;

use serde::Serialize;

use hn_compiler::resolver::{Conflict, ConflictKind};
use hn_compiler::{RunOutput, RunSummary};

/// Serialized form of a finished rule set.
#[derive(Debug, Serialize)]
pub struct RuleDocument {
    pub remove: Vec<String>,
    pub low_priority: Vec<String>,
    pub high_priority: Vec<String>,
    pub rewrite: BTreeMap<String, String>,
}

impl RuleDocument {
    pub fn from_output(output: &RunOutput) -> Self {
        let render = |patterns: &[hn_core::CompactPattern]| {
            patterns.iter().map(|p| p.to_regex()).collect()
        };
        Self {
            remove: render(&output.rules.remove),
            low_priority: render(&output.rules.low_priority),
            high_priority: render(&output.rules.high_priority),
            rewrite: output
                .rules
                .rewrite
                .iter()
                .map(|(host, target)| (host.to_string(), target.to_string()))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("serialize rules: {e}"))
    }
}

/// Print per-source and per-category accounting to the terminal.
pub fn print_summary(summary: &RunSummary, verbose: bool) {
    println!("Sources:");
    for (id, source) in &summary.per_source {
        match &source.failure {
            Some(reason) => println!("  [failed]  {id} - {reason}"),
            None => println!(
                "  [ok]      {id} - {} claims, {} skipped lines",
                source.claims, source.skipped
            ),
        }
    }

    println!("Hostnames:");
    println!("  Resolved:   {}", summary.hostnames_resolved);
    println!("  Dropped:    {}", summary.dropped);
    println!("  Skipped:    {}", summary.skipped_by_directive);
    println!("  Merged:     {}", summary.merged_away);
    println!("  Compacted:  {}", summary.pattern_compacted);

    println!("Categories:");
    for (category, count) in &summary.category_counts {
        println!("  {:<14} {}", format!("{category}:"), count);
    }

    if verbose && summary.directive_errors > 0 {
        println!("Directive errors: {}", summary.directive_errors);
    }
}

/// Print resolved conflicts when asked for them.
pub fn print_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        return;
    }
    println!("Conflicts:");
    for conflict in conflicts {
        let competing: Vec<&str> = conflict.competing.iter().map(|c| c.as_str()).collect();
        let winner = conflict
            .winner
            .map(|c| c.as_str())
            .unwrap_or("dropped");
        let kind = match &conflict.kind {
            ConflictKind::ManualOverride => "manual override",
            ConflictKind::PriorityTie => "priority tie",
            ConflictKind::Dropped(_) => "unusable claim",
        };
        println!(
            "  {} [{}] -> {} ({})",
            conflict.hostname,
            competing.join(", "),
            winner,
            kind
        );
    }
}
