//! Hostnames Rule Compiler
//!
//! This crate turns heterogeneous domain filter lists into one compact,
//! deterministic category -> pattern rule set: parse each source, resolve
//! classification conflicts against the manual override table, collapse
//! redundant subdomains, then fold sibling hostnames into shared patterns.

pub mod merger;
pub mod optimizer;
pub mod overrides;
pub mod parser;
pub mod pipeline;
pub mod resolver;

pub use optimizer::OptimizeOptions;
pub use overrides::{parse_directives, DirectiveError, OverrideTable};
pub use parser::{parse_source, FormatTag, TabularOptions};
pub use pipeline::{
    FetchFailure, FetchOutcome, PipelineConfig, PipelineError, RuleSet, RunOutput, RunSummary,
    SourceSpec,
};
pub use resolver::{resolve, Conflict, ConflictKind};
