//! Hostnames Core Library
//!
//! Value types and pure hostname algorithms shared by the rule compiler.
//!
//! # Modules
//!
//! - `hostname`: normalization, validation and domain hierarchy helpers
//! - `types`: categories, claims and per-category sets
//! - `pattern`: compact suffix patterns emitted by the optimizer

pub mod hostname;
pub mod pattern;
pub mod types;

// Re-export commonly used types
pub use hostname::{Hostname, NormalizeError};
pub use pattern::CompactPattern;
pub use types::{Category, CategorySet, Claim, Origin, ResolvedEntry};
