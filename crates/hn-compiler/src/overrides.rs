//! Manual override directives
//!
//! A directive file is line-oriented, one `action:value` per line, with `#`
//! comments. Five actions are recognized: `remove`, `low_priority`,
//! `high_priority` and `skip` take a hostname; `rewrite` takes `old=new`.
//! Later directives for the same hostname replace earlier ones, matching
//! the order a human edits the file in.

use std::collections::BTreeMap;

use hn_core::hostname::Hostname;
use hn_core::types::{Category, Claim, Origin};
use thiserror::Error;

/// A malformed directive line; never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}: {text}")]
pub struct DirectiveError {
    pub line: usize,
    pub reason: DirectiveErrorKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DirectiveErrorKind {
    #[error("missing ':' separator")]
    MissingSeparator,
    #[error("unknown action")]
    UnknownAction,
    #[error("invalid hostname")]
    InvalidHostname,
    #[error("rewrite must be old=new")]
    MalformedRewrite,
    #[error("invalid rewrite target")]
    InvalidRewriteTarget,
}

/// Parse a directive file into manual claims.
///
/// Every claim carries `Origin::Manual`. Errors are reported per line and
/// do not stop parsing; the claims list preserves file order so the
/// last-wins rule can be applied by [`OverrideTable::from_claims`].
pub fn parse_directives(text: &str) -> (Vec<Claim>, Vec<DirectiveError>) {
    let mut claims = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let err = |reason| DirectiveError {
            line: line_no,
            reason,
            text: line.to_string(),
        };

        let Some((action, value)) = line.split_once(':') else {
            errors.push(err(DirectiveErrorKind::MissingSeparator));
            continue;
        };
        let value = value.trim();

        match Category::parse(action.trim()) {
            Some(Category::Rewrite) => {
                let Some((old, new)) = value.split_once('=') else {
                    errors.push(err(DirectiveErrorKind::MalformedRewrite));
                    continue;
                };
                let Ok(hostname) = Hostname::normalize(old) else {
                    errors.push(err(DirectiveErrorKind::InvalidHostname));
                    continue;
                };
                let Ok(target) = Hostname::normalize(new) else {
                    errors.push(err(DirectiveErrorKind::InvalidRewriteTarget));
                    continue;
                };
                claims.push(Claim::rewrite(hostname, target, Origin::Manual));
            }
            Some(category) => match Hostname::normalize(value) {
                Ok(hostname) => claims.push(Claim::new(hostname, category, Origin::Manual)),
                Err(_) => errors.push(err(DirectiveErrorKind::InvalidHostname)),
            },
            None => errors.push(err(DirectiveErrorKind::UnknownAction)),
        }
    }

    (claims, errors)
}

// =============================================================================
// Override Table
// =============================================================================

/// The effective manual classification per hostname, after last-wins
/// collapsing.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: BTreeMap<Hostname, Claim>,
}

impl OverrideTable {
    /// Build from in-order manual claims; a later claim for the same
    /// hostname replaces an earlier one.
    pub fn from_claims(claims: Vec<Claim>) -> Self {
        let mut entries = BTreeMap::new();
        for claim in claims {
            entries.insert(claim.hostname.clone(), claim);
        }
        Self { entries }
    }

    /// Parse a directive file straight into a table.
    pub fn parse(text: &str) -> (Self, Vec<DirectiveError>) {
        let (claims, errors) = parse_directives(text);
        (Self::from_claims(claims), errors)
    }

    pub fn get(&self, hostname: &Hostname) -> Option<&Claim> {
        self.entries.get(hostname)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All effective manual claims, in hostname order.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.entries.values()
    }
}
