//! Compact matching patterns emitted by the optimizer
//!
//! Every rule the pipeline emits has domain-suffix semantics: a pattern for
//! `example.com` covers `example.com` and all of its subdomains. The
//! optimizer's only freedom is to fold several sibling hostnames under one
//! shared parent into a single alternation; the matched set must stay
//! exactly the union of the folded hostnames' individual patterns.

use crate::hostname::Hostname;

/// A matching pattern representing one or more resolved hostnames of the
/// same category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompactPattern {
    /// One hostname and all of its subdomains.
    Suffix(Hostname),
    /// Sibling hostnames `head.parent` folded under a shared parent suffix:
    /// matches `head.parent` and subdomains thereof, for each head.
    /// Never matches the bare parent.
    Group {
        parent: String,
        /// The label prefixes relative to `parent`, sorted, deduplicated.
        heads: Vec<String>,
    },
}

impl CompactPattern {
    /// Does this pattern cover `host`?
    pub fn matches(&self, host: &Hostname) -> bool {
        match self {
            Self::Suffix(base) => host == base || host.is_subdomain_of(base),
            Self::Group { parent, heads } => {
                let h = host.as_str();
                // host must end with ".parent" and the remaining prefix must
                // be one of the heads or a subdomain of one.
                let Some(prefix) = h
                    .strip_suffix(parent)
                    .and_then(|p| p.strip_suffix('.'))
                else {
                    return false;
                };
                heads.iter().any(|head| {
                    prefix == head
                        || prefix
                            .strip_suffix(head)
                            .is_some_and(|rest| rest.ends_with('.'))
                })
            }
        }
    }

    /// The hostnames this pattern was folded from.
    pub fn hostnames(&self) -> Vec<Hostname> {
        match self {
            Self::Suffix(host) => vec![host.clone()],
            Self::Group { parent, heads } => heads
                .iter()
                .filter_map(|head| Hostname::normalize(&format!("{head}.{parent}")).ok())
                .collect(),
        }
    }

    /// Render as an anchored regular expression for the downstream engine,
    /// e.g. `(.*\.)?(a|b)\.example\.com$`.
    pub fn to_regex(&self) -> String {
        match self {
            Self::Suffix(host) => format!("(.*\\.)?{}$", escape_regex(host.as_str())),
            Self::Group { parent, heads } => {
                let alternation = heads
                    .iter()
                    .map(|h| escape_regex(h))
                    .collect::<Vec<_>>()
                    .join("|");
                format!("(.*\\.)?({})\\.{}$", alternation, escape_regex(parent))
            }
        }
    }
}

impl std::fmt::Display for CompactPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_regex())
    }
}

/// Escape regex metacharacters in a hostname fragment. Hostnames only ever
/// contain `.` as a metacharacter, but escape defensively all the same.
fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(s: &str) -> Hostname {
        Hostname::normalize(s).unwrap()
    }

    #[test]
    fn test_suffix_matches_self_and_subdomains() {
        let p = CompactPattern::Suffix(host("example.com"));
        assert!(p.matches(&host("example.com")));
        assert!(p.matches(&host("a.example.com")));
        assert!(p.matches(&host("x.y.example.com")));
        assert!(!p.matches(&host("notexample.com")));
        assert!(!p.matches(&host("example.org")));
    }

    #[test]
    fn test_group_matches_exact_union() {
        let p = CompactPattern::Group {
            parent: "pixnet.net".into(),
            heads: vec!["alice".into(), "bob".into()],
        };
        assert!(p.matches(&host("alice.pixnet.net")));
        assert!(p.matches(&host("bob.pixnet.net")));
        assert!(p.matches(&host("deep.alice.pixnet.net")));
        // The bare parent and unlisted siblings are not covered.
        assert!(!p.matches(&host("pixnet.net")));
        assert!(!p.matches(&host("carol.pixnet.net")));
        // Label boundaries are respected.
        assert!(!p.matches(&host("notalice.pixnet.net")));
        assert!(!p.matches(&host("alice.pixnet.net.evil.com")));
    }

    #[test]
    fn test_group_hostnames_roundtrip() {
        let p = CompactPattern::Group {
            parent: "example.com".into(),
            heads: vec!["a".into(), "b".into()],
        };
        let hosts = p.hostnames();
        assert_eq!(hosts, vec![host("a.example.com"), host("b.example.com")]);
        for h in &hosts {
            assert!(p.matches(h));
        }
    }

    #[test]
    fn test_to_regex() {
        let p = CompactPattern::Suffix(host("example.com"));
        assert_eq!(p.to_regex(), "(.*\\.)?example\\.com$");

        let p = CompactPattern::Group {
            parent: "example.com".into(),
            heads: vec!["a".into(), "b".into()],
        };
        assert_eq!(p.to_regex(), "(.*\\.)?(a|b)\\.example\\.com$");
    }
}
