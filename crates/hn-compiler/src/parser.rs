//! Format parsers for the supported source list syntaxes
//!
//! Each parser turns raw source text into claims carrying the source's
//! default category. Malformed lines never abort a parse; they are skipped
//! and counted so the run summary can report them per source.

use hn_core::hostname::Hostname;
use hn_core::types::{Category, Claim, Origin};

/// The closed set of supported list syntaxes, dispatched by config tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTag {
    /// uBlock/uBlacklist style block lists: one domain rule per line.
    BlockList,
    /// Proxy rule lists: `keyword,domain[,tag]` per line.
    ProxyRule,
    /// Delimited rows with a header naming the hostname column.
    Tabular(TabularOptions),
}

/// Column layout for tabular sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularOptions {
    /// Header name of the column holding hostnames or URLs.
    pub hostname_column: String,
    /// Optional header name of a per-row category column. Rows without a
    /// recognized value fall back to the source default.
    pub category_column: Option<String>,
    pub delimiter: char,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            hostname_column: "url".to_string(),
            category_column: None,
            delimiter: ',',
        }
    }
}

/// Outcome of parsing one source document.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub claims: Vec<Claim>,
    /// Lines that looked like rules but could not be used.
    pub skipped: usize,
    /// Comment or blank lines (not counted as skipped).
    pub comments: usize,
}

/// Parse a source document into classification claims.
///
/// `default_category` is the source's declared action; `origin` carries its
/// priority. Re-parsing the same text yields the same claims.
pub fn parse_source(
    text: &str,
    tag: &FormatTag,
    default_category: Category,
    origin: Origin,
) -> Parsed {
    match tag {
        FormatTag::BlockList => parse_block_list(text, default_category, origin),
        FormatTag::ProxyRule => parse_proxy_rules(text, default_category, origin),
        FormatTag::Tabular(options) => parse_tabular(text, options, default_category, origin),
    }
}

// =============================================================================
// Block-list style
// =============================================================================

fn parse_block_list(text: &str, default_category: Category, origin: Origin) -> Parsed {
    let mut parsed = Parsed::default();

    for raw_line in text.lines() {
        let mut line = raw_line.trim();
        if line.is_empty() || line.starts_with('!') || line.starts_with('#') || line.starts_with('[')
        {
            parsed.comments += 1;
            continue;
        }

        // Trailing comment after the rule body.
        if let Some(pos) = line.find('#') {
            line = line[..pos].trim_end();
            if line.is_empty() {
                parsed.comments += 1;
                continue;
            }
        }

        let Some(body) = extract_rule_body(line) else {
            parsed.skipped += 1;
            continue;
        };

        let category = if body.has_path {
            // A rule pinned to a concrete path is weaker evidence against
            // the whole domain: demote removals to low priority, keep
            // everything else as declared.
            match default_category {
                Category::Remove => Category::LowPriority,
                other => other,
            }
        } else {
            default_category
        };

        match Hostname::normalize(body.host) {
            Ok(hostname) => parsed.claims.push(Claim::new(hostname, category, origin)),
            Err(_) => parsed.skipped += 1,
        }
    }

    parsed
}

struct RuleBody<'a> {
    host: &'a str,
    /// The rule constrained a concrete path, not just the domain.
    has_path: bool,
}

/// Pull the host token out of a block-list rule line.
///
/// Accepted shapes: `||domain^`, `||domain/path`, `*://domain/*`,
/// `*://*.domain/*`, `https://domain/...`, `*.domain/*`, `domain/path`,
/// bare `domain`, trailing-`*` variants.
fn extract_rule_body(line: &str) -> Option<RuleBody<'_>> {
    let mut rest = line;

    if let Some(stripped) = rest.strip_prefix("||") {
        rest = stripped;
    } else if let Some(pos) = rest.find("://") {
        rest = &rest[pos + 3..];
    }
    rest = rest.strip_prefix("*.").unwrap_or(rest);
    let rest = rest.trim_end_matches(['^', '|']);

    let (host, path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };
    let host = host.trim_end_matches('*');
    if host.is_empty() || !host.contains('.') {
        return None;
    }

    // "/", "/*" and "" all mean the whole domain; anything longer pins a
    // concrete path.
    let has_path = !matches!(path, "" | "/" | "/*");

    Some(RuleBody { host, has_path })
}

// =============================================================================
// Proxy-rule style
// =============================================================================

fn parse_proxy_rules(text: &str, default_category: Category, origin: Origin) -> Parsed {
    let mut parsed = Parsed::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            parsed.comments += 1;
            continue;
        }

        let mut fields = line.split(',').map(str::trim);
        let Some(keyword) = fields.next() else {
            parsed.skipped += 1;
            continue;
        };

        // Only domain-shaped keywords yield claims; everything else
        // (IP-CIDR, GEOIP, FINAL, ...) is silently irrelevant here.
        if !matches!(
            keyword.to_ascii_lowercase().as_str(),
            "domain" | "domain-suffix" | "full"
        ) {
            parsed.comments += 1;
            continue;
        }

        let Some(domain) = fields.next().filter(|d| !d.is_empty()) else {
            parsed.skipped += 1;
            continue;
        };
        // A third field is an engine tag; its presence is fine, its content
        // is not ours to interpret.

        match Hostname::normalize(domain) {
            Ok(hostname) => parsed
                .claims
                .push(Claim::new(hostname, default_category, origin)),
            Err(_) => parsed.skipped += 1,
        }
    }

    parsed
}

// =============================================================================
// Tabular style
// =============================================================================

fn parse_tabular(
    text: &str,
    options: &TabularOptions,
    default_category: Category,
    origin: Origin,
) -> Parsed {
    let mut parsed = Parsed::default();
    let mut lines = text.lines();

    // Header row fixes the column layout for the rest of the document.
    let Some(header_line) = lines.next() else {
        return parsed;
    };
    let header = split_row(header_line, options.delimiter);
    let Some(host_idx) = find_column(&header, &options.hostname_column) else {
        // Without the hostname column every row is unusable.
        parsed.skipped += text.lines().count().saturating_sub(1);
        return parsed;
    };
    let category_idx = options
        .category_column
        .as_deref()
        .and_then(|name| find_column(&header, name));

    for raw_line in lines {
        if raw_line.trim().is_empty() {
            parsed.comments += 1;
            continue;
        }

        let row = split_row(raw_line, options.delimiter);
        let Some(cell) = row.get(host_idx).map(|c| c.trim()).filter(|c| !c.is_empty())
        else {
            parsed.skipped += 1;
            continue;
        };

        let category = category_idx
            .and_then(|idx| row.get(idx))
            .and_then(|c| Category::parse(c.trim()))
            .unwrap_or(default_category);

        match Hostname::normalize(cell) {
            Ok(hostname) => parsed.claims.push(Claim::new(hostname, category, origin)),
            Err(_) => parsed.skipped += 1,
        }
    }

    parsed
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Split one delimited row, honoring double-quoted cells with `""` escapes.
fn split_row(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    cells.push(current);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> Origin {
        Origin::Source { priority: 1 }
    }

    fn hostnames(parsed: &Parsed) -> Vec<&str> {
        parsed.claims.iter().map(|c| c.hostname.as_str()).collect()
    }

    #[test]
    fn test_block_list_basic_shapes() {
        let text = "\
! comment
# another comment
||ads.example.com^
*://*.farm.example.org/*
https://tracker.example.net/
content-farm.example.com
plain.example.com/*
";
        let parsed = parse_source(text, &FormatTag::BlockList, Category::Remove, src());
        assert_eq!(
            hostnames(&parsed),
            vec![
                "ads.example.com",
                "farm.example.org",
                "tracker.example.net",
                "content-farm.example.com",
                "plain.example.com",
            ]
        );
        assert_eq!(parsed.comments, 2);
        assert_eq!(parsed.skipped, 0);
        assert!(parsed
            .claims
            .iter()
            .all(|c| c.category == Category::Remove));
    }

    #[test]
    fn test_block_list_path_rule_demotes_remove() {
        let text = "example.com/news/*\n||example.org/tracking/pixel\n";
        let parsed = parse_source(text, &FormatTag::BlockList, Category::Remove, src());
        assert_eq!(parsed.claims.len(), 2);
        assert!(parsed
            .claims
            .iter()
            .all(|c| c.category == Category::LowPriority));

        // Non-remove sources keep their action for path rules.
        let parsed = parse_source(text, &FormatTag::BlockList, Category::HighPriority, src());
        assert!(parsed
            .claims
            .iter()
            .all(|c| c.category == Category::HighPriority));
    }

    #[test]
    fn test_block_list_skips_malformed() {
        let text = "||^\n*://*/ads.js\nnodots\n||valid.example.com^\n";
        let parsed = parse_source(text, &FormatTag::BlockList, Category::Remove, src());
        assert_eq!(hostnames(&parsed), vec!["valid.example.com"]);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn test_block_list_inline_comment() {
        let text = "spam.example.com # known content farm\n";
        let parsed = parse_source(text, &FormatTag::BlockList, Category::Remove, src());
        assert_eq!(hostnames(&parsed), vec!["spam.example.com"]);
    }

    #[test]
    fn test_block_list_restartable() {
        let text = "||a.example.com^\nb.example.com\n";
        let first = parse_source(text, &FormatTag::BlockList, Category::Remove, src());
        let second = parse_source(text, &FormatTag::BlockList, Category::Remove, src());
        assert_eq!(first.claims, second.claims);
    }

    #[test]
    fn test_proxy_rules() {
        let text = "\
# proxy list
DOMAIN,ads.example.com
DOMAIN-SUFFIX,farm.example.org,REJECT
full,exact.example.net
IP-CIDR,10.0.0.0/8,DIRECT
GEOIP,CN,DIRECT
DOMAIN,
";
        let parsed = parse_source(text, &FormatTag::ProxyRule, Category::Remove, src());
        assert_eq!(
            hostnames(&parsed),
            vec!["ads.example.com", "farm.example.org", "exact.example.net"]
        );
        // Unknown keywords are ignored without error; only the empty-domain
        // line is a skip.
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_tabular_with_header() {
        let options = TabularOptions {
            hostname_column: "Address".into(),
            category_column: None,
            delimiter: ',',
        };
        let text = "\
Name,Address,RSS
Some Blog,https://blog.example.com/,https://blog.example.com/feed
Another,\"https://notes.example.org/about\",
Broken row with no address,,
";
        let parsed = parse_source(
            text,
            &FormatTag::Tabular(options),
            Category::HighPriority,
            src(),
        );
        assert_eq!(
            hostnames(&parsed),
            vec!["blog.example.com", "notes.example.org"]
        );
        assert_eq!(parsed.skipped, 1);
        assert!(parsed
            .claims
            .iter()
            .all(|c| c.category == Category::HighPriority));
    }

    #[test]
    fn test_tabular_category_column() {
        let options = TabularOptions {
            hostname_column: "host".into(),
            category_column: Some("action".into()),
            delimiter: ',',
        };
        let text = "\
host,action
a.example.com,remove
b.example.com,high_priority
c.example.com,not-a-category
";
        let parsed = parse_source(
            text,
            &FormatTag::Tabular(options),
            Category::LowPriority,
            src(),
        );
        assert_eq!(parsed.claims[0].category, Category::Remove);
        assert_eq!(parsed.claims[1].category, Category::HighPriority);
        // Unrecognized value falls back to the source default.
        assert_eq!(parsed.claims[2].category, Category::LowPriority);
    }

    #[test]
    fn test_tabular_missing_hostname_column() {
        let options = TabularOptions {
            hostname_column: "Address".into(),
            category_column: None,
            delimiter: ',',
        };
        let text = "Name,Url\nX,https://x.example.com/\n";
        let parsed = parse_source(
            text,
            &FormatTag::Tabular(options),
            Category::Remove,
            src(),
        );
        assert!(parsed.claims.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_split_row_quoted_cells() {
        assert_eq!(
            split_row("a,\"b,c\",d", ','),
            vec!["a".to_string(), "b,c".to_string(), "d".to_string()]
        );
        assert_eq!(
            split_row("\"he said \"\"hi\"\"\",x", ','),
            vec!["he said \"hi\"".to_string(), "x".to_string()]
        );
    }
}
