//! Run configuration
//!
//! A JSON file declares the source lists and tuning knobs; it deserializes
//! here and is converted once into the pipeline's immutable config. Config
//! order matters: a source's priority defaults to its position, so later
//! entries outrank earlier ones when claims collide.

use serde::Deserialize;

use hn_compiler::{FormatTag, OptimizeOptions, SourceSpec, TabularOptions};
use hn_core::types::Category;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    /// Exactly one of `url` / `path` must be set.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    pub format: FormatConfig,
    /// Category string, validated against the closed set.
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Explicit rank; defaults to position in the source list.
    #[serde(default)]
    pub priority: Option<u32>,
    /// Column layout, required when `format` is `tabular`.
    #[serde(default)]
    pub tabular: Option<TabularConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatConfig {
    BlockList,
    ProxyRule,
    Tabular,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TabularConfig {
    pub hostname_column: String,
    #[serde(default)]
    pub category_column: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OptimizationConfig {
    pub enabled: bool,
    pub group_threshold: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        let defaults = OptimizeOptions::default();
        Self {
            enabled: defaults.enabled,
            group_threshold: defaults.group_threshold,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

fn default_action() -> String {
    "remove".to_string()
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid config: {e}"))
    }

    pub fn optimize_options(&self, disable: bool) -> OptimizeOptions {
        OptimizeOptions {
            enabled: self.optimization.enabled && !disable,
            group_threshold: self.optimization.group_threshold,
        }
    }

    /// Enabled sources resolved into pipeline specs, paired with their
    /// fetch location. Index-derived priorities make later config entries
    /// outrank earlier ones unless an explicit `priority` says otherwise.
    pub fn enabled_sources(&self) -> Result<Vec<(SourceSpec, Location)>, String> {
        let mut out = Vec::new();
        for (index, source) in self.sources.iter().enumerate() {
            if !source.enabled {
                continue;
            }

            let category = Category::parse(&source.action).ok_or_else(|| {
                format!(
                    "source '{}': unknown action '{}'",
                    source.name, source.action
                )
            })?;

            let format = match source.format {
                FormatConfig::BlockList => FormatTag::BlockList,
                FormatConfig::ProxyRule => FormatTag::ProxyRule,
                FormatConfig::Tabular => {
                    let tabular = source.tabular.as_ref().ok_or_else(|| {
                        format!("source '{}': tabular format needs a 'tabular' section", source.name)
                    })?;
                    FormatTag::Tabular(TabularOptions {
                        hostname_column: tabular.hostname_column.clone(),
                        category_column: tabular.category_column.clone(),
                        delimiter: tabular.delimiter,
                    })
                }
            };

            let location = match (&source.url, &source.path) {
                (Some(url), None) => Location::Url(url.clone()),
                (None, Some(path)) => Location::Path(path.clone()),
                _ => {
                    return Err(format!(
                        "source '{}': exactly one of 'url' or 'path' required",
                        source.name
                    ))
                }
            };

            out.push((
                SourceSpec {
                    id: source.name.clone(),
                    format,
                    default_category: category,
                    priority: source.priority.unwrap_or(index as u32),
                },
                location,
            ));
        }
        Ok(out)
    }
}

/// Where a source's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    Path(String),
}
