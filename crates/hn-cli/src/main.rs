//! Hostnames CLI
//!
//! Compiles configured domain filter lists and manual overrides into a
//! category -> pattern rule set for a downstream filtering engine.

use std::fs;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use hn_compiler::{parse_directives, pipeline, PipelineConfig};

mod config;
mod emit;
mod fetch;

use config::Config;

#[derive(Parser)]
#[command(name = "hn-cli")]
#[command(about = "Hostname filter list compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all configured sources and compile the rule set
    Compile {
        /// JSON config declaring sources and tuning
        #[arg(short, long)]
        config: String,

        /// Manual override directive file
        #[arg(long)]
        overrides: Option<String>,

        /// Output rules file
        #[arg(short, long, default_value = "rules.json")]
        output: String,

        /// Emit one pattern per hostname, skipping compaction
        #[arg(long)]
        no_optimize: bool,

        /// Print conflicts and directive errors
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate an override directive file
    Check {
        /// Directive file to validate
        #[arg(long)]
        overrides: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            config,
            overrides,
            output,
            no_optimize,
            verbose,
        } => cmd_compile(&config, overrides.as_deref(), &output, no_optimize, verbose).await,
        Commands::Check { overrides } => cmd_check(&overrides),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn cmd_compile(
    config_path: &str,
    overrides_path: Option<&str>,
    output_path: &str,
    no_optimize: bool,
    verbose: bool,
) -> Result<(), String> {
    let start = Instant::now();

    let config_text = fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read '{config_path}': {e}"))?;
    let config = Config::from_json(&config_text)?;
    let sources = config.enabled_sources()?;
    if sources.is_empty() {
        return Err("No enabled sources in config".to_string());
    }

    let override_text = match overrides_path {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("Failed to read '{path}': {e}"))?
        }
        None => String::new(),
    };

    let outcomes = fetch::fetch_all(sources, Duration::from_secs(config.fetch.timeout_secs)).await;

    let pipeline_config = PipelineConfig {
        optimize: config.optimize_options(no_optimize),
    };
    let output = pipeline::run(&pipeline_config, outcomes, &override_text)
        .map_err(|e| e.to_string())?;

    let document = emit::RuleDocument::from_output(&output);
    fs::write(output_path, document.to_json()?)
        .map_err(|e| format!("Failed to write '{output_path}': {e}"))?;

    println!("Compiled rules to '{output_path}'");
    emit::print_summary(&output.summary, verbose);
    if verbose {
        emit::print_conflicts(&output.conflicts);
        for err in &output.directive_errors {
            println!("Directive error: {err}");
        }
    }
    println!(
        "Time: {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

fn cmd_check(overrides_path: &str) -> Result<(), String> {
    let text = fs::read_to_string(overrides_path)
        .map_err(|e| format!("Failed to read '{overrides_path}': {e}"))?;

    let (claims, errors) = parse_directives(&text);
    println!(
        "'{overrides_path}': {} directive(s), {} error(s)",
        claims.len(),
        errors.len()
    );
    for err in &errors {
        println!("  {err}");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} invalid directive line(s)", errors.len()))
    }
}
