//! `depscan` — discover project dependencies across ecosystems.
//!
//! # Flow
//! 1. Parse CLI arguments ([`depscan::cli`]).
//! 2. Load scanner config ([`depscan::config::load_config`]).
//! 3. Walk the tree and extract dependencies ([`depscan::discover_with`]).
//! 4. Print the result in the requested format.
//! 5. Exit `0` (clean) or `1` (a manifest of record failed to extract).

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use depscan::cli::{Cli, OutputFormat};
use depscan::config::load_config;
use depscan::extractor::Registry;
use depscan::models::Ecosystem;
use depscan::{discover_with, toolchain};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "depscan=debug"
    } else if cli.quiet {
        "depscan=error"
    } else {
        "depscan=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Resolve project path
    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());

    let config = load_config(&path, cli.config.as_deref())?;

    let mut ignore = config.ignore.clone();
    ignore.extend(cli.ignore.iter().cloned());

    for binary in toolchain::missing_binaries() {
        warn!(binary, "not found on PATH, Gemfile extraction will fail");
    }

    let registry = Registry::new(Duration::from_secs(config.ruby.lock_timeout_secs));
    let (mut discovery, err) = discover_with(&path, &ignore, &registry);

    // Ecosystem filter applies to output only, not to the walk
    if !cli.lang.is_empty() {
        let wanted: Vec<Ecosystem> = cli.lang.iter().map(Into::into).collect();
        discovery.deps.retain(|d| wanted.contains(&d.ecosystem));
        discovery.dedup();
    }

    if !cli.quiet {
        eprintln!(
            "  {} {} dependencies [{}]",
            "→".cyan(),
            discovery.deps.len(),
            discovery.ecosystems
        );
    }

    match cli.format {
        OutputFormat::Purl => {
            for dep in &discovery.deps {
                println!("{}", dep.purl());
            }
        }
        OutputFormat::Plain => {
            for dep in &discovery.deps {
                if dep.version.is_empty() {
                    println!("{}\t{}", dep.ecosystem, dep.name);
                } else {
                    println!("{}\t{}\t{}", dep.ecosystem, dep.name, dep.version);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&discovery.deps)?);
        }
    }

    if let Some(err) = err {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }

    Ok(())
}
