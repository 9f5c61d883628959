use anyhow::{bail, Result};
use std::fmt::Write as _;
use std::path::Path;

use crate::config::{LaunchOptions, RunConfiguration};
use crate::server::start_server;
use crate::stats::Stats;

/// Validate the launch options and run the server until shutdown.
pub async fn handle_serve(options: LaunchOptions) -> Result<()> {
    let config = RunConfiguration::resolve(options)?;
    start_server(config).await
}

pub fn handle_stats(input: &Path, verbose: bool) -> Result<()> {
    if !input.exists() {
        bail!("{} does not exist", input.display());
    }

    let stats = Stats::collect(input);
    print!("{}", format_stats(&stats, verbose));
    Ok(())
}

/// Plain-text summary; `verbose` adds the per-type entity listing.
pub fn format_stats(stats: &Stats, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Documents", stats.num_files);
    let _ = writeln!(out, "{} Tokens", stats.num_tokens);
    let _ = writeln!(out, "{} Tagged Tokens", stats.num_tagged_tokens);
    let _ = writeln!(out, "{} Entity Tags", stats.num_entities);
    let _ = writeln!(out, "{} Unique Entity Tags", stats.num_unique_entities);
    for (kind, entity) in &stats.entities {
        let _ = writeln!(out, "{}: {} Entities", kind, entity.num_entities);
        let _ = writeln!(out, "{}: {} Unique Entities", kind, entity.num_unique_entities);
    }

    if verbose {
        let _ = writeln!(out, "{}", "-".repeat(33));
        for (kind, entity) in &stats.entities {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", kind);
            let _ = writeln!(out, "{}", "-".repeat(19));
            for (name, count) in entity.most_common() {
                let _ = writeln!(out, "{}\t{}", name, count);
            }
        }
    }
    out
}
