//! `pkb search` command
//!
//! Keyword search across the remote knowledge base.
//!
//! # Usage
//! ```bash
//! pkb search "flaky"
//! pkb search "deploy" --sections pattern,prompt
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::{Pkb, Section};
use crate::remote::GithubStore;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Keyword to search for (case-insensitive)
    pub query: String,

    /// Sections to search, comma-separated (default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub sections: Option<Vec<String>>,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let sections = match &args.sections {
        Some(names) => Some(
            names
                .iter()
                .map(|n| n.parse::<Section>())
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };

    let config = Config::load()?;
    let service = Pkb::new(GithubStore::from_config(&config.store)?);

    let outcome = service.search(&args.query, sections.as_deref()).await?;

    if outcome.results.is_empty() {
        println!("No results found for '{}'.", args.query);
    } else {
        println!(
            "Found {} result(s) for '{}':\n",
            outcome.results.len(),
            args.query
        );
        for hit in &outcome.results {
            println!(
                "{} {} ({} match(es))",
                format!("[{}]", hit.section).cyan(),
                hit.title.bold(),
                hit.score
            );
            println!("   {}", hit.path.dimmed());
            println!("   {}\n", hit.snippet);
        }
    }

    if !outcome.skipped.is_empty() {
        eprintln!(
            "{} skipped {} unreadable entr(y/ies): {}",
            "⚠".yellow(),
            outcome.skipped.len(),
            outcome.skipped.join(", ")
        );
    }

    Ok(())
}
