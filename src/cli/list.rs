//! `pkb list` command
//!
//! Lists a section's entries, newest first.
//!
//! # Usage
//! ```bash
//! pkb list til
//! pkb list prompt --category coding
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::{Pkb, Section};
use crate::remote::GithubStore;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Section to list: til, prompt or pattern
    pub section: String,

    /// Category filter (prompts/patterns only)
    #[arg(short, long)]
    pub category: Option<String>,
}

pub async fn run(args: ListArgs) -> Result<()> {
    let section: Section = args.section.parse()?;

    let config = Config::load()?;
    let service = Pkb::new(GithubStore::from_config(&config.store)?);

    let outcome = service
        .list_entries(section, args.category.as_deref())
        .await?;

    if outcome.entries.is_empty() {
        println!("No entries yet in section '{}'.", section);
    } else {
        println!("{} entr(y/ies) in '{}':\n", outcome.entries.len(), section);
        for entry in &outcome.entries {
            print!(
                "{}  {}",
                entry.created_at.format("%Y-%m-%d").to_string().dimmed(),
                entry.title.bold()
            );
            if let Some(category) = &entry.category {
                print!(" {}", format!("[{}]", category).cyan());
            }
            if !entry.tags.is_empty() {
                let tags: Vec<&str> = entry.tags.iter().map(|t| t.as_str()).collect();
                print!(" {}", format!("#{}", tags.join(" #")).dimmed());
            }
            println!();
            println!("            {}", entry.path.dimmed());
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
