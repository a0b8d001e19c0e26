//! `pkb add` command
//!
//! Adds a new entry to the remote knowledge base.
//!
//! # Usage
//! ```bash
//! pkb add "Fixed a flaky test" "The test was timing-dependent" --tags testing,ci
//! pkb add "Code Review" --section prompt --category coding --file prompt.md
//! ```

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use std::fs;

use crate::config::Config;
use crate::core::{NewEntry, Pkb, Section};
use crate::remote::GithubStore;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Title of the entry
    pub title: String,

    /// Markdown body (omit when using --file)
    pub content: Option<String>,

    /// Section to add to: til, prompt or pattern
    #[arg(short, long, default_value = "til")]
    pub section: String,

    /// Category bucket (required for prompts and patterns)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Tags for the entry (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Read the body from a file
    #[arg(short = 'f', long)]
    pub file: Option<String>,
}

pub async fn run(args: AddArgs) -> Result<()> {
    let section: Section = args.section.parse()?;

    let body = match (&args.content, &args.file) {
        (_, Some(path)) => fs::read_to_string(path)?,
        (Some(content), None) => content.clone(),
        (None, None) => {
            bail!("Content is required. Provide it as the second argument or via --file.");
        }
    };

    let config = Config::load()?;
    let service = Pkb::new(GithubStore::from_config(&config.store)?);

    let outcome = service
        .add_entry(NewEntry {
            section,
            title: args.title.clone(),
            body,
            tags: args.tags.unwrap_or_default(),
            category: args.category,
        })
        .await?;

    println!("{} {} entry created: {}", "✓".green(), section, args.title);
    println!("   Path: {}", outcome.path);
    println!("   Revision: {}", outcome.version);

    Ok(())
}
