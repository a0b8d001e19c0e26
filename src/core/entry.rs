//! Entry - Core data structure
//!
//! An entry is the fundamental unit of knowledge in pkb: a short Markdown
//! document with a structured header, stored as a file in the remote repo.
//!
//! # Key Properties
//! - **section**: til / prompt / pattern, determines the repo subtree
//! - **title**: non-empty, single line; title + section determine the file path
//! - **tags**: lowercase, deduplicated
//! - **category**: required for prompts/patterns, absent for TILs
//!
//! Entries are created once and never mutated in place; the stored file is
//! the sole durable representation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Knowledge-base section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// "Today I Learned" notes, bucketed by date
    Til,
    /// Reusable prompts, bucketed by category
    Prompt,
    /// Reusable patterns, bucketed by category
    Pattern,
}

impl Section {
    /// Repo subtree that holds this section's entries
    pub fn prefix(&self) -> &'static str {
        match self {
            Section::Til => "til/",
            Section::Prompt => "ai/prompts/",
            Section::Pattern => "patterns/",
        }
    }

    /// Whether entries in this section carry a category
    pub fn requires_category(&self) -> bool {
        !matches!(self, Section::Til)
    }

    /// All sections, in canonical order
    pub fn all() -> [Section; 3] {
        [Section::Til, Section::Prompt, Section::Pattern]
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Til => write!(f, "til"),
            Section::Prompt => write!(f, "prompt"),
            Section::Pattern => write!(f, "pattern"),
        }
    }
}

impl std::str::FromStr for Section {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "til" => Ok(Section::Til),
            "prompt" | "prompts" => Ok(Section::Prompt),
            "pattern" | "patterns" => Ok(Section::Pattern),
            _ => anyhow::bail!("Unknown section: {} (expected til, prompt or pattern)", s),
        }
    }
}

/// A knowledge-base entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Section this entry belongs to
    pub section: Section,

    /// Short descriptive title (non-empty, single line)
    pub title: String,

    /// Markdown body
    pub body: String,

    /// Tags for categorization (lowercase, deduplicated)
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Category bucket (prompts/patterns only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create a new entry timestamped now
    pub fn new(section: Section, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            section,
            title: title.into(),
            body: body.into(),
            tags: BTreeSet::new(),
            category: None,
            created_at: Utc::now(),
        }
    }

    /// Set tags (normalized)
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Normalize a tag list: lowercase, trimmed, empties dropped, deduplicated
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Result of a successful add: where the entry landed and at what revision
#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    pub path: String,
    pub version: String,
}

/// A single search hit
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub section: Section,
    pub title: String,
    /// Snippet of the body with whitespace collapsed
    pub snippet: String,
    /// Count of keyword occurrences across title, tags and body
    pub score: usize,
}

/// Listing summary - everything but the body, to bound response size
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub path: String,
    pub title: String,
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_prefix() {
        assert_eq!(Section::Til.prefix(), "til/");
        assert_eq!(Section::Prompt.prefix(), "ai/prompts/");
        assert_eq!(Section::Pattern.prefix(), "patterns/");
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("til".parse::<Section>().unwrap(), Section::Til);
        assert_eq!("prompt".parse::<Section>().unwrap(), Section::Prompt);
        assert_eq!("prompts".parse::<Section>().unwrap(), Section::Prompt);
        assert_eq!("Patterns".parse::<Section>().unwrap(), Section::Pattern);
        assert!("all".parse::<Section>().is_err());
    }

    #[test]
    fn test_section_display_roundtrip() {
        for section in Section::all() {
            assert_eq!(section.to_string().parse::<Section>().unwrap(), section);
        }
    }

    #[test]
    fn test_requires_category() {
        assert!(!Section::Til.requires_category());
        assert!(Section::Prompt.requires_category());
        assert!(Section::Pattern.requires_category());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["Testing", " CI ", "testing", ""]);
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["ci".to_string(), "testing".to_string()]
        );
    }

    #[test]
    fn test_entry_builder() {
        let entry = Entry::new(Section::Prompt, "Code Review", "Review this diff.")
            .with_tags(["Review", "coding"])
            .with_category("coding");

        assert_eq!(entry.section, Section::Prompt);
        assert_eq!(entry.category.as_deref(), Some("coding"));
        assert!(entry.tags.contains("review"));
        assert!(entry.tags.contains("coding"));
    }
}
