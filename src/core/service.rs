//! Knowledge-base service
//!
//! Orchestrates the path scheme, codec and remote store into the three
//! operations the tool surface exposes: add, search, list. Stateless - every
//! call re-derives truth from the remote tree, so there is no cache to
//! invalidate and nothing to persist between invocations.
//!
//! Search is a full scan: list, fetch, decode, count occurrences. That is a
//! deliberate scalability ceiling - a personal knowledge base holds hundreds
//! to low thousands of entries, which one scan handles fine without a
//! persisted index.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::{PkbError, Result};
use crate::remote::RemoteStore;

use super::codec;
use super::entry::{
    normalize_tags, AddOutcome, Entry, EntrySummary, SearchResult, Section,
};
use super::path::{commit_message, disambiguate, resolve_path, slugify};

const TIL_INDEX: &str = "til/index.md";
const SNIPPET_CHARS: usize = 200;

/// Request to create a new entry
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub section: Section,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
}

/// Search response: hits plus any paths that had to be skipped
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// Paths that existed in the listing but could not be read or decoded
    pub skipped: Vec<String>,
}

/// Listing response: summaries newest-first, plus skipped paths
#[derive(Debug, Default)]
pub struct ListOutcome {
    pub entries: Vec<EntrySummary>,
    pub skipped: Vec<String>,
}

/// The knowledge-base service
pub struct Pkb<S: RemoteStore> {
    store: S,
}

impl<S: RemoteStore> Pkb<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a new entry with create-only write semantics
    ///
    /// Path disambiguation runs against a tree listing fetched just before
    /// the write, so a concurrent writer can still take the path first; the
    /// write then fails with `Conflict` and the caller retries the whole
    /// add, which re-resolves against the updated tree.
    pub async fn add_entry(&self, req: NewEntry) -> Result<AddOutcome> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(PkbError::validation("title", "must not be empty"));
        }
        if title.contains('\n') {
            return Err(PkbError::validation("title", "must be a single line"));
        }
        if req.body.trim().is_empty() {
            return Err(PkbError::validation("body", "must not be empty"));
        }

        let category = match (req.section.requires_category(), req.category.as_deref()) {
            (true, Some(c)) if !c.trim().is_empty() => Some(c.trim().to_lowercase()),
            (true, _) => {
                return Err(PkbError::validation(
                    "category",
                    format!("required for {} entries", req.section),
                ))
            }
            (false, Some(c)) if !c.trim().is_empty() => {
                return Err(PkbError::validation(
                    "category",
                    "not applicable to til entries",
                ))
            }
            (false, _) => None,
        };

        let created_at = Utc::now();
        let base = resolve_path(req.section, category.as_deref(), title, created_at)?;

        let existing: HashSet<String> = self
            .store
            .list_tree(req.section.prefix())
            .await?
            .into_iter()
            .collect();
        let path = disambiguate(&base, &existing);

        let entry = Entry {
            section: req.section,
            title: title.to_string(),
            body: req.body,
            tags: normalize_tags(&req.tags),
            category: category.clone(),
            created_at,
        };

        let document = codec::encode(&entry);
        let message = commit_message(req.section, title, category.as_deref());
        let version = self.store.put(&path, &document, &message, None).await?;
        tracing::info!(path = %path, version = %version, "entry created");

        if req.section == Section::Til {
            self.update_til_index(&entry, &path).await;
        }

        Ok(AddOutcome { path, version })
    }

    /// Keyword search across sections (default: all)
    ///
    /// Scores by counting case-insensitive occurrences of the query across
    /// title, tags and body; zero-score entries are excluded. Results sort
    /// by score descending, then path ascending, deterministically.
    pub async fn search(
        &self,
        query: &str,
        sections: Option<&[Section]>,
    ) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PkbError::validation("query", "must not be empty"));
        }
        let needle = query.to_lowercase();

        let sections = match sections {
            Some(s) if !s.is_empty() => s.to_vec(),
            _ => Section::all().to_vec(),
        };

        let mut outcome = SearchOutcome::default();
        for section in sections {
            for (path, entry) in self
                .scan(section, section.prefix(), &mut outcome.skipped)
                .await?
            {
                let score = score_entry(&entry, &needle);
                if score == 0 {
                    continue;
                }
                outcome.results.push(SearchResult {
                    path,
                    section: entry.section,
                    title: entry.title,
                    snippet: snippet(&entry.body),
                    score,
                });
            }
        }

        outcome
            .results
            .sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
        Ok(outcome)
    }

    /// List a section's entries, newest first, without bodies
    ///
    /// For prompts/patterns a category narrows the listing to that bucket;
    /// TILs carry no category.
    pub async fn list_entries(
        &self,
        section: Section,
        category: Option<&str>,
    ) -> Result<ListOutcome> {
        let prefix = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) if section.requires_category() => {
                format!("{}{}/", section.prefix(), slugify(c))
            }
            Some(_) => {
                return Err(PkbError::validation(
                    "category",
                    "not applicable to til entries",
                ))
            }
            None => section.prefix().to_string(),
        };

        let mut outcome = ListOutcome::default();
        for (path, entry) in self.scan(section, &prefix, &mut outcome.skipped).await? {
            outcome.entries.push(EntrySummary {
                path,
                title: entry.title,
                tags: entry.tags,
                category: entry.category,
                created_at: entry.created_at,
            });
        }

        outcome.entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(outcome)
    }

    /// List + fetch + decode everything under a prefix, isolating per-entry
    /// failures into `skipped`
    async fn scan(
        &self,
        section: Section,
        prefix: &str,
        skipped: &mut Vec<String>,
    ) -> Result<Vec<(String, Entry)>> {
        let mut found = Vec::new();
        for path in self.store.list_tree(prefix).await? {
            if !path.ends_with(".md") || is_index(&path) {
                continue;
            }
            match self.fetch_entry(&path, section).await {
                Ok(entry) => found.push((path, entry)),
                Err(e) if e.is_skippable() => {
                    tracing::warn!(path = %path, error = %e, "skipping unreadable entry");
                    skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    async fn fetch_entry(&self, path: &str, section: Section) -> Result<Entry> {
        let file = self.store.get(path).await?;
        codec::decode(&file.content, section).map_err(|e| PkbError::MalformedEntry {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Append a link line to til/index.md, best effort
    ///
    /// The index is derived data; a failure here is logged and never fails
    /// the add that already landed.
    async fn update_til_index(&self, entry: &Entry, entry_path: &str) {
        if let Err(e) = self.try_update_til_index(entry, entry_path).await {
            tracing::warn!(error = %e, "failed to update {}", TIL_INDEX);
        }
    }

    async fn try_update_til_index(&self, entry: &Entry, entry_path: &str) -> Result<()> {
        let target = entry_path.strip_prefix("til/").unwrap_or(entry_path);
        let line = format!(
            "- [{}]({}) ({})\n",
            entry.title,
            target,
            entry.created_at.format("%Y-%m-%d")
        );
        let message = format!("Update TIL index: add {}", entry.title);

        match self.store.get(TIL_INDEX).await {
            Ok(index) => {
                let updated = format!("{}\n{}", index.content.trim_end_matches('\n'), line);
                self.store
                    .put(TIL_INDEX, &updated, &message, Some(&index.version))
                    .await?;
            }
            Err(PkbError::NotFound { .. }) => {
                let content = format!("# TIL Index\n\n{}", line);
                self.store.put(TIL_INDEX, &content, &message, None).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Keyword occurrences across title, tags and body
fn score_entry(entry: &Entry, needle: &str) -> usize {
    let mut score = count_occurrences(&entry.title, needle);
    for tag in &entry.tags {
        score += count_occurrences(tag, needle);
    }
    score + count_occurrences(&entry.body, needle)
}

/// Case-insensitive, non-overlapping substring count
fn count_occurrences(haystack: &str, needle_lower: &str) -> usize {
    if needle_lower.is_empty() {
        return 0;
    }
    let hay = haystack.to_lowercase();
    let mut count = 0;
    let mut idx = 0;
    while let Some(pos) = hay[idx..].find(needle_lower) {
        count += 1;
        idx += pos + needle_lower.len();
    }
    count
}

/// Index files are derived data, not entries
fn is_index(path: &str) -> bool {
    path == "index.md" || path.ends_with("/index.md")
}

/// First part of the body with whitespace collapsed
fn snippet(body: &str) -> String {
    let flat: Vec<&str> = body.split_whitespace().collect();
    let flat = flat.join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        flat
    } else {
        let truncated: String = flat.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", truncated.trim_end())
    }
}
