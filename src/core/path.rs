//! Path scheme - mapping entries to repo file paths
//!
//! Pure functions, deterministic for identical inputs:
//!
//! - TILs are bucketed by date: `til/<year>/<month>/<slug>.md`
//! - Prompts by category: `ai/prompts/<category>/<slug>.md`
//! - Patterns by category: `patterns/<category>/<slug>.md`
//!
//! If a resolved path is already taken, `disambiguate` appends a numeric
//! suffix (`-2`, `-3`, ...) until a free path is found. The check runs
//! against a tree listing fetched moments earlier, so a concurrent writer
//! can still race us; the create-only write turns that race into a
//! `Conflict` instead of an overwrite.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};

use crate::error::{PkbError, Result};

use super::entry::Section;

/// Slugify a title: lowercase, non-alphanumeric runs collapsed to a single `-`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    slug
}

/// Compute the canonical path for an entry
///
/// Deterministic given identical inputs. Fails with `Validation` if the
/// title slugifies to nothing, or if the category is missing/empty for a
/// section that buckets by category.
pub fn resolve_path(
    section: Section,
    category: Option<&str>,
    title: &str,
    created_at: DateTime<Utc>,
) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(PkbError::validation(
            "title",
            format!("'{}' contains no usable characters", title),
        ));
    }

    match section {
        Section::Til => Ok(format!(
            "til/{:04}/{:02}/{}.md",
            created_at.year(),
            created_at.month(),
            slug
        )),
        Section::Prompt | Section::Pattern => {
            let category = slugify(category.unwrap_or_default());
            if category.is_empty() {
                return Err(PkbError::validation(
                    "category",
                    format!("required for {} entries", section),
                ));
            }
            Ok(format!("{}{}/{}.md", section.prefix(), category, slug))
        }
    }
}

/// Find a free variant of `base` against a snapshot of existing paths
///
/// Returns `base` itself if free, otherwise `base-2`, `base-3`, ... with the
/// suffix inserted before the `.md` extension.
pub fn disambiguate(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }

    let stem = base.strip_suffix(".md").unwrap_or(base);
    let mut n = 2u32;
    loop {
        let candidate = format!("{}-{}.md", stem, n);
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Human-readable commit message for the backing store revision
pub fn commit_message(section: Section, title: &str, category: Option<&str>) -> String {
    match (section, category) {
        (Section::Til, _) => format!("Add TIL: {}", title),
        (Section::Prompt, Some(c)) => format!("Add prompt: {} ({})", title, c),
        (Section::Prompt, None) => format!("Add prompt: {}", title),
        (Section::Pattern, Some(c)) => format!("Add pattern: {} ({})", title, c),
        (Section::Pattern, None) => format!("Add pattern: {}", title),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Fixed a flaky test"), "fixed-a-flaky-test");
        assert_eq!(slugify("Rust's ?-operator!"), "rust-s-operator");
        assert_eq!(slugify("  --- trimmed ---  "), "trimmed");
        assert_eq!(slugify("CamelCase123"), "camelcase123");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_til_path_buckets_by_date() {
        let path = resolve_path(Section::Til, None, "Fixed a flaky test", ts()).unwrap();
        assert_eq!(path, "til/2024/03/fixed-a-flaky-test.md");
    }

    #[test]
    fn test_prompt_path_buckets_by_category() {
        let path = resolve_path(Section::Prompt, Some("coding"), "Code Review", ts()).unwrap();
        assert_eq!(path, "ai/prompts/coding/code-review.md");
    }

    #[test]
    fn test_pattern_path_buckets_by_category() {
        let path = resolve_path(Section::Pattern, Some("DevOps"), "Blue Green", ts()).unwrap();
        assert_eq!(path, "patterns/devops/blue-green.md");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let a = resolve_path(Section::Til, None, "Same Title", ts()).unwrap();
        let b = resolve_path(Section::Til, None, "Same Title", ts()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_category_rejected() {
        let err = resolve_path(Section::Prompt, None, "Title", ts()).unwrap_err();
        assert!(matches!(
            err,
            PkbError::Validation {
                field: "category",
                ..
            }
        ));
    }

    #[test]
    fn test_unusable_title_rejected() {
        let err = resolve_path(Section::Til, None, "???", ts()).unwrap_err();
        assert!(matches!(err, PkbError::Validation { field: "title", .. }));
    }

    #[test]
    fn test_disambiguate_free_path() {
        let existing = HashSet::new();
        assert_eq!(disambiguate("til/2024/03/x.md", &existing), "til/2024/03/x.md");
    }

    #[test]
    fn test_disambiguate_appends_suffix() {
        let mut existing = HashSet::new();
        existing.insert("til/2024/03/x.md".to_string());
        assert_eq!(disambiguate("til/2024/03/x.md", &existing), "til/2024/03/x-2.md");

        existing.insert("til/2024/03/x-2.md".to_string());
        assert_eq!(disambiguate("til/2024/03/x.md", &existing), "til/2024/03/x-3.md");
    }

    #[test]
    fn test_commit_messages() {
        assert_eq!(
            commit_message(Section::Til, "Fixed a flaky test", None),
            "Add TIL: Fixed a flaky test"
        );
        assert_eq!(
            commit_message(Section::Prompt, "Code Review", Some("coding")),
            "Add prompt: Code Review (coding)"
        );
        assert_eq!(
            commit_message(Section::Pattern, "Blue Green", Some("devops")),
            "Add pattern: Blue Green (devops)"
        );
    }
}
