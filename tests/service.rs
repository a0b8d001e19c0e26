//! End-to-end service tests against the in-memory store

use chrono::{Datelike, TimeZone, Utc};

use pkb::core::codec;
use pkb::core::Entry;
use pkb::error::PkbError;
use pkb::{MemoryStore, NewEntry, Pkb, RemoteStore, Section};

fn service() -> Pkb<MemoryStore> {
    Pkb::new(MemoryStore::new())
}

fn til(title: &str, body: &str, tags: &[&str]) -> NewEntry {
    NewEntry {
        section: Section::Til,
        title: title.to_string(),
        body: body.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category: None,
    }
}

fn prompt(title: &str, body: &str, category: &str) -> NewEntry {
    NewEntry {
        section: Section::Prompt,
        title: title.to_string(),
        body: body.to_string(),
        tags: vec![],
        category: Some(category.to_string()),
    }
}

/// Seed a store directly with an encoded entry at a fixed timestamp
async fn seed(store: &MemoryStore, path: &str, entry: &Entry) {
    store
        .put(path, &codec::encode(entry), "seed", None)
        .await
        .unwrap();
}

fn entry_at(section: Section, title: &str, body: &str, y: i32, m: u32, d: u32) -> Entry {
    Entry {
        created_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ..Entry::new(section, title, body)
    }
}

#[tokio::test]
async fn add_til_lands_in_date_bucket() {
    let pkb = service();
    let outcome = pkb
        .add_entry(til(
            "Fixed a flaky test",
            "The test was timing-dependent.",
            &["testing", "ci"],
        ))
        .await
        .unwrap();

    let now = Utc::now();
    assert_eq!(
        outcome.path,
        format!(
            "til/{:04}/{:02}/fixed-a-flaky-test.md",
            now.year(),
            now.month()
        )
    );
    assert!(!outcome.version.is_empty());
}

#[tokio::test]
async fn duplicate_title_gets_numeric_suffix() {
    let pkb = service();
    let first = pkb
        .add_entry(til("Fixed a flaky test", "body one", &[]))
        .await
        .unwrap();
    let second = pkb
        .add_entry(til("Fixed a flaky test", "body two", &[]))
        .await
        .unwrap();
    let third = pkb
        .add_entry(til("Fixed a flaky test", "body three", &[]))
        .await
        .unwrap();

    assert!(first.path.ends_with("/fixed-a-flaky-test.md"));
    assert_eq!(second.path, first.path.replace(".md", "-2.md"));
    assert_eq!(third.path, first.path.replace(".md", "-3.md"));
}

#[tokio::test]
async fn search_finds_added_entry() {
    let pkb = service();
    let added = pkb
        .add_entry(til(
            "Fixed a flaky test",
            "The test was timing-dependent.",
            &["testing", "ci"],
        ))
        .await
        .unwrap();

    let outcome = pkb.search("flaky", None).await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].path, added.path);
    assert!(outcome.results[0].score >= 1);
    assert!(outcome.skipped.is_empty());
}

#[tokio::test]
async fn search_matches_title_tags_and_body() {
    let pkb = service();
    pkb.add_entry(til("Tagged only", "nothing relevant here", &["flaky"]))
        .await
        .unwrap();
    pkb.add_entry(til("Body only", "the flaky flaky behavior", &[]))
        .await
        .unwrap();
    pkb.add_entry(til("Unrelated", "nothing to see", &[]))
        .await
        .unwrap();

    let outcome = pkb.search("FLAKY", None).await.unwrap();
    assert_eq!(outcome.results.len(), 2);
    // Two body occurrences outrank one tag occurrence
    assert!(outcome.results[0].path.contains("body-only"));
    assert_eq!(outcome.results[0].score, 2);
    assert!(outcome.results[1].path.contains("tagged-only"));
    assert_eq!(outcome.results[1].score, 1);
}

#[tokio::test]
async fn search_ties_break_by_path() {
    let pkb = service();
    // Same score, different paths
    pkb.add_entry(til("Zebra note", "flaky", &[])).await.unwrap();
    pkb.add_entry(til("Alpha note", "flaky", &[])).await.unwrap();

    let outcome = pkb.search("flaky", None).await.unwrap();
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results[0].path < outcome.results[1].path);
}

#[tokio::test]
async fn search_respects_section_filter() {
    let pkb = service();
    pkb.add_entry(til("Deploy note", "deploy tips", &[]))
        .await
        .unwrap();
    pkb.add_entry(prompt("Deploy prompt", "how to deploy", "devops"))
        .await
        .unwrap();

    let outcome = pkb
        .search("deploy", Some(&[Section::Prompt]))
        .await
        .unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].section, Section::Prompt);
}

#[tokio::test]
async fn list_prompts_filters_by_category_newest_first() {
    let store = MemoryStore::new();
    seed(
        &store,
        "ai/prompts/coding/older.md",
        &entry_at(Section::Prompt, "Older", "x", 2024, 1, 10).with_category("coding"),
    )
    .await;
    seed(
        &store,
        "ai/prompts/coding/newer.md",
        &entry_at(Section::Prompt, "Newer", "x", 2024, 5, 10).with_category("coding"),
    )
    .await;
    seed(
        &store,
        "ai/prompts/docs/other.md",
        &entry_at(Section::Prompt, "Other", "x", 2024, 6, 1).with_category("docs"),
    )
    .await;

    let pkb = Pkb::new(store);
    let outcome = pkb
        .list_entries(Section::Prompt, Some("coding"))
        .await
        .unwrap();

    let titles: Vec<&str> = outcome.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.category.as_deref() == Some("coding")));
}

#[tokio::test]
async fn malformed_file_is_skipped_and_noted() {
    let store = MemoryStore::new();
    store
        .put("til/2024/03/broken.md", "no header at all", "seed", None)
        .await
        .unwrap();
    seed(
        &store,
        "til/2024/03/good.md",
        &entry_at(Section::Til, "Good note", "flaky details", 2024, 3, 15),
    )
    .await;

    let pkb = Pkb::new(store);

    let searched = pkb.search("flaky", None).await.unwrap();
    assert_eq!(searched.results.len(), 1);
    assert_eq!(searched.skipped, vec!["til/2024/03/broken.md"]);

    let listed = pkb.list_entries(Section::Til, None).await.unwrap();
    assert_eq!(listed.entries.len(), 1);
    assert_eq!(listed.skipped, vec!["til/2024/03/broken.md"]);
}

#[tokio::test]
async fn til_index_is_maintained_but_never_listed() {
    let pkb = service();
    pkb.add_entry(til("First note", "body", &[])).await.unwrap();
    pkb.add_entry(til("Second note", "body", &[]))
        .await
        .unwrap();

    let listed = pkb.list_entries(Section::Til, None).await.unwrap();
    assert_eq!(listed.entries.len(), 2);
    assert!(listed.skipped.is_empty());
}

#[tokio::test]
async fn add_survives_preexisting_til_index() {
    let store = MemoryStore::new();
    store
        .put("til/index.md", "# TIL Index\n", "seed", None)
        .await
        .unwrap();

    let pkb = Pkb::new(store);
    pkb.add_entry(til("A note", "body", &[])).await.unwrap();

    // Listing still only shows the real entry
    let listed = pkb.list_entries(Section::Til, None).await.unwrap();
    assert_eq!(listed.entries.len(), 1);
}

#[tokio::test]
async fn stored_entry_round_trips_through_the_store() {
    let pkb = Pkb::new(MemoryStore::new());
    let outcome = pkb
        .add_entry(prompt("Code Review", "Review this diff carefully.", "Coding"))
        .await
        .unwrap();
    assert_eq!(outcome.path, "ai/prompts/coding/code-review.md");

    let listed = pkb.list_entries(Section::Prompt, None).await.unwrap();
    assert_eq!(listed.entries.len(), 1);
    assert_eq!(listed.entries[0].title, "Code Review");
    assert_eq!(listed.entries[0].category.as_deref(), Some("coding"));
}

#[tokio::test]
async fn conflicting_create_surfaces_conflict() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let taken = format!("til/{:04}/{:02}/race.md", now.year(), now.month());

    let pkb = Pkb::new(store);
    let outcome = pkb.add_entry(til("Race", "first writer", &[])).await.unwrap();
    assert_eq!(outcome.path, taken);

    // Second add with the same title re-resolves to the -2 variant instead
    // of conflicting; the conflict path needs the store to change between
    // the listing and the write, which MemoryStore can't do mid-call. The
    // store-level guarantee is covered by its own tests; here we assert the
    // retry contract: a fresh add never reuses the taken path.
    let retry = pkb.add_entry(til("Race", "second writer", &[])).await.unwrap();
    assert_ne!(retry.path, taken);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let pkb = service();

    let err = pkb.add_entry(til("", "body", &[])).await.unwrap_err();
    assert!(matches!(err, PkbError::Validation { field: "title", .. }));

    let err = pkb
        .add_entry(NewEntry {
            section: Section::Pattern,
            title: "T".to_string(),
            body: "b".to_string(),
            tags: vec![],
            category: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PkbError::Validation {
            field: "category",
            ..
        }
    ));
}
