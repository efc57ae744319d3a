//! End-to-end search tests over seeded SQLite databases.

use std::time::Duration;

use rusqlite::{params, Connection};
use serde_json::Value;

use galleria_store::{
    LogicalTable, SearchRequest, SearchResults, SortOrder, Store, StoreError,
};

const SUBMISSIONS_DDL: &str = "
    create table submissions (
        id integer primary key,
        author text not null default '',
        title text not null default '',
        date text not null default '',
        description text not null default '',
        footer text not null default '',
        tags text not null default '',
        category text not null default '',
        species text not null default '',
        gender text not null default '',
        rating text not null default '',
        type text not null default '',
        fileurl text not null default '',
        fileext text not null default '',
        filesaved integer not null default 0,
        favorite text not null default '',
        mentions text not null default '',
        folder text not null default '',
        userupdate integer not null default 0
    );
";

const USERS_DDL: &str = "
    create table users (
        username text primary key,
        folders text not null default '',
        userpage text not null default '',
        active integer not null default 1
    );
";

#[allow(clippy::too_many_arguments)]
fn insert_submission(
    conn: &Connection,
    id: i64,
    author: &str,
    title: &str,
    date: &str,
    tags: &str,
    description: &str,
    fileext: &str,
) {
    conn.execute(
        "insert into submissions (id, author, title, date, tags, description, fileext)
         values (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, author, title, date, tags, description, fileext],
    )
    .unwrap();
}

fn seed_submissions(conn: &Connection) {
    conn.execute_batch(SUBMISSIONS_DDL).unwrap();
    insert_submission(
        conn,
        1,
        "Night_Owl",
        "Dragon at Dawn",
        "2024-01-05",
        "|dragon|cave|",
        "A dragon guarding its cave",
        "png",
    );
    insert_submission(
        conn,
        2,
        "Rook",
        "Cave Study",
        "2024-02-10",
        "|cave|",
        "Charcoal cave sketches",
        "jpg",
    );
    insert_submission(
        conn,
        3,
        "Night_Owl",
        "Harbor Lights",
        "2023-12-01",
        "|city|",
        "Evening harbor scene",
        "png",
    );
}

fn seeded_store() -> Store {
    let store = Store::in_memory().unwrap();
    seed_submissions(&store.connection());
    store
}

fn ids(results: &SearchResults) -> Vec<i64> {
    results
        .rows
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Plain searches
// ============================================================================

#[test]
fn test_empty_query_returns_all_rows_newest_first() {
    let store = seeded_store();
    let results = store
        .search(LogicalTable::Submissions, &SearchRequest::new(""))
        .unwrap();
    // Default date sort runs on the integer key.
    assert_eq!(ids(&results), vec![3, 2, 1]);
    assert_eq!(results.sort, "date");
    assert_eq!(results.order, SortOrder::Desc);
}

#[test]
fn test_field_scoped_substring_search() {
    let store = seeded_store();
    let results = store
        .search(LogicalTable::Submissions, &SearchRequest::new("@title dragon"))
        .unwrap();
    assert_eq!(ids(&results), vec![1]);
}

#[test]
fn test_unscoped_terms_search_across_columns() {
    let store = seeded_store();
    let results = store
        .search(LogicalTable::Submissions, &SearchRequest::new("cave"))
        .unwrap();
    // Row 1 matches on tags and description, row 2 on the title too.
    assert_eq!(ids(&results), vec![2, 1]);
}

#[test]
fn test_author_exact_match_ignores_underscores_and_case() {
    let store = seeded_store();
    let results = store
        .search(
            LogicalTable::Submissions,
            &SearchRequest::new("@author == nightowl"),
        )
        .unwrap();
    assert_eq!(ids(&results), vec![3, 1]);
}

#[test]
fn test_date_range_comparison() {
    let store = seeded_store();
    let results = store
        .search(
            LogicalTable::Submissions,
            &SearchRequest::new("@date >= 2024-01-01"),
        )
        .unwrap();
    assert_eq!(ids(&results), vec![2, 1]);
}

#[test]
fn test_malformed_query_surfaces_compile_error() {
    let store = seeded_store();
    let err = store
        .search(LogicalTable::Submissions, &SearchRequest::new("(dragon"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Query(_)));
}

// ============================================================================
// Sorting and limits
// ============================================================================

#[test]
fn test_explicit_column_sort() {
    let store = seeded_store();
    let request = SearchRequest::new("")
        .with_sort("title")
        .with_order(SortOrder::Asc);
    let results = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(ids(&results), vec![2, 1, 3]);
    assert_eq!(results.sort, "title");
}

#[test]
fn test_unknown_sort_falls_back_to_default() {
    let store = seeded_store();
    let request = SearchRequest::new("").with_sort("keywords");
    let results = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(results.sort, "date");
    assert_eq!(ids(&results), vec![3, 2, 1]);
}

#[test]
fn test_request_limit_caps_rows() {
    let store = seeded_store();
    let request = SearchRequest::new("").with_limit(2);
    let results = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(ids(&results), vec![3, 2]);
}

#[test]
fn test_store_max_results_applies_when_request_has_no_limit() {
    let store = Store::in_memory().unwrap().with_max_results(1);
    seed_submissions(&store.connection());
    let results = store
        .search(LogicalTable::Submissions, &SearchRequest::new(""))
        .unwrap();
    assert_eq!(ids(&results), vec![3]);

    let request = SearchRequest::new("").with_limit(3);
    let results = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(results.rows.len(), 3);
}

// ============================================================================
// Relevance ranking
// ============================================================================

#[test]
fn test_relevance_ranks_by_clause_hits() {
    let store = seeded_store();
    let request = SearchRequest::new("dragon | cave").with_sort("relevance");
    let results = store.search(LogicalTable::Submissions, &request).unwrap();

    // Row 1 matches both terms, row 2 only one, row 3 neither.
    assert_eq!(ids(&results), vec![1, 2]);
    assert_eq!(results.columns.last().map(String::as_str), Some("relevance"));
    assert_eq!(results.rows[0]["relevance"], Value::from(2));
    assert_eq!(results.rows[1]["relevance"], Value::from(1));
}

#[test]
fn test_relevance_with_empty_query_keeps_every_row() {
    let store = seeded_store();
    let request = SearchRequest::new("").with_sort("relevance");
    let results = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(results.rows.len(), 3);
    for row in &results.rows {
        assert_eq!(row["relevance"], Value::from(1));
    }
    // Ties fall back to the default date sort.
    assert_eq!(ids(&results), vec![3, 2, 1]);
}

// ============================================================================
// Users table
// ============================================================================

#[test]
fn test_users_search_and_default_sort() {
    let store = Store::in_memory().unwrap();
    {
        let conn = store.connection();
        conn.execute_batch(USERS_DDL).unwrap();
        conn.execute(
            "insert into users (username, folders) values
             ('nightowl', '|gallery|scraps|'),
             ('rook', '|gallery|')",
            [],
        )
        .unwrap();
    }

    let results = store
        .search(LogicalTable::Users, &SearchRequest::new(""))
        .unwrap();
    let names: Vec<&str> = results
        .rows
        .iter()
        .map(|row| row["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["nightowl", "rook"]);
    assert_eq!(results.sort, "username");
    assert_eq!(results.order, SortOrder::Asc);

    let results = store
        .search(LogicalTable::Users, &SearchRequest::new("@folders scraps"))
        .unwrap();
    assert_eq!(results.rows.len(), 1);
    assert_eq!(results.rows[0]["username"], Value::from("nightowl"));
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn test_repeated_search_hits_cache() {
    let store = seeded_store();
    let request = SearchRequest::new("@title dragon");
    let first = store.search(LogicalTable::Submissions, &request).unwrap();
    let second = store.search(LogicalTable::Submissions, &request).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    store.invalidate();
    let third = store.search(LogicalTable::Submissions, &request).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third);
}

#[test]
fn test_differing_limits_do_not_share_cache_entries() {
    let store = seeded_store();
    let all = store
        .search(LogicalTable::Submissions, &SearchRequest::new(""))
        .unwrap();
    let capped = store
        .search(LogicalTable::Submissions, &SearchRequest::new("").with_limit(1))
        .unwrap();
    assert_eq!(all.rows.len(), 3);
    assert_eq!(capped.rows.len(), 1);
}

#[test]
fn test_file_change_drops_cached_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SUBMISSIONS_DDL).unwrap();
        insert_submission(
            &conn,
            1,
            "Rook",
            "Cave Study",
            "2024-02-10",
            "|cave|",
            "Charcoal cave sketches",
            "jpg",
        );
    }

    let store = Store::open(&path).unwrap();
    let request = SearchRequest::new("cave");
    let before = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(before.rows.len(), 1);

    // Another process appends a row, moving the file's mtime forward.
    std::thread::sleep(Duration::from_millis(50));
    {
        let conn = Connection::open(&path).unwrap();
        insert_submission(
            &conn,
            2,
            "Night_Owl",
            "Cave Lights",
            "2024-03-01",
            "|cave|",
            "Lantern study",
            "png",
        );
    }

    let after = store.search(LogicalTable::Submissions, &request).unwrap();
    assert_eq!(after.rows.len(), 2);
}

#[test]
fn test_open_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Store::open(dir.path().join("missing.db")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
