//! Static registry of the archive's searchable tables.
//!
//! Each logical table carries the metadata the search layer needs: the
//! SQL table name, the columns returned in result sets, the default
//! search field and sort, and the compiler-facing [`TableSchema`] with
//! its alias expressions.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use galleria_query::TableSchema;

use crate::error::StoreError;

/// The four searchable tables of an archive database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalTable {
    Submissions,
    Journals,
    Users,
    Comments,
}

impl LogicalTable {
    /// All logical tables, in registry order.
    pub const ALL: [LogicalTable; 4] = [
        LogicalTable::Submissions,
        LogicalTable::Journals,
        LogicalTable::Users,
        LogicalTable::Comments,
    ];

    /// The SQL table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalTable::Submissions => "submissions",
            LogicalTable::Journals => "journals",
            LogicalTable::Users => "users",
            LogicalTable::Comments => "comments",
        }
    }
}

impl fmt::Display for LogicalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalTable {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "submissions" => Ok(LogicalTable::Submissions),
            "journals" => Ok(LogicalTable::Journals),
            "users" => Ok(LogicalTable::Users),
            "comments" => Ok(LogicalTable::Comments),
            _ => Err(StoreError::UnknownTable {
                name: s.to_string(),
            }),
        }
    }
}

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Search metadata for one logical table.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// SQL table name.
    pub table: &'static str,
    /// Primary key column.
    pub key_column: &'static str,
    /// Columns projected into result rows.
    pub result_columns: &'static [&'static str],
    /// Field searched when a query term carries no `@field` prefix.
    pub default_field: &'static str,
    /// Column results are ordered by when the caller picks none.
    pub default_sort: &'static str,
    pub default_order: SortOrder,
    /// Sort names rewritten before execution. Submissions and journals
    /// sort "date" by the integer key, which follows upload order and
    /// indexes better than the text date column.
    sort_rewrites: &'static [(&'static str, &'static str)],
    /// Compiler-facing schema.
    pub schema: TableSchema,
}

impl TableDescriptor {
    /// Rewrites a user-facing sort name to the column actually ordered by.
    pub fn execution_sort<'a>(&self, sort: &'a str) -> &'a str {
        self.sort_rewrites
            .iter()
            .find(|(name, _)| *name == sort)
            .map(|(_, column)| *column)
            .unwrap_or(sort)
    }
}

/// Lookup table from [`LogicalTable`] to its [`TableDescriptor`].
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: HashMap<LogicalTable, TableDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        tables.insert(LogicalTable::Submissions, submissions_descriptor());
        tables.insert(LogicalTable::Journals, journals_descriptor());
        tables.insert(LogicalTable::Users, users_descriptor());
        tables.insert(LogicalTable::Comments, comments_descriptor());
        Self { tables }
    }

    pub fn descriptor(&self, table: LogicalTable) -> &TableDescriptor {
        self.tables
            .get(&table)
            .expect("every logical table is registered at construction")
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Alias expression matching usernames regardless of underscores.
const AUTHOR_EXPR: &str = "replace(author, '_', '')";

fn submissions_descriptor() -> TableDescriptor {
    let any = "(author||date||title||category||tags||species||description)";
    TableDescriptor {
        table: "submissions",
        key_column: "id",
        result_columns: &["id", "author", "date", "title", "fileext"],
        default_field: "any",
        default_sort: "date",
        default_order: SortOrder::Desc,
        sort_rewrites: &[("date", "id")],
        schema: TableSchema::new()
            .with_columns([
                "id",
                "author",
                "title",
                "date",
                "description",
                "footer",
                "tags",
                "category",
                "species",
                "gender",
                "rating",
                "type",
                "fileurl",
                "fileext",
                "filesaved",
                "favorite",
                "mentions",
                "folder",
                "userupdate",
            ])
            .with_substring_columns([
                "author",
                "title",
                "date",
                "description",
                "footer",
                "tags",
                "category",
                "species",
                "fileurl",
                "fileext",
                "favorite",
                "mentions",
                "folder",
                "keywords",
                "message",
                "filename",
                "any",
            ])
            .with_lowercase_columns([
                "author",
                "title",
                "date",
                "description",
                "footer",
                "tags",
                "category",
                "species",
                "gender",
                "rating",
                "type",
                "fileurl",
                "fileext",
                "favorite",
                "mentions",
                "folder",
                "keywords",
                "message",
                "filename",
            ])
            .with_alias("author", AUTHOR_EXPR)
            .with_alias("keywords", "tags")
            .with_alias("message", "description")
            .with_alias("filename", "fileurl")
            .with_alias("any", any),
    }
}

fn journals_descriptor() -> TableDescriptor {
    let any = "(author||date||title||content)";
    TableDescriptor {
        table: "journals",
        key_column: "id",
        result_columns: &["id", "author", "date", "title"],
        default_field: "any",
        default_sort: "date",
        default_order: SortOrder::Desc,
        sort_rewrites: &[("date", "id")],
        schema: TableSchema::new()
            .with_columns([
                "id",
                "author",
                "title",
                "date",
                "content",
                "header",
                "footer",
                "mentions",
                "userupdate",
            ])
            .with_substring_columns([
                "author", "title", "date", "content", "header", "footer", "mentions", "message",
                "any",
            ])
            .with_lowercase_columns([
                "author", "title", "date", "content", "header", "footer", "mentions", "message",
            ])
            .with_alias("author", AUTHOR_EXPR)
            .with_alias("message", "content")
            .with_alias("any", any),
    }
}

fn users_descriptor() -> TableDescriptor {
    TableDescriptor {
        table: "users",
        key_column: "username",
        result_columns: &["username", "folders", "active"],
        default_field: "username",
        default_sort: "username",
        default_order: SortOrder::Asc,
        sort_rewrites: &[],
        schema: TableSchema::new()
            .with_columns(["username", "folders", "userpage", "active"])
            .with_substring_columns(["username", "folders", "userpage", "any"])
            .with_lowercase_columns(["username", "folders"])
            .with_alias("username", "lower(username)")
            .with_alias("folders", "lower(folders)")
            .with_alias("any", "(username||userpage)"),
    }
}

fn comments_descriptor() -> TableDescriptor {
    TableDescriptor {
        table: "comments",
        key_column: "id",
        result_columns: &[
            "id",
            "parent_table",
            "parent_id",
            "reply_to",
            "author",
            "date",
            "text",
        ],
        default_field: "any",
        default_sort: "date",
        default_order: SortOrder::Desc,
        sort_rewrites: &[],
        schema: TableSchema::new()
            .with_columns([
                "id",
                "parent_table",
                "parent_id",
                "reply_to",
                "author",
                "date",
                "text",
            ])
            .with_substring_columns(["author", "date", "text", "message", "any"])
            .with_lowercase_columns(["parent_table", "author", "date", "text", "message"])
            .with_alias("author", AUTHOR_EXPR)
            .with_alias("message", "text")
            .with_alias("any", "(author||text)"),
    }
}
