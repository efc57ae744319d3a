//! Per-table schema descriptor consumed by the compiler.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Immutable search metadata for one logical table.
///
/// Field names are expected lowercase. The descriptor is a plain value:
/// callers build it once at startup and pass it by reference into each
/// compile call, so concurrent compilation needs no coordination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Searchable column names.
    columns: HashSet<String>,
    /// Columns whose default match mode is "contains".
    substring_columns: HashSet<String>,
    /// Columns compared case-insensitively in exact/comparison mode.
    lowercase_columns: HashSet<String>,
    /// User-facing field name to SQL expression.
    aliases: HashMap<String, String>,
}

impl TableSchema {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the searchable columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the substring-eligible columns.
    pub fn with_substring_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.substring_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the case-insensitive columns.
    pub fn with_lowercase_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lowercase_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Maps a user-facing field name to a SQL expression.
    pub fn with_alias(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), expression.into());
        self
    }

    /// Marks an already-registered field as substring-eligible.
    pub fn add_substring_column(mut self, name: impl Into<String>) -> Self {
        self.substring_columns.insert(name.into());
        self
    }

    /// True when `name` is a known column or alias.
    pub fn is_field(&self, name: &str) -> bool {
        self.columns.contains(name) || self.aliases.contains_key(name)
    }

    /// True when `name` is a real column, alias names excluded.
    pub fn is_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// True when the field defaults to substring matching.
    pub fn is_substring(&self, name: &str) -> bool {
        self.substring_columns.contains(name)
    }

    /// True when the field compares case-insensitively.
    pub fn is_lowercase(&self, name: &str) -> bool {
        self.lowercase_columns.contains(name)
    }

    /// Resolves a field to its SQL expression, falling back to the raw name.
    pub fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.aliases.get(field).map(String::as_str).unwrap_or(field)
    }
}
