//! Search execution against an open SQLite connection.
//!
//! This module turns a [`SearchRequest`] into a single SELECT. Plain
//! searches splice the compiled fragment into a WHERE clause; relevance
//! searches project the fragment as an arithmetic score column and order
//! by it, breaking ties on the table's default sort.

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use galleria_query::compile_query;

use crate::error::StoreResult;
use crate::registry::{SortOrder, TableDescriptor};

/// Sort name selecting relevance-ranked results.
pub const RELEVANCE_SORT: &str = "relevance";

/// One search over a logical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query string in the search mini-language. May be empty.
    pub query: String,
    /// Column to order by, or [`RELEVANCE_SORT`]. Unknown names fall
    /// back to the table default.
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    /// Row cap. `None` returns everything.
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Rows and the ordering that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub rows: Vec<Map<String, Value>>,
    /// Column names in projection order.
    pub columns: Vec<String>,
    /// The sort actually applied, after fallback.
    pub sort: String,
    pub order: SortOrder,
}

/// Lowercases and trims a raw query for compilation and cache keying.
pub(crate) fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Resolves the requested sort, falling back to the table default for
/// names that are neither `relevance` nor a real column.
pub(crate) fn normalize_sort(descriptor: &TableDescriptor, sort: Option<&str>) -> String {
    match sort.map(str::to_lowercase) {
        Some(sort) if sort == RELEVANCE_SORT || descriptor.schema.is_column(&sort) => sort,
        _ => descriptor.default_sort.to_string(),
    }
}

/// Runs one search. `request.query` must already be normalized.
pub(crate) fn execute_search(
    conn: &Connection,
    descriptor: &TableDescriptor,
    request: &SearchRequest,
) -> StoreResult<SearchResults> {
    let sort = normalize_sort(descriptor, request.sort.as_deref());
    let order = request.order.unwrap_or(descriptor.default_order);
    let scoring = sort == RELEVANCE_SORT;

    let fragment = compile_query(&request.query, descriptor.default_field, &descriptor.schema, scoring)?;

    let mut columns: Vec<String> = descriptor
        .result_columns
        .iter()
        .map(|c| c.to_string())
        .collect();
    let projection = columns.join(", ");

    let mut sql = if scoring {
        columns.push(RELEVANCE_SORT.to_string());
        // An empty fragment scores every row 1 so the query still runs.
        let score = if fragment.is_empty() { "1" } else { fragment.sql.as_str() };
        format!(
            "select {projection}, ({score}) as relevance from {table} \
             where relevance > 0 \
             order by relevance {order}, {tie_sort} {tie_order}",
            table = descriptor.table,
            order = order.as_sql(),
            tie_sort = descriptor.execution_sort(descriptor.default_sort),
            tie_order = descriptor.default_order.as_sql(),
        )
    } else {
        let mut sql = format!("select {projection} from {table}", table = descriptor.table);
        if !fragment.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&fragment.sql);
        }
        sql.push_str(" order by ");
        sql.push_str(descriptor.execution_sort(&sort));
        sql.push(' ');
        sql.push_str(order.as_sql());
        sql
    };
    if let Some(limit) = request.limit {
        sql.push_str(" limit ");
        sql.push_str(&limit.to_string());
    }

    tracing::debug!(table = descriptor.table, sql = %sql, params = fragment.params.len(), "executing search");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(fragment.params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = Map::with_capacity(columns.len());
        for (index, name) in columns.iter().enumerate() {
            object.insert(name.clone(), json_value(row.get_ref(index)?));
        }
        out.push(object);
    }

    Ok(SearchResults {
        rows: out,
        columns,
        sort,
        order,
    })
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LogicalTable, SchemaRegistry};

    #[test]
    fn test_sort_falls_back_to_table_default() {
        let registry = SchemaRegistry::new();
        let descriptor = registry.descriptor(LogicalTable::Submissions);
        assert_eq!(normalize_sort(descriptor, None), "date");
        assert_eq!(normalize_sort(descriptor, Some("AUTHOR")), "author");
        assert_eq!(normalize_sort(descriptor, Some("relevance")), "relevance");
        // Aliases are search fields, not sortable columns.
        assert_eq!(normalize_sort(descriptor, Some("keywords")), "date");
        assert_eq!(normalize_sort(descriptor, Some("bogus")), "date");
    }

    #[test]
    fn test_query_normalization() {
        assert_eq!(normalize_query("  @Title DRAGON  "), "@title dragon");
        assert_eq!(normalize_query(""), "");
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("@title dragon")
            .with_sort("author")
            .with_order(SortOrder::Asc)
            .with_limit(10);
        assert_eq!(request.query, "@title dragon");
        assert_eq!(request.sort.as_deref(), Some("author"));
        assert_eq!(request.order, Some(SortOrder::Asc));
        assert_eq!(request.limit, Some(10));
    }
}
