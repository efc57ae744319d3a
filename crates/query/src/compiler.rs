//! Query-to-SQL compiler.
//!
//! Walks the token stream with a small amount of state (active field,
//! matching mode, negation, comparison direction) and emits a parenthesized
//! boolean expression plus an ordered list of bind values. The fragment is
//! directly substitutable into the `WHERE` clause of a parameterized
//! statement; values are never concatenated into the SQL text.
//!
//! When `scoring` is set the connectives become arithmetic (`*`/`+`) so the
//! same expression can be selected as a numeric relevance column and sorted
//! on.

use crate::error::QueryError;
use crate::schema::TableSchema;
use crate::token::{tokenize, MatchOp, Token};
use crate::value::format_value;

/// A fragment of SQL with its bound parameter values.
///
/// Invariant: the number of `?` placeholders in `sql` equals `params.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFragment {
    /// The SQL clause. Empty means "no filter".
    pub sql: String,
    /// Bound parameter values, in placeholder order.
    pub params: Vec<String>,
}

impl SqlFragment {
    /// Returns true if this fragment carries no filter at all.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Counts the `?` placeholders in the fragment.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Comparison direction requested by the last operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    None,
    Greater,
    Less,
}

/// What the previously emitted element was, for implicit-conjunction and
/// dangling-connective decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Connective,
    Open,
    /// A completed sub-expression: a predicate or a closed group.
    Completed,
}

/// Compiles a query string into a parameterized filter expression.
///
/// `query` must already be lowercased by the caller. An unknown `@field`
/// falls back to `default_field` rather than failing; the only hard error
/// is unbalanced grouping. An empty query compiles to an empty fragment,
/// which the caller decides how to interpret.
pub fn compile_query(
    query: &str,
    default_field: &str,
    schema: &TableSchema,
    scoring: bool,
) -> Result<SqlFragment, QueryError> {
    if query.is_empty() {
        return Ok(SqlFragment::default());
    }

    let conjunction = if scoring { "*" } else { "and" };
    let disjunction = if scoring { "+" } else { "or" };

    let mut elements: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    let mut field = default_field.to_lowercase();
    let mut exact = false;
    let mut like = schema.is_substring(&field);
    let mut negate = false;
    let mut comparison = Comparison::None;
    let mut prev = Prev::Start;

    for token in tokenize(query) {
        match token {
            Token::Op(op) => match op {
                MatchOp::Substring => {
                    (exact, like, negate, comparison) = (false, true, false, Comparison::None);
                }
                MatchOp::Exact => {
                    (exact, like, negate, comparison) = (true, false, false, Comparison::None);
                }
                MatchOp::NotEqual => {
                    (exact, like, negate, comparison) = (true, false, true, Comparison::None);
                }
                // Comparisons leave a pending negate alone so `!>=` reads
                // as "not greater-or-equal".
                MatchOp::Greater => {
                    (exact, like, comparison) = (false, false, Comparison::Greater);
                }
                MatchOp::GreaterEq => {
                    (exact, like, comparison) = (true, false, Comparison::Greater);
                }
                MatchOp::Less => {
                    (exact, like, comparison) = (false, false, Comparison::Less);
                }
                MatchOp::LessEq => {
                    (exact, like, comparison) = (true, false, Comparison::Less);
                }
                MatchOp::Negate => {
                    negate = !negate;
                }
            },
            Token::Field(name) => {
                if schema.is_field(&name) {
                    field = name;
                } else {
                    tracing::debug!(field = %name, default = %default_field, "unknown field, using default");
                    field = default_field.to_lowercase();
                }
                exact = false;
                like = schema.is_substring(&field);
                comparison = Comparison::None;
                negate = false;
            }
            Token::And | Token::Or => {
                if matches!(prev, Prev::Start | Prev::Connective | Prev::Open) {
                    continue;
                }
                let connective = if token == Token::And { conjunction } else { disjunction };
                elements.push(connective.to_string());
                negate = false;
                prev = Prev::Connective;
            }
            Token::GroupOpen => {
                if prev == Prev::Completed {
                    elements.push(conjunction.to_string());
                }
                elements.push("(".to_string());
                negate = false;
                prev = Prev::Open;
            }
            Token::GroupClose => {
                prev = match prev {
                    Prev::Open => {
                        // The group emptied out (e.g. `( & )`); drop the open
                        // and any connective queued before it, then resume as
                        // if the group was never written. Otherwise a literal
                        // after a leading empty group would emit a connective
                        // with nothing on its left.
                        elements.pop();
                        if is_connective(elements.last(), scoring) {
                            elements.pop();
                        }
                        match elements.last().map(String::as_str) {
                            None => Prev::Start,
                            Some("(") => Prev::Open,
                            Some(_) => Prev::Completed,
                        }
                    }
                    Prev::Connective => {
                        // Dangling connective right before the close.
                        elements.pop();
                        elements.push(")".to_string());
                        Prev::Completed
                    }
                    _ => {
                        elements.push(")".to_string());
                        Prev::Completed
                    }
                };
                negate = false;
            }
            Token::Literal(raw) => {
                if prev == Prev::Completed {
                    elements.push(conjunction.to_string());
                }
                let column = resolve_column(schema, &field, exact, comparison);
                elements.push(build_predicate(&column, exact, negate, comparison));
                let substring = if exact || comparison != Comparison::None {
                    false
                } else {
                    like
                };
                params.push(format_value(&raw, substring));
                negate = false;
                prev = Prev::Completed;
            }
        }
    }

    if is_connective(elements.last(), scoring) {
        elements.pop();
    }

    let sql = elements.join(" ");
    let opens = sql.matches('(').count();
    let closes = sql.matches(')').count();
    if opens != closes {
        return Err(QueryError::UnbalancedGroup { opens, closes });
    }

    tracing::debug!(%query, %sql, values = params.len(), "compiled search query");
    Ok(SqlFragment { sql, params })
}

fn is_connective(element: Option<&String>, scoring: bool) -> bool {
    match element.map(String::as_str) {
        Some("and") | Some("or") => !scoring,
        Some("*") | Some("+") => scoring,
        _ => false,
    }
}

/// Resolves the SQL column expression for a field, applying the alias map
/// and a `lower(...)` wrapper for case-insensitive fields in
/// exact/comparison mode (substring mode already case-folds because the
/// caller lowercases the whole query up front).
fn resolve_column(
    schema: &TableSchema,
    field: &str,
    exact: bool,
    comparison: Comparison,
) -> String {
    let column = schema.resolve(field);
    if (exact || comparison != Comparison::None) && schema.is_lowercase(field) {
        format!("lower({column})")
    } else {
        column.to_string()
    }
}

/// Emits one parenthesized predicate for the current mode.
///
/// The relational operator direction flips under negation and gains `=`
/// when `exact != negate`: `!>=` is "not greater-or-equal", which is plain
/// `<`.
fn build_predicate(column: &str, exact: bool, negate: bool, comparison: Comparison) -> String {
    match comparison {
        Comparison::Greater | Comparison::Less => {
            let flipped = (comparison == Comparison::Less) != negate;
            let mut op = if flipped { "<" } else { ">" }.to_string();
            if exact != negate {
                op.push('=');
            }
            format!("({column} {op} ?)")
        }
        Comparison::None if exact => {
            format!("({column} {} ?)", if negate { "!=" } else { "=" })
        }
        Comparison::None => {
            let not = if negate { " not" } else { "" };
            format!("({column}{not} like ? escape '\\')")
        }
    }
}
