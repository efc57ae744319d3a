//! Error types for query compilation.

use thiserror::Error;

/// Errors raised while compiling a query.
///
/// The compiler is deliberately permissive: stray operators, dangling
/// connectives, and unknown fields are absorbed rather than rejected. The
/// only structural failure is unbalanced grouping, which must never be
/// allowed to execute since it could change the intended filter scope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The compiled expression has mismatched parentheses.
    #[error("malformed query: {opens} opening parentheses vs {closes} closing")]
    UnbalancedGroup { opens: usize, closes: usize },
}
