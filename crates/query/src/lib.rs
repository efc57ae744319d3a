//! Search query language compiler for the Galleria archive browser.
//!
//! This crate turns a user-supplied search query into a parameterized SQL
//! filter expression that the storage layer can splice into the `WHERE`
//! clause of any relational backend. It has no I/O and no database
//! dependency of its own.
//!
//! # Query language
//!
//! ```text
//! query    = term*
//! term     = "@" field            ; switch the active field
//!          / "(" query ")"        ; grouping
//!          / "&" / "|"            ; boolean connectives
//!          / operator             ; "==" "!=" "%=" ">" ">=" "<" "<=" "!"
//!          / literal              ; bare word or double-quoted span
//! ```
//!
//! Adjacent terms imply conjunction, so `@title dragon cave` searches the
//! title for both words. Literals may carry `^`/`$` anchors to pin a
//! substring match to the start or end of the column value.
//!
//! # Example
//!
//! ```
//! use galleria_query::{compile_query, TableSchema};
//!
//! let schema = TableSchema::new()
//!     .with_columns(["title", "author"])
//!     .with_substring_columns(["title"]);
//!
//! let filter = compile_query("@title dragon & @author == rook", "title", &schema, false).unwrap();
//! assert_eq!(filter.sql, "(title like ? escape '\\') and (author = ?)");
//! assert_eq!(filter.params, vec!["%dragon%".to_string(), "rook".to_string()]);
//! ```

pub mod compiler;
pub mod error;
pub mod schema;
pub mod token;
pub mod value;

pub use compiler::{compile_query, SqlFragment};
pub use error::QueryError;
pub use schema::TableSchema;
pub use token::{clean, tokenize, MatchOp, Token};
pub use value::format_value;
