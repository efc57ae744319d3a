//! Read-side storage for Galleria archive databases.
//!
//! An archive database is a SQLite file with four searchable tables:
//! submissions, journals, users, and comments. This crate pairs the
//! query compiler from `galleria-query` with the concrete schema of
//! those tables and executes searches over a live connection:
//!
//! - [`SchemaRegistry`] describes each table: searchable columns,
//!   alias expressions, default field, default sort.
//! - [`Store`] owns the connection and runs [`SearchRequest`]s,
//!   caching result sets until the database file changes on disk.
//!
//! ```no_run
//! use galleria_store::{LogicalTable, SearchRequest, SortOrder, Store};
//!
//! # fn main() -> Result<(), galleria_store::StoreError> {
//! let store = Store::open("archive.db")?.with_max_results(500);
//! let request = SearchRequest::new("@title dragon & @author night_owl")
//!     .with_sort("date")
//!     .with_order(SortOrder::Desc);
//! let results = store.search(LogicalTable::Submissions, &request)?;
//! for row in &results.rows {
//!     println!("{}", row["title"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod registry;
pub mod search;
pub mod store;

pub use cache::SearchCache;
pub use error::{StoreError, StoreResult};
pub use registry::{LogicalTable, SchemaRegistry, SortOrder, TableDescriptor};
pub use search::{SearchRequest, SearchResults, RELEVANCE_SORT};
pub use store::{Store, DEFAULT_CACHE_CAPACITY};
