//! Query-to-page pipeline
//!
//! Listing endpoints share one pipeline:
//!
//! 1. [`TodoFilters::apply`] (or a plain [`QueryDescriptor`]) builds the base
//!    query, scoped by [`Scope`]
//! 2. [`resolve_sort`] validates the `sort` parameter against the entity's
//!    sortable fields
//! 3. [`paginate`] counts, windows and fetches
//! 4. [`Projection`] maps each entity onto its response shape
//!
//! [`QueryDescriptor`]: crate::repository::QueryDescriptor

mod filter;
mod paginate;
mod sort;

pub use filter::{Scope, TodoFilters, SEARCH_FIELDS};
pub use paginate::{
    page_count, paginate, PageError, PageRequest, PaginatedResponse, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use sort::{resolve as resolve_sort, InvalidSortField};

/// Explicit mapping from a stored entity to a response shape
///
/// Each response type lists the fields it exposes; anything not copied in
/// `project` never leaves the service.
pub trait Projection<E>: Sized {
    /// Build the response shape from an entity
    fn project(entity: E) -> Self;
}
