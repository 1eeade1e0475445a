//! Query descriptors, ordering and windowing
//!
//! A [`QueryDescriptor`] is the backend-neutral description of a collection
//! query: a conjunction of [`Predicate`]s plus an optional ordering. It is
//! built per request, consumed by value while building, and handed to a store
//! by shared reference once complete.
//!
//! # Example
//!
//! ```rust
//! use todo_service::models::Todo;
//! use todo_service::repository::{OrderDirection, OrderInstruction, QueryDescriptor, Window};
//!
//! let query = QueryDescriptor::<Todo>::new()
//!     .eq("owner_id", 7_i64)
//!     .contains(&["title", "description"], "milk")
//!     .order_by(OrderInstruction::new("priority", OrderDirection::Descending));
//!
//! assert_eq!(query.predicates().len(), 2);
//! assert_eq!(Window::page(3, 20).offset, 40);
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::entity::{Entity, FieldValue};

/// Direction for ordering results
///
/// # Example
///
/// ```rust
/// use todo_service::repository::OrderDirection;
///
/// assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
/// assert_eq!(format!("{}", OrderDirection::Descending), "desc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl OrderDirection {
    /// Whether this is [`OrderDirection::Descending`]
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Descending)
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// A single-field ordering
///
/// The field name is `'static` because it always comes from an entity's field
/// table, never from request input directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderInstruction {
    /// Field to order by
    pub field: &'static str,
    /// Direction of the ordering
    pub direction: OrderDirection,
}

impl OrderInstruction {
    /// Create a new ordering
    pub const fn new(field: &'static str, direction: OrderDirection) -> Self {
        Self { field, direction }
    }

    /// Ascending ordering on `field`
    pub const fn asc(field: &'static str) -> Self {
        Self::new(field, OrderDirection::Ascending)
    }

    /// Descending ordering on `field`
    pub const fn desc(field: &'static str) -> Self {
        Self::new(field, OrderDirection::Descending)
    }
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field equals value exactly
    Eq {
        /// Field name
        field: &'static str,
        /// Expected value
        value: FieldValue,
    },
    /// Case-insensitive substring match against any of the listed text fields
    Contains {
        /// Fields searched; a row matches if any of them contains the needle
        fields: &'static [&'static str],
        /// Substring to look for
        needle: String,
    },
}

impl Predicate {
    /// Names of the fields this predicate reads
    pub fn fields(&self) -> &[&'static str] {
        match self {
            Self::Eq { field, .. } => std::slice::from_ref(field),
            Self::Contains { fields, .. } => fields,
        }
    }

    /// Evaluate the predicate against an entity
    ///
    /// Unknown field names never match.
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        match self {
            Self::Eq { field, value } => entity.value_of(field).as_ref() == Some(value),
            Self::Contains { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    entity
                        .value_of(field)
                        .as_ref()
                        .and_then(FieldValue::as_text)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

/// Backend-neutral description of a collection query over `E`
pub struct QueryDescriptor<E> {
    predicates: Vec<Predicate>,
    order: Option<OrderInstruction>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> QueryDescriptor<E> {
    /// An unfiltered, unordered query
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            order: None,
            _entity: PhantomData,
        }
    }

    /// Append a predicate
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Append an exact-match predicate
    #[must_use]
    pub fn eq(self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.filter(Predicate::Eq {
            field,
            value: value.into(),
        })
    }

    /// Append a case-insensitive substring predicate over `fields`
    #[must_use]
    pub fn contains(self, fields: &'static [&'static str], needle: impl Into<String>) -> Self {
        self.filter(Predicate::Contains {
            fields,
            needle: needle.into(),
        })
    }

    /// Set (or clear) the ordering
    #[must_use]
    pub fn order(mut self, order: Option<OrderInstruction>) -> Self {
        self.order = order;
        self
    }

    /// Set the ordering
    #[must_use]
    pub fn order_by(self, order: OrderInstruction) -> Self {
        self.order(Some(order))
    }

    /// Predicates in the order they were added
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The ordering, if any
    pub fn ordering(&self) -> Option<OrderInstruction> {
        self.order
    }
}

impl<E: Entity> QueryDescriptor<E> {
    /// Whether every predicate holds for `entity`
    pub fn matches(&self, entity: &E) -> bool {
        self.predicates.iter().all(|p| p.matches(entity))
    }
}

impl<E> Default for QueryDescriptor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for QueryDescriptor<E> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            order: self.order,
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for QueryDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDescriptor")
            .field("predicates", &self.predicates)
            .field("order", &self.order)
            .finish()
    }
}

/// Offset/limit window over an ordered result
///
/// # Example
///
/// ```rust
/// use todo_service::repository::Window;
///
/// let page3 = Window::page(3, 20);
/// assert_eq!(page3.offset, 40);
/// assert_eq!(page3.limit, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Window {
    /// Create a new window
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-indexed page number
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Todo;

    fn todo(id: i64, title: &str, description: &str, owner_id: i64) -> Todo {
        Todo {
            id,
            title: title.to_string(),
            description: description.to_string(),
            priority: 1,
            complete: false,
            owner_id,
            category_id: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_window_page() {
        assert_eq!(Window::page(1, 10), Window::new(0, 10));
        assert_eq!(Window::page(4, 25), Window::new(75, 25));
        assert_eq!(Window::page(0, 25).offset, 0);
        assert_eq!(Window::page(u64::MAX, u64::MAX).offset, u64::MAX);
    }

    #[test]
    fn test_builder_keeps_predicate_order() {
        let query = QueryDescriptor::<Todo>::new()
            .eq("owner_id", 1_i64)
            .eq("complete", true);
        assert_eq!(query.predicates()[0].fields(), &["owner_id"]);
        assert_eq!(query.predicates()[1].fields(), &["complete"]);
        assert!(query.ordering().is_none());
    }

    #[test]
    fn test_contains_is_case_insensitive_across_fields() {
        let predicate = Predicate::Contains {
            fields: &["title", "description"],
            needle: "MiLk".to_string(),
        };
        assert!(predicate.matches(&todo(1, "Buy milk", "", 1)));
        assert!(predicate.matches(&todo(2, "Groceries", "whole MILK", 1)));
        assert!(!predicate.matches(&todo(3, "Groceries", "bread", 1)));
    }

    #[test]
    fn test_unknown_field_never_matches() {
        let predicate = Predicate::Eq {
            field: "nope",
            value: FieldValue::Null,
        };
        assert!(!predicate.matches(&todo(1, "abc", "def", 1)));
    }

    #[test]
    fn test_descriptor_matches_all_predicates() {
        let query = QueryDescriptor::<Todo>::new()
            .eq("owner_id", 1_i64)
            .contains(&["title"], "abc");
        assert!(query.matches(&todo(1, "abc", "", 1)));
        assert!(!query.matches(&todo(2, "abc", "", 2)));
        assert!(!query.matches(&todo(3, "xyz", "", 1)));
    }
}
