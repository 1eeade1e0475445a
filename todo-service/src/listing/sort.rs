//! Sort parameter resolution
//!
//! A sort parameter is a field name, optionally prefixed with `-` for
//! descending order. Only fields marked sortable in the entity's field table
//! are accepted, and names must match exactly.

use thiserror::Error;

use crate::repository::{Entity, OrderDirection, OrderInstruction};

/// The requested sort field is not sortable for the entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid sort field: {0}")]
pub struct InvalidSortField(pub String);

/// Resolve a raw `sort` parameter against `E`'s sortable fields
///
/// `None` and the empty string mean "no explicit ordering".
///
/// # Example
///
/// ```rust
/// use todo_service::listing::resolve_sort;
/// use todo_service::models::Todo;
/// use todo_service::repository::OrderDirection;
///
/// let order = resolve_sort::<Todo>(Some("-priority")).unwrap().unwrap();
/// assert_eq!(order.field, "priority");
/// assert_eq!(order.direction, OrderDirection::Descending);
///
/// assert!(resolve_sort::<Todo>(Some("owner")).is_err());
/// assert_eq!(resolve_sort::<Todo>(None).unwrap(), None);
/// ```
pub fn resolve<E: Entity>(sort: Option<&str>) -> Result<Option<OrderInstruction>, InvalidSortField> {
    let Some(raw) = sort.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let (name, direction) = match raw.strip_prefix('-') {
        Some(rest) => (rest, OrderDirection::Descending),
        None => (raw, OrderDirection::Ascending),
    };

    E::sortable_field(name)
        .map(|def| Some(OrderInstruction::new(def.name, direction)))
        .ok_or_else(|| InvalidSortField(name.to_string()))
}
