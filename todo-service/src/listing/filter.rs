//! Todo filter builder
//!
//! Turns the optional list filters and the caller's [`Scope`] into a
//! [`QueryDescriptor`]. Ownership scoping is not optional: every query built
//! here either restricts to one owner or carries an [`AdminGrant`].

use crate::auth::AdminGrant;
use crate::models::Todo;
use crate::repository::QueryDescriptor;

/// Fields the free-text search looks at
pub const SEARCH_FIELDS: &[&str] = &["title", "description"];

/// Which rows a todo query may see
#[derive(Debug, Clone)]
pub enum Scope {
    /// Only rows owned by this user id
    Owner(i64),
    /// All rows; requires proof of the admin role
    Unrestricted(AdminGrant),
}

impl Scope {
    /// Scope for an admin, proven by `grant`
    pub fn unrestricted(grant: AdminGrant) -> Self {
        Self::Unrestricted(grant)
    }
}

/// Optional filters for todo listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilters {
    /// Case-insensitive substring matched against title or description
    pub search: Option<String>,
    /// Exact completion state
    pub complete: Option<bool>,
    /// Exact category id
    pub category_id: Option<i64>,
}

impl TodoFilters {
    /// Build the base query for `scope`
    ///
    /// The owner predicate, when present, is always first. Blank searches are
    /// ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use todo_service::listing::{Scope, TodoFilters};
    ///
    /// let filters = TodoFilters { complete: Some(false), ..Default::default() };
    /// let query = filters.apply(Scope::Owner(42));
    /// assert_eq!(query.predicates().len(), 2);
    /// ```
    pub fn apply(&self, scope: Scope) -> QueryDescriptor<Todo> {
        let mut query = QueryDescriptor::new();

        if let Scope::Owner(owner_id) = scope {
            query = query.eq("owner_id", owner_id);
        }

        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query = query.contains(SEARCH_FIELDS, search);
            }
        }

        if let Some(complete) = self.complete {
            query = query.eq("complete", complete);
        }

        if let Some(category_id) = self.category_id {
            query = query.eq("category_id", category_id);
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{policy, Identity};
    use crate::repository::{FieldValue, Predicate};

    fn admin_grant() -> AdminGrant {
        let admin = Identity {
            id: 1,
            username: "root".to_string(),
            role: "admin".to_string(),
        };
        policy::admin_grant(Some(&admin)).unwrap()
    }

    #[test]
    fn test_owner_scope_is_first_predicate() {
        let filters = TodoFilters {
            search: Some("milk".to_string()),
            complete: Some(true),
            category_id: Some(3),
        };
        let query = filters.apply(Scope::Owner(9));
        assert_eq!(
            query.predicates()[0],
            Predicate::Eq {
                field: "owner_id",
                value: FieldValue::Integer(9),
            }
        );
        assert_eq!(query.predicates().len(), 4);
    }

    #[test]
    fn test_unrestricted_scope_has_no_owner_predicate() {
        let query = TodoFilters::default().apply(Scope::unrestricted(admin_grant()));
        assert!(query.predicates().is_empty());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        for search in ["", "   ", "\t"] {
            let filters = TodoFilters {
                search: Some(search.to_string()),
                ..Default::default()
            };
            assert_eq!(filters.apply(Scope::Owner(1)).predicates().len(), 1);
        }
    }

    #[test]
    fn test_search_targets_title_and_description() {
        let filters = TodoFilters {
            search: Some("  Milk ".to_string()),
            ..Default::default()
        };
        let query = filters.apply(Scope::Owner(1));
        assert_eq!(
            query.predicates()[1],
            Predicate::Contains {
                fields: SEARCH_FIELDS,
                needle: "Milk".to_string(),
            }
        );
    }

    #[test]
    fn test_exact_filters() {
        let filters = TodoFilters {
            search: None,
            complete: Some(false),
            category_id: Some(7),
        };
        let query = filters.apply(Scope::Owner(1));
        assert!(query.predicates().contains(&Predicate::Eq {
            field: "complete",
            value: FieldValue::Boolean(false),
        }));
        assert!(query.predicates().contains(&Predicate::Eq {
            field: "category_id",
            value: FieldValue::Integer(7),
        }));
    }
}
