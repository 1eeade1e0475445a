//! Store trait definitions
//!
//! Stores use RPITIT (Return Position Impl Trait In Traits) so implementations
//! can be written as plain `async fn`s without `async_trait`.
//!
//! # Overview
//!
//! - [`EntityStore`]: queryable collection of one entity type
//! - [`Storage`]: the set of collections the service runs against
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_service::repository::{EntityStore, QueryDescriptor, Window};
//!
//! let query = QueryDescriptor::<Todo>::new().eq("owner_id", 7_i64);
//! let total = store.count(&query).await?;
//! let first_ten = store.fetch(&query, Window::page(1, 10)).await?;
//! ```

use std::future::Future;

use super::entity::Entity;
use super::error::RepositoryError;
use super::query::{QueryDescriptor, Window};
use crate::models::{Category, Todo, User};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A queryable collection of `E`
///
/// Every call acquires whatever it needs (a lock guard, a pooled connection)
/// and releases it before returning. Separate calls are not isolated from each
/// other, so a `count` followed by a `fetch` may observe different states.
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Number of entities matching the query's predicates
    fn count(&self, query: &QueryDescriptor<E>)
        -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Entities matching the query, ordered and windowed
    ///
    /// Without an ordering, results come back in ascending id order. With one,
    /// ties are broken by ascending id.
    fn fetch(
        &self,
        query: &QueryDescriptor<E>,
        window: Window,
    ) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    /// First entity matching the query, if any
    fn find_one(
        &self,
        query: &QueryDescriptor<E>,
    ) -> impl Future<Output = RepositoryResult<Option<E>>> + Send;

    /// Entity with the given primary key, if any
    fn find_by_id(&self, id: i64) -> impl Future<Output = RepositoryResult<Option<E>>> + Send {
        async move {
            let query = QueryDescriptor::new().eq("id", id);
            self.find_one(&query).await
        }
    }

    /// Insert a new entity; the store assigns the id
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error when a unique field collides.
    fn insert(&self, entity: E) -> impl Future<Output = RepositoryResult<E>> + Send;

    /// Replace the stored entity with the same id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no entity has that id and `AlreadyExists` when a
    /// unique field collides with another row.
    fn update(&self, entity: E) -> impl Future<Output = RepositoryResult<E>> + Send;

    /// Delete the entity with the given id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no entity has that id.
    fn delete(&self, id: i64) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// The collections the service runs against
pub trait Storage: Clone + Send + Sync + 'static {
    /// Todo collection
    type Todos: EntityStore<Todo>;
    /// Category collection
    type Categories: EntityStore<Category>;
    /// User collection
    type Users: EntityStore<User>;

    /// Todo collection
    fn todos(&self) -> &Self::Todos;

    /// Category collection
    fn categories(&self) -> &Self::Categories;

    /// User collection
    fn users(&self) -> &Self::Users;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FieldValue, Predicate};
    use std::sync::Mutex;

    #[test]
    fn test_repository_result_type() {
        let ok_result: RepositoryResult<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: RepositoryResult<i32> = Err(RepositoryError::not_found("Test", "123"));
        assert!(err_result.is_err());
    }

    /// Records the last query passed to `find_one`
    #[derive(Default)]
    struct RecordingStore {
        last: Mutex<Option<Vec<Predicate>>>,
    }

    impl EntityStore<Category> for RecordingStore {
        async fn count(&self, _query: &QueryDescriptor<Category>) -> RepositoryResult<u64> {
            Ok(0)
        }

        async fn fetch(
            &self,
            _query: &QueryDescriptor<Category>,
            _window: Window,
        ) -> RepositoryResult<Vec<Category>> {
            Ok(vec![])
        }

        async fn find_one(
            &self,
            query: &QueryDescriptor<Category>,
        ) -> RepositoryResult<Option<Category>> {
            if let Ok(mut last) = self.last.lock() {
                *last = Some(query.predicates().to_vec());
            }
            Ok(None)
        }

        async fn insert(&self, entity: Category) -> RepositoryResult<Category> {
            Ok(entity.with_id(1))
        }

        async fn update(&self, entity: Category) -> RepositoryResult<Category> {
            Ok(entity)
        }

        async fn delete(&self, id: i64) -> RepositoryResult<()> {
            Err(RepositoryError::not_found("Category", id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_find_by_id_queries_primary_key() {
        let store = RecordingStore::default();
        let found = store.find_by_id(12).await.unwrap();
        assert!(found.is_none());

        let recorded = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(
            recorded,
            vec![Predicate::Eq {
                field: "id",
                value: FieldValue::Integer(12),
            }]
        );
    }
}
