//! In-memory entity store
//!
//! Backs the service when no database is configured, and every test. Rows live
//! in a `BTreeMap` keyed by id behind a `tokio::sync::RwLock`; each call takes
//! the guard and drops it before returning.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::entity::{compare_by, Entity};
use super::error::{RepositoryError, RepositoryOperation};
use super::query::{QueryDescriptor, Window};
use super::traits::{EntityStore, RepositoryResult, Storage};
use crate::models::{Category, Todo, User};

#[derive(Debug)]
struct Table<E> {
    rows: BTreeMap<i64, E>,
    next_id: i64,
}

impl<E: Entity> Table<E> {
    fn matching<'a>(&'a self, query: &'a QueryDescriptor<E>) -> impl Iterator<Item = &'a E> + 'a {
        self.rows.values().filter(move |row| query.matches(*row))
    }

    /// Name of the first unique field `candidate` shares with another row
    fn unique_collision(&self, candidate: &E) -> Option<&'static str> {
        E::UNIQUE.iter().copied().find(|field| {
            let Some(value) = candidate.value_of(field) else {
                return false;
            };
            !value.is_null()
                && self
                    .rows
                    .values()
                    .filter(|row| row.id() != candidate.id())
                    .any(|row| row.value_of(field).as_ref() == Some(&value))
        })
    }
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// In-memory collection of one entity type
///
/// Cloning shares the underlying table.
#[derive(Debug)]
pub struct MemoryStore<E> {
    table: Arc<RwLock<Table<E>>>,
}

impl<E> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::default())),
        }
    }
}

impl<E: Entity> MemoryStore<E> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Entity> EntityStore<E> for MemoryStore<E> {
    async fn count(&self, query: &QueryDescriptor<E>) -> RepositoryResult<u64> {
        let table = self.table.read().await;
        Ok(table.matching(query).count() as u64)
    }

    async fn fetch(&self, query: &QueryDescriptor<E>, window: Window) -> RepositoryResult<Vec<E>> {
        let table = self.table.read().await;
        let mut rows: Vec<&E> = table.matching(query).collect();

        // BTreeMap iteration is already ascending by id
        if let Some(order) = query.ordering() {
            let def = E::sortable_field(order.field).ok_or_else(|| {
                RepositoryError::database_error(
                    RepositoryOperation::Fetch,
                    format!("unknown sort field `{}`", order.field),
                )
                .with_entity(E::NAME, order.field)
            })?;
            let descending = order.direction.is_descending();
            rows.sort_by(|a, b| compare_by(*a, *b, def, descending));
        }

        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn find_one(&self, query: &QueryDescriptor<E>) -> RepositoryResult<Option<E>> {
        Ok(self.fetch(query, Window::new(0, 1)).await?.into_iter().next())
    }

    async fn insert(&self, entity: E) -> RepositoryResult<E> {
        let mut table = self.table.write().await;
        let entity = entity.with_id(table.next_id);
        if let Some(field) = table.unique_collision(&entity) {
            return Err(RepositoryError::already_exists(E::NAME, field));
        }
        table.next_id += 1;
        table.rows.insert(entity.id(), entity.clone());
        tracing::debug!(entity = E::NAME, id = entity.id(), "Inserted row");
        Ok(entity)
    }

    async fn update(&self, entity: E) -> RepositoryResult<E> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&entity.id()) {
            return Err(RepositoryError::not_found(E::NAME, entity.id().to_string())
                .with_operation(RepositoryOperation::Update));
        }
        if let Some(field) = table.unique_collision(&entity) {
            return Err(RepositoryError::already_exists(E::NAME, field)
                .with_operation(RepositoryOperation::Update));
        }
        table.rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut table = self.table.write().await;
        match table.rows.remove(&id) {
            Some(_) => {
                tracing::debug!(entity = E::NAME, id, "Deleted row");
                Ok(())
            }
            None => Err(RepositoryError::not_found(E::NAME, id.to_string())
                .with_operation(RepositoryOperation::Delete)),
        }
    }
}

/// All collections held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    todos: MemoryStore<Todo>,
    categories: MemoryStore<Category>,
    users: MemoryStore<User>,
}

impl MemoryStorage {
    /// Create empty collections
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    type Todos = MemoryStore<Todo>;
    type Categories = MemoryStore<Category>;
    type Users = MemoryStore<User>;

    fn todos(&self) -> &Self::Todos {
        &self.todos
    }

    fn categories(&self) -> &Self::Categories {
        &self.categories
    }

    fn users(&self) -> &Self::Users {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{OrderInstruction, RepositoryErrorKind};

    fn todo(title: &str, priority: i32, owner_id: i64) -> Todo {
        Todo {
            id: 0,
            title: title.to_string(),
            description: format!("about {}", title),
            priority,
            complete: false,
            owner_id,
            category_id: None,
            completed_at: None,
        }
    }

    fn category(name: &str) -> Category {
        Category {
            id: 0,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::<Category>::new();
        let a = store.insert(category("Home")).await.unwrap();
        let b = store.insert(category("Work")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn test_unique_field_rejected_on_insert() {
        let store = MemoryStore::<Category>::new();
        store.insert(category("Home")).await.unwrap();
        let err = store.insert(category("Home")).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);
        assert_eq!(err.entity_id.as_deref(), Some("name"));

        // a failed insert does not consume an id
        let next = store.insert(category("Work")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_unique_field_rejected_on_update() {
        let store = MemoryStore::<Category>::new();
        store.insert(category("Home")).await.unwrap();
        let work = store.insert(category("Work")).await.unwrap();

        let renamed = Category {
            name: "Home".to_string(),
            ..work.clone()
        };
        let err = store.update(renamed).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);
        assert_eq!(err.operation, RepositoryOperation::Update);

        // updating a row to its own value is fine
        assert!(store.update(work).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let store = MemoryStore::<Todo>::new();
        let err = store.update(todo("ghost", 1, 1).with_id(5)).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);

        let err = store.delete(5).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
        assert_eq!(err.operation, RepositoryOperation::Delete);
    }

    #[tokio::test]
    async fn test_fetch_orders_and_windows() {
        let store = MemoryStore::<Todo>::new();
        for (title, priority) in [("c", 2), ("a", 5), ("b", 2), ("d", 1)] {
            store.insert(todo(title, priority, 1)).await.unwrap();
        }

        let query = QueryDescriptor::new().order_by(OrderInstruction::desc("priority"));
        let rows = store.fetch(&query, Window::new(0, 10)).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|t| t.title.as_str()).collect();
        // equal priorities keep ascending id order
        assert_eq!(titles, vec!["a", "c", "b", "d"]);

        let rows = store.fetch(&query, Window::new(1, 2)).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_fetch_without_order_is_id_ascending() {
        let store = MemoryStore::<Todo>::new();
        for title in ["z", "y", "x"] {
            store.insert(todo(title, 1, 1)).await.unwrap();
        }
        let rows = store
            .fetch(&QueryDescriptor::new(), Window::new(0, 10))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_count_and_find_one_respect_predicates() {
        let store = MemoryStore::<Todo>::new();
        store.insert(todo("mine", 1, 1)).await.unwrap();
        store.insert(todo("theirs", 1, 2)).await.unwrap();
        store.insert(todo("also mine", 1, 1)).await.unwrap();

        let query = QueryDescriptor::new().eq("owner_id", 1_i64);
        assert_eq!(store.count(&query).await.unwrap(), 2);

        let query = QueryDescriptor::new().eq("owner_id", 2_i64);
        let found = store.find_one(&query).await.unwrap().unwrap();
        assert_eq!(found.title, "theirs");

        assert!(store.find_by_id(3).await.unwrap().is_some());
        assert!(store.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_window_past_end_is_empty() {
        let store = MemoryStore::<Todo>::new();
        store.insert(todo("only", 1, 1)).await.unwrap();
        let rows = store
            .fetch(&QueryDescriptor::new(), Window::new(u64::MAX, 10))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_storage_clones_share_tables() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        storage.categories().insert(category("Shared")).await.unwrap();
        assert_eq!(
            clone.categories().count(&QueryDescriptor::new()).await.unwrap(),
            1
        );
    }
}
