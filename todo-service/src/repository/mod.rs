//! Entity stores
//!
//! Backend-neutral access to the service's collections. Queries are described
//! with [`QueryDescriptor`] and evaluated by an [`EntityStore`]; the set of
//! stores a running service uses is bundled behind [`Storage`].
//!
//! # Features
//!
//! - **Field tables**: [`Entity`] and [`FieldDef`] map field names to values
//!   without reflection
//! - **Queries**: [`Predicate`], [`OrderInstruction`] and [`Window`]
//! - **In-memory backend**: [`MemoryStore`] / [`MemoryStorage`]
//! - **PostgreSQL backend**: `PgStore` / `PgStorage` (requires the `database`
//!   feature)
//!
//! # Example
//!
//! ```rust
//! use todo_service::models::Category;
//! use todo_service::repository::{EntityStore, MemoryStore, QueryDescriptor, Window};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let store = MemoryStore::<Category>::new();
//! store.insert(Category { id: 0, name: "Errands".into() }).await.unwrap();
//!
//! let query = QueryDescriptor::new().contains(&["name"], "err");
//! assert_eq!(store.count(&query).await.unwrap(), 1);
//! let page = store.fetch(&query, Window::page(1, 10)).await.unwrap();
//! assert_eq!(page[0].id, 1);
//! # });
//! # }
//! ```

mod entity;
mod error;
mod memory;
#[cfg(feature = "database")]
mod postgres;
mod query;
mod traits;

pub use entity::{compare_by, Entity, FieldDef, FieldKind, FieldValue};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::{MemoryStorage, MemoryStore};
#[cfg(feature = "database")]
pub use postgres::{PgStorage, PgStore};
pub use query::{OrderDirection, OrderInstruction, Predicate, QueryDescriptor, Window};
pub use traits::{EntityStore, RepositoryResult, Storage};
