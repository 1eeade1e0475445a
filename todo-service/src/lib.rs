//! # todo-service
//!
//! Multi-tenant task tracking API built on axum.
//!
//! ## Features
//!
//! - **Todos**: per-user todo items with filtering, search, sorting and
//!   pagination
//! - **Categories**: shared, uniquely named categories
//! - **Accounts**: profile, password and phone number changes for the
//!   current user
//! - **Administration**: cross-user todo listing and deletion
//! - **Storage backends**: in-memory, or PostgreSQL with the `database`
//!   feature
//! - **Middleware stack**: JWT identity, request tracking, panic recovery,
//!   body size limits, timing header
//! - **Graceful shutdown**: SIGTERM and SIGINT handling
//!
//! ## Example
//!
//! ```rust,no_run
//! use todo_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), MemoryStorage::new())?;
//!     let app = router(state)?;
//!
//!     Server::new(config).serve(app).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repository;
pub mod schemas;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{Identity, PasswordHasher};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{router, ApiError};
    pub use crate::health::health;
    pub use crate::listing::{paginate, PageRequest, PaginatedResponse, Projection};
    pub use crate::middleware::{Claims, JwtAuth};
    pub use crate::models::{Category, Todo, User};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{EntityStore, MemoryStorage, QueryDescriptor, Storage};
    pub use crate::server::Server;
    pub use crate::state::{AppState, AppStateBuilder};

    #[cfg(feature = "database")]
    pub use crate::repository::PgStorage;

    pub use axum::{
        routing::{delete, get, post, put},
        Json, Router,
    };
    pub use serde::{Deserialize, Serialize};
    pub use tokio;
    pub use tracing::{debug, error, info, warn};
}
