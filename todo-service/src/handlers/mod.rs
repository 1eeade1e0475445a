//! HTTP handlers and routing
//!
//! Handlers are generic over the [`Storage`] backend so the same router runs
//! against the in-memory store in tests and PostgreSQL in production.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/healthy` | [`crate::health::health`] |
//! | GET, POST | `/todo` | [`todos::list_todos`], [`todos::create_todo`] |
//! | GET, PUT, DELETE | `/todo/{id}` | [`todos::get_todo`], [`todos::update_todo`], [`todos::delete_todo`] |
//! | GET, POST | `/categories` | [`categories::list_categories`], [`categories::create_category`] |
//! | GET, DELETE | `/categories/{id}` | [`categories::get_category`], [`categories::delete_category`] |
//! | GET | `/user` | [`users::get_user`] |
//! | PUT | `/user/password` | [`users::change_password`] |
//! | PUT | `/user/phonenumber/{phone}` | [`users::change_phone_number`] |
//! | GET | `/admin/todo` | [`admin::list_all_todos`] |
//! | DELETE | `/admin/todo/{id}` | [`admin::delete_any_todo`] |
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_service::{config::Config, handlers, repository::MemoryStorage, state::AppState};
//!
//! let state = AppState::new(Config::load()?, MemoryStorage::new())?;
//! let app = handlers::router(state)?;
//! ```

pub mod admin;
pub mod categories;
pub mod error;
pub mod extract;
pub mod params;
pub mod todos;
pub mod users;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

pub use error::{ApiError, ApiErrorKind, ApiOperation, AUTHENTICATION_FAILED};
pub use extract::{Caller, EntityId, JsonBody, PathParam, QueryParams};
pub use params::{CategoryListParams, TodoListParams};

use crate::{error::Result, health, middleware::JwtAuth, repository::Storage, state::AppState};

/// Resource routes, without state or identity middleware
pub fn routes<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/todo", get(todos::list_todos::<S>).post(todos::create_todo::<S>))
        .route(
            "/todo/{id}",
            get(todos::get_todo::<S>)
                .put(todos::update_todo::<S>)
                .delete(todos::delete_todo::<S>),
        )
        .route(
            "/categories",
            get(categories::list_categories::<S>).post(categories::create_category::<S>),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category::<S>).delete(categories::delete_category::<S>),
        )
        .route("/user", get(users::get_user::<S>))
        .route("/user/password", put(users::change_password::<S>))
        .route(
            "/user/phonenumber/{phone}",
            put(users::change_phone_number::<S>),
        )
        .route("/admin/todo", get(admin::list_all_todos::<S>))
        .route(
            "/admin/todo/{id}",
            axum::routing::delete(admin::delete_any_todo::<S>),
        )
}

/// Complete application router
///
/// Resource routes sit behind the JWT identity middleware; `/healthy` does
/// not.
///
/// # Errors
///
/// Fails when the JWT settings in the state's configuration are unusable.
pub fn router<S: Storage>(state: AppState<S>) -> Result<Router> {
    let auth = JwtAuth::new(&state.config().auth)?;

    let app = routes::<S>()
        .layer(middleware::from_fn_with_state(auth, JwtAuth::middleware))
        .route("/healthy", get(health::health))
        .with_state(state);

    Ok(app)
}
