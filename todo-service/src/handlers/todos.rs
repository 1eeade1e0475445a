//! Todo endpoints
//!
//! Every query built here is scoped to the caller: single-item lookups carry
//! both the id and the owner, and listings go through
//! [`TodoFilters::apply`](crate::listing::TodoFilters::apply) with
//! [`Scope::Owner`].

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use super::error::{ApiError, ApiOperation};
use super::extract::{Caller, EntityId, JsonBody, QueryParams};
use super::params::TodoListParams;
use crate::listing::{paginate, resolve_sort, PaginatedResponse, Projection, Scope};
use crate::models::{Category, Todo};
use crate::repository::{Entity, EntityStore, QueryDescriptor, Storage};
use crate::schemas::{TodoRequest, TodoResponse};
use crate::state::AppState;

fn owned(id: i64, owner_id: i64) -> QueryDescriptor<Todo> {
    QueryDescriptor::new().eq("id", id).eq("owner_id", owner_id)
}

async fn find_owned<S: Storage>(
    state: &AppState<S>,
    id: i64,
    owner_id: i64,
) -> Result<Todo, ApiError> {
    state
        .storage()
        .todos()
        .find_one(&owned(id, owner_id))
        .await?
        .ok_or_else(|| ApiError::not_found(Todo::NAME, id.to_string()))
}

/// The referenced category must exist before a todo may point at it
async fn ensure_category<S: Storage>(
    state: &AppState<S>,
    category_id: Option<i64>,
) -> Result<(), ApiError> {
    let Some(category_id) = category_id else {
        return Ok(());
    };
    state
        .storage()
        .categories()
        .find_by_id(category_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found(Category::NAME, category_id.to_string()))
}

/// `GET /todo`
pub async fn list_todos<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    QueryParams(params): QueryParams<TodoListParams>,
) -> Result<Json<PaginatedResponse<TodoResponse>>, ApiError> {
    let identity = caller.authenticated()?;

    let filters = params.filters()?;
    let order = resolve_sort::<Todo>(params.sort())?;
    let page = params.page_request(&state.config().pagination)?;

    let query = filters.apply(Scope::Owner(identity.id)).order(order);
    let response: PaginatedResponse<TodoResponse> =
        paginate(state.storage().todos(), &query, page)
            .await
            .map_err(|e| ApiError::from(e).with_operation(ApiOperation::List))?;

    Ok(Json(response))
}

/// `GET /todo/{id}`
pub async fn get_todo<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    id: Result<EntityId, ApiError>,
) -> Result<Json<TodoResponse>, ApiError> {
    let identity = caller.authenticated()?;
    let EntityId(id) = id?;
    let todo = find_owned(&state, id, identity.id).await?;
    Ok(Json(TodoResponse::project(todo)))
}

/// `POST /todo`
pub async fn create_todo<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    body: Result<JsonBody<TodoRequest>, ApiError>,
) -> Result<StatusCode, ApiError> {
    let identity = caller.authenticated()?;
    let JsonBody(request) = body?;
    request.validate().map_err(ApiError::validation)?;
    ensure_category(&state, request.category_id)
        .await
        .map_err(|e| e.with_operation(ApiOperation::Create))?;

    let todo = request.into_todo(identity.id, Utc::now());
    let created = state
        .storage()
        .todos()
        .insert(todo)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Create))?;

    tracing::info!(todo_id = created.id, owner_id = identity.id, "Todo created");
    Ok(StatusCode::CREATED)
}

/// `PUT /todo/{id}`
pub async fn update_todo<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    id: Result<EntityId, ApiError>,
    body: Result<JsonBody<TodoRequest>, ApiError>,
) -> Result<StatusCode, ApiError> {
    let identity = caller.authenticated()?;
    let EntityId(id) = id?;
    let JsonBody(request) = body?;
    request.validate().map_err(ApiError::validation)?;

    let mut todo = find_owned(&state, id, identity.id)
        .await
        .map_err(|e| e.with_operation(ApiOperation::Update))?;
    ensure_category(&state, request.category_id)
        .await
        .map_err(|e| e.with_operation(ApiOperation::Update))?;
    request.apply_to(&mut todo, Utc::now());

    state
        .storage()
        .todos()
        .update(todo)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Update))?;

    tracing::info!(todo_id = id, owner_id = identity.id, "Todo updated");
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /todo/{id}`
pub async fn delete_todo<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    id: Result<EntityId, ApiError>,
) -> Result<StatusCode, ApiError> {
    let identity = caller.authenticated()?;
    let EntityId(id) = id?;

    find_owned(&state, id, identity.id)
        .await
        .map_err(|e| e.with_operation(ApiOperation::Delete))?;
    state
        .storage()
        .todos()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Delete))?;

    tracing::info!(todo_id = id, owner_id = identity.id, "Todo deleted");
    Ok(StatusCode::NO_CONTENT)
}
