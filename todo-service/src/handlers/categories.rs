//! Category endpoints
//!
//! Categories are shared by all users. Names are unique: the handler checks
//! first for a friendly error, and the store's unique constraint catches
//! concurrent inserts. Deleting a category detaches the todos filed under
//! it rather than deleting them.

use axum::{extract::State, http::StatusCode, Json};

use super::error::{ApiError, ApiOperation};
use super::extract::{Caller, EntityId, JsonBody, QueryParams};
use super::params::CategoryListParams;
use crate::listing::{paginate, resolve_sort, PaginatedResponse, Projection};
use crate::models::Category;
use crate::repository::{Entity, EntityStore, QueryDescriptor, Storage, Window};
use crate::schemas::{CategoryRequest, CategoryResponse};
use crate::state::AppState;

/// `GET /categories`
pub async fn list_categories<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    QueryParams(params): QueryParams<CategoryListParams>,
) -> Result<Json<PaginatedResponse<CategoryResponse>>, ApiError> {
    caller.authenticated()?;

    let order = resolve_sort::<Category>(params.sort())?;
    let page = params.page_request(&state.config().pagination)?;

    let query = QueryDescriptor::new().order(order);
    let response: PaginatedResponse<CategoryResponse> =
        paginate(state.storage().categories(), &query, page)
            .await
            .map_err(|e| ApiError::from(e).with_operation(ApiOperation::List))?;

    Ok(Json(response))
}

/// `POST /categories`
pub async fn create_category<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    body: Result<JsonBody<CategoryRequest>, ApiError>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let identity = caller.authenticated()?;
    let JsonBody(request) = body?;
    request.validate().map_err(ApiError::validation)?;

    let store = state.storage().categories();
    let existing = store
        .find_one(&QueryDescriptor::new().eq("name", request.name.as_str()))
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(Category::NAME, "name"));
    }

    let created = store
        .insert(Category {
            id: 0,
            name: request.name,
        })
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Create))?;

    tracing::info!(
        category_id = created.id,
        created_by = identity.id,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(CategoryResponse::project(created))))
}

/// `GET /categories/{id}`
pub async fn get_category<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    id: Result<EntityId, ApiError>,
) -> Result<Json<CategoryResponse>, ApiError> {
    caller.authenticated()?;
    let EntityId(id) = id?;

    let category = state
        .storage()
        .categories()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(Category::NAME, id.to_string()))?;

    Ok(Json(CategoryResponse::project(category)))
}

/// `DELETE /categories/{id}`
pub async fn delete_category<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    id: Result<EntityId, ApiError>,
) -> Result<StatusCode, ApiError> {
    let identity = caller.authenticated()?;
    let EntityId(id) = id?;

    state
        .storage()
        .categories()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Delete))?;
    let detached = detach_todos(&state, id).await?;

    tracing::info!(
        category_id = id,
        deleted_by = identity.id,
        detached,
        "Category deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Clear `category_id` on every todo still filed under `category_id`
///
/// Mirrors `ON DELETE SET NULL` for stores without foreign keys; on
/// PostgreSQL the rows are already cleared and nothing matches.
async fn detach_todos<S: Storage>(
    state: &AppState<S>,
    category_id: i64,
) -> Result<usize, ApiError> {
    let todos = state.storage().todos();
    let filed = todos
        .fetch(
            &QueryDescriptor::new().eq("category_id", category_id),
            Window::new(0, u64::MAX),
        )
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Delete))?;

    let detached = filed.len();
    for mut todo in filed {
        todo.category_id = None;
        todos
            .update(todo)
            .await
            .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Delete))?;
    }
    Ok(detached)
}
