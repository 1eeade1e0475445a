//! Admin endpoints
//!
//! Both routes obtain an [`AdminGrant`](crate::auth::AdminGrant) from the
//! policy before touching the store; listing with [`Scope::Unrestricted`]
//! is impossible without one.

use axum::{extract::State, http::StatusCode, Json};

use super::error::{ApiError, ApiOperation};
use super::extract::{Caller, EntityId, QueryParams};
use super::params::TodoListParams;
use crate::listing::{paginate, resolve_sort, PaginatedResponse, Scope};
use crate::models::Todo;
use crate::repository::{EntityStore, Storage};
use crate::schemas::TodoResponse;
use crate::state::AppState;

/// `GET /admin/todo`
pub async fn list_all_todos<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    QueryParams(params): QueryParams<TodoListParams>,
) -> Result<Json<PaginatedResponse<TodoResponse>>, ApiError> {
    let grant = caller.admin()?;
    let admin_id = grant.admin_id();

    let filters = params.filters()?;
    let order = resolve_sort::<Todo>(params.sort())?;
    let page = params.page_request(&state.config().pagination)?;

    let query = filters.apply(Scope::unrestricted(grant)).order(order);
    let response: PaginatedResponse<TodoResponse> =
        paginate(state.storage().todos(), &query, page)
            .await
            .map_err(|e| ApiError::from(e).with_operation(ApiOperation::List))?;

    tracing::debug!(admin_id, total = response.total_cnt, "Admin listed todos");
    Ok(Json(response))
}

/// `DELETE /admin/todo/{id}`
pub async fn delete_any_todo<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    id: Result<EntityId, ApiError>,
) -> Result<StatusCode, ApiError> {
    let grant = caller.admin()?;
    let EntityId(id) = id?;

    state
        .storage()
        .todos()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Delete))?;

    tracing::info!(todo_id = id, admin_id = grant.admin_id(), "Admin deleted todo");
    Ok(StatusCode::NO_CONTENT)
}

