//! Current-user endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::error::{ApiError, ApiErrorKind, ApiOperation};
use super::extract::{Caller, JsonBody, PathParam};
use crate::auth::Identity;
use crate::listing::Projection;
use crate::models::User;
use crate::repository::{Entity, EntityStore, Storage};
use crate::schemas::{PasswordChangeRequest, UserResponse};
use crate::state::AppState;

/// Message returned when the current password does not match
pub const PASSWORD_MISMATCH: &str = "Error on password verification";

async fn current_user<S: Storage>(
    state: &AppState<S>,
    identity: &Identity,
) -> Result<User, ApiError> {
    state
        .storage()
        .users()
        .find_by_id(identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found(User::NAME, identity.id.to_string()))
}

/// `GET /user`
pub async fn get_user<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
) -> Result<Json<UserResponse>, ApiError> {
    let identity = caller.authenticated()?;
    let user = current_user(&state, &identity).await?;
    Ok(Json(UserResponse::project(user)))
}

/// `PUT /user/password`
pub async fn change_password<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    body: Result<JsonBody<PasswordChangeRequest>, ApiError>,
) -> Result<StatusCode, ApiError> {
    let identity = caller.authenticated()?;
    let JsonBody(request) = body?;
    request.validate().map_err(ApiError::validation)?;

    let mut user = current_user(&state, &identity)
        .await
        .map_err(|e| e.with_operation(ApiOperation::Update))?;

    // argon2 runs on the blocking pool
    let hasher = state.hasher().clone();
    let stored_hash = user.hashed_password.clone();
    let new_hash = tokio::task::spawn_blocking(move || {
        if !hasher.verify(&request.password, &stored_hash)? {
            return Ok(None);
        }
        hasher.hash(&request.new_password).map(Some)
    })
    .await
    .map_err(|e| ApiError::internal(format!("password hashing task failed: {}", e)))?
    .map_err(ApiError::from)?;

    let Some(new_hash) = new_hash else {
        tracing::warn!(user_id = identity.id, "Password change with wrong current password");
        return Err(ApiError::new(
            ApiOperation::Update,
            ApiErrorKind::Unauthenticated,
            PASSWORD_MISMATCH,
        ));
    };

    user.hashed_password = new_hash;
    state
        .storage()
        .users()
        .update(user)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Update))?;

    tracing::info!(user_id = identity.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /user/phonenumber/{phone}`
pub async fn change_phone_number<S: Storage>(
    State(state): State<AppState<S>>,
    caller: Caller,
    PathParam(phone_number): PathParam<String>,
) -> Result<StatusCode, ApiError> {
    let identity = caller.authenticated()?;

    let phone_number = phone_number.trim().to_string();
    if phone_number.is_empty() {
        return Err(ApiError::validation("phone number cannot be empty"));
    }

    let mut user = current_user(&state, &identity)
        .await
        .map_err(|e| e.with_operation(ApiOperation::Update))?;
    user.phone_number = Some(phone_number);

    state
        .storage()
        .users()
        .update(user)
        .await
        .map_err(|e| {
            let error = ApiError::from(e).with_operation(ApiOperation::Update);
            match error.kind {
                ApiErrorKind::Conflict => error.with_message("Phone number already in use"),
                _ => error,
            }
        })?;

    tracing::info!(user_id = identity.id, "Phone number changed");
    Ok(StatusCode::NO_CONTENT)
}
