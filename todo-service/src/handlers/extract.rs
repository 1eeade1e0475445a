//! Request extractors
//!
//! Thin wrappers around axum's extractors whose rejections render as
//! [`ApiError`] (`400 {"detail": ...}`) instead of axum's plain-text bodies,
//! plus [`Caller`], which hands the identity middleware's result to the
//! authorization policy.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::auth::{policy, Access, AdminGrant, Decision, Identity};

/// JSON body; malformed or mistyped bodies answer 400
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string; undecodable query strings answer 400
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// A single path segment
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Primary key from the path; must be at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let PathParam(id) = PathParam::<i64>::from_request_parts(parts, state).await?;
        if id < 1 {
            return Err(ApiError::validation("id must be at least 1"));
        }
        Ok(Self(id))
    }
}

/// Whoever made the request, if the identity middleware recognized them
///
/// Extraction never fails; handlers turn a missing identity into a 401 by
/// asking the policy.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    /// Identity of a caller the policy allows `access` for
    pub fn require(self, access: Access) -> Result<Identity, ApiError> {
        match policy::evaluate(self.0.as_ref(), access) {
            Decision::Allow => self
                .0
                .ok_or_else(|| ApiError::internal("policy allowed a request without identity")),
            Decision::Deny(reason) => Err(reason.into()),
        }
    }

    /// Shorthand for [`Access::Authenticated`]
    pub fn authenticated(self) -> Result<Identity, ApiError> {
        self.require(Access::Authenticated)
    }

    /// Proof of admin access
    pub fn admin(&self) -> Result<AdminGrant, ApiError> {
        policy::admin_grant(self.0.as_ref()).map_err(ApiError::from)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;
    use axum::http::Request as HttpRequest;

    fn identity(role: &str) -> Identity {
        Identity {
            id: 5,
            username: "sam".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_anonymous_caller_is_unauthenticated() {
        let err = Caller(None).authenticated().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unauthenticated);
        assert_eq!(err.message, "Authentication Failed");
    }

    #[test]
    fn test_user_caller_is_not_admin() {
        let caller = Caller(Some(identity("user")));
        assert_eq!(caller.clone().authenticated().unwrap().id, 5);
        assert_eq!(caller.admin().unwrap_err().kind, ApiErrorKind::Forbidden);
    }

    #[test]
    fn test_admin_caller_gets_grant() {
        let caller = Caller(Some(identity("admin")));
        assert_eq!(caller.admin().unwrap().admin_id(), 5);
    }

    #[tokio::test]
    async fn test_caller_reads_extension() {
        let mut request = HttpRequest::builder().uri("/").body(()).unwrap();
        request.extensions_mut().insert(identity("user"));
        let (mut parts, _) = request.into_parts();

        let Caller(found) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.map(|i| i.username), Some("sam".to_string()));
    }

    #[tokio::test]
    async fn test_json_body_rejection_is_validation_error() {
        let request = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        let err = JsonBody::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
    }
}
