//! Bearer token claims and extraction

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::Error;

/// Claims carried by access tokens
///
/// Tokens are minted by the identity provider with the username as subject,
/// the numeric user id and the user's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// User id
    pub id: i64,

    /// Role name
    pub role: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issuer (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// The caller these claims describe
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.sub.clone(),
            role: self.role.clone(),
        }
    }
}

/// Token validator trait
pub trait TokenValidator: Send + Sync + Clone {
    /// Validate a token and extract claims
    fn validate_token(&self, token: &str) -> Result<Claims, Error>;
}

/// Extract the bearer token from the Authorization header
///
/// Returns `Ok(None)` when the header is absent and an error when it is
/// present but not a usable bearer credential.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, Error> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_header = value
        .to_str()
        .map_err(|_| Error::Unauthorized("Invalid Authorization header".to_string()))?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(Error::Unauthorized(
            "Invalid Authorization header format".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_claims_identity() {
        let claims = Claims {
            sub: "ann".to_string(),
            id: 12,
            role: "admin".to_string(),
            exp: 0,
            iss: None,
            aud: None,
        };
        let identity = claims.identity();
        assert_eq!(identity.id, 12);
        assert_eq!(identity.username, "ann");
        assert!(identity.is_admin());
    }

    #[test]
    fn test_extract_token_missing_header() {
        assert!(extract_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_extract_token_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_token(&headers).unwrap().as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_extract_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(extract_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_token(&headers).is_err());
    }
}
