//! JWT identity middleware
//!
//! Validates bearer tokens and attaches the caller's [`Identity`] to the
//! request. Requests without a token pass through untouched, so public routes
//! keep working and protected handlers deny them through the policy.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

use super::token::{extract_token, Claims, TokenValidator};
use crate::auth::Identity;
use crate::{config::AuthConfig, error::Error};

/// Message returned for any token that cannot be validated
pub const INVALID_TOKEN_MESSAGE: &str = "Could not validate user";

/// JWT authentication middleware state
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    /// Create the middleware state from configuration
    ///
    /// # Errors
    ///
    /// Fails when the secret is empty or the algorithm is not an HMAC variant.
    pub fn new(config: &AuthConfig) -> Result<Self, Error> {
        if config.jwt_secret.is_empty() {
            return Err(Error::Config(Box::new(figment::Error::from(
                "auth.jwt_secret must be set (e.g. TODO_AUTH__JWT_SECRET)".to_string(),
            ))));
        }

        let algorithm = match config.algorithm.to_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            alg => {
                return Err(Error::Config(Box::new(figment::Error::from(format!(
                    "Unsupported JWT algorithm: {}",
                    alg
                )))))
            }
        };

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        // Configured iss/aud must be present, not just matching when present
        let mut required = vec!["exp"];
        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
            required.push("aud");
        }
        validation.set_required_spec_claims(&required);

        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation,
        })
    }

    /// Middleware function to validate a bearer token and inject the identity
    pub async fn middleware(
        State(auth): State<Self>,
        mut request: Request<Body>,
        next: Next,
    ) -> Result<Response, Error> {
        let token = match extract_token(request.headers()) {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(next.run(request).await),
            Err(e) => {
                tracing::debug!("Rejected Authorization header: {}", e);
                return Err(Error::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()));
            }
        };

        let claims = auth.validate_token(&token).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            Error::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
        })?;

        let identity: Identity = claims.identity();
        tracing::debug!(user_id = identity.id, role = %identity.role, "Authenticated request");

        request.extensions_mut().insert(identity);
        request.extensions_mut().insert(claims);

        Ok(next.run(request).await)
    }
}

impl TokenValidator for JwtAuth {
    fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn token(secret: &str, exp: i64) -> String {
        sign(
            secret,
            Claims {
                sub: "ann".to_string(),
                id: 3,
                role: "user".to_string(),
                exp,
                iss: None,
                aud: None,
            },
        )
    }

    fn sign(secret: &str, claims: Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(JwtAuth::new(&AuthConfig::default()).is_err());
    }

    #[test]
    fn test_asymmetric_algorithm_is_rejected() {
        let config = AuthConfig {
            algorithm: "RS256".to_string(),
            ..config()
        };
        assert!(JwtAuth::new(&config).is_err());
    }

    #[test]
    fn test_valid_token() {
        let auth = JwtAuth::new(&config()).unwrap();
        let claims = auth.validate_token(&token("test-secret", in_an_hour())).unwrap();
        assert_eq!(claims.id, 3);
        assert_eq!(claims.sub, "ann");
    }

    #[test]
    fn test_wrong_secret() {
        let auth = JwtAuth::new(&config()).unwrap();
        assert!(auth.validate_token(&token("other-secret", in_an_hour())).is_err());
    }

    #[test]
    fn test_expired_token() {
        let auth = JwtAuth::new(&config()).unwrap();
        let expired = chrono::Utc::now().timestamp() - 3600;
        assert!(auth.validate_token(&token("test-secret", expired)).is_err());
    }

    #[test]
    fn test_issuer_is_enforced() {
        let config = AuthConfig {
            issuer: Some("https://id.example.com".to_string()),
            ..config()
        };
        let auth = JwtAuth::new(&config).unwrap();
        // token carries no issuer
        assert!(auth.validate_token(&token("test-secret", in_an_hour())).is_err());
    }

    #[test]
    fn test_matching_issuer_is_accepted() {
        let config = AuthConfig {
            issuer: Some("https://id.example.com".to_string()),
            ..config()
        };
        let auth = JwtAuth::new(&config).unwrap();
        let claims = Claims {
            iss: Some("https://id.example.com".to_string()),
            ..auth_claims()
        };
        assert!(auth.validate_token(&sign("test-secret", claims)).is_ok());

        let foreign = Claims {
            iss: Some("https://elsewhere.example.com".to_string()),
            ..auth_claims()
        };
        assert!(auth.validate_token(&sign("test-secret", foreign)).is_err());
    }

    #[test]
    fn test_audience_is_enforced() {
        let config = AuthConfig {
            audience: Some("todo-api".to_string()),
            ..config()
        };
        let auth = JwtAuth::new(&config).unwrap();

        // token carries no audience
        assert!(auth.validate_token(&token("test-secret", in_an_hour())).is_err());

        let wrong = Claims {
            aud: Some("billing-api".to_string()),
            ..auth_claims()
        };
        assert!(auth.validate_token(&sign("test-secret", wrong)).is_err());

        let right = Claims {
            aud: Some("todo-api".to_string()),
            ..auth_claims()
        };
        let claims = auth.validate_token(&sign("test-secret", right)).unwrap();
        assert_eq!(claims.aud.as_deref(), Some("todo-api"));
    }

    fn auth_claims() -> Claims {
        Claims {
            sub: "ann".to_string(),
            id: 3,
            role: "user".to_string(),
            exp: in_an_hour(),
            iss: None,
            aud: None,
        }
    }
}
