//! Authentication and authorization
//!
//! - [`PasswordHasher`]: Argon2id hashing for stored credentials
//! - [`policy`]: who may do what, and the [`AdminGrant`] proof for admin paths
//!
//! Token issuance (login, registration) is handled by an external identity
//! provider; this service only validates tokens, see
//! [`crate::middleware::JwtAuth`].

pub mod password;
pub mod policy;

pub use password::PasswordHasher;
pub use policy::{Access, AdminGrant, Decision, DenyReason, Identity};
