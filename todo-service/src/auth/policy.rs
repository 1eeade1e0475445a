//! Authorization policy
//!
//! Every handler asks the policy before touching a store. The answer is a
//! [`Decision`]; admin-only paths additionally obtain an [`AdminGrant`], which
//! is the only way to build an unrestricted todo query.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ADMIN_ROLE;

/// The authenticated caller, as established by the identity middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id
    pub id: i64,
    /// Username (the token subject)
    pub username: String,
    /// Role name
    pub role: String,
}

impl Identity {
    /// Whether the caller holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Access level an operation needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any authenticated caller
    Authenticated,
    /// Callers holding the admin role
    Admin,
}

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity on the request
    Unauthenticated,
    /// Identity present but lacking the required role
    NotAdmin,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no authenticated identity"),
            Self::NotAdmin => write!(f, "admin role required"),
        }
    }
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The caller may proceed
    Allow,
    /// The caller may not proceed
    Deny(DenyReason),
}

/// Proof that the caller was allowed admin access
///
/// Cannot be constructed outside this module.
#[derive(Debug, Clone)]
pub struct AdminGrant {
    admin_id: i64,
}

impl AdminGrant {
    /// Id of the admin the grant was issued to
    pub fn admin_id(&self) -> i64 {
        self.admin_id
    }
}

/// Decide whether `identity` has `access`
///
/// # Example
///
/// ```rust
/// use todo_service::auth::{policy, Access, Decision, DenyReason, Identity};
///
/// let user = Identity { id: 1, username: "ann".into(), role: "user".into() };
/// assert_eq!(policy::evaluate(Some(&user), Access::Authenticated), Decision::Allow);
/// assert_eq!(
///     policy::evaluate(Some(&user), Access::Admin),
///     Decision::Deny(DenyReason::NotAdmin)
/// );
/// assert_eq!(
///     policy::evaluate(None, Access::Authenticated),
///     Decision::Deny(DenyReason::Unauthenticated)
/// );
/// ```
pub fn evaluate(identity: Option<&Identity>, access: Access) -> Decision {
    match (identity, access) {
        (None, _) => Decision::Deny(DenyReason::Unauthenticated),
        (Some(_), Access::Authenticated) => Decision::Allow,
        (Some(identity), Access::Admin) if identity.is_admin() => Decision::Allow,
        (Some(_), Access::Admin) => Decision::Deny(DenyReason::NotAdmin),
    }
}

/// Issue an [`AdminGrant`] when the policy allows admin access
pub fn admin_grant(identity: Option<&Identity>) -> Result<AdminGrant, DenyReason> {
    match (evaluate(identity, Access::Admin), identity) {
        (Decision::Allow, Some(identity)) => Ok(AdminGrant {
            admin_id: identity.id,
        }),
        (Decision::Deny(reason), _) => Err(reason),
        (Decision::Allow, None) => Err(DenyReason::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            id: 5,
            username: "someone".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_authenticated_access() {
        assert_eq!(
            evaluate(Some(&identity("user")), Access::Authenticated),
            Decision::Allow
        );
        assert_eq!(
            evaluate(Some(&identity("admin")), Access::Authenticated),
            Decision::Allow
        );
        assert_eq!(
            evaluate(None, Access::Authenticated),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_admin_access() {
        assert_eq!(
            evaluate(Some(&identity("admin")), Access::Admin),
            Decision::Allow
        );
        assert_eq!(
            evaluate(Some(&identity("Admin")), Access::Admin),
            Decision::Deny(DenyReason::NotAdmin)
        );
        assert_eq!(
            evaluate(None, Access::Admin),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_admin_grant() {
        let grant = admin_grant(Some(&identity("admin"))).unwrap();
        assert_eq!(grant.admin_id(), 5);
        assert_eq!(
            admin_grant(Some(&identity("user"))).unwrap_err(),
            DenyReason::NotAdmin
        );
        assert_eq!(admin_grant(None).unwrap_err(), DenyReason::Unauthenticated);
    }
}
