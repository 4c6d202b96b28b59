//! Caller roles
//!
//! Callers present one of two fixed role tokens. Issuing and validating
//! those tokens happens elsewhere; this module only compares them.

use serde::{Deserialize, Serialize};

use crate::error::BannerError;

/// Token presented by privileged callers
pub const ADMIN_TOKEN: &str = "admin_token";

/// Token presented by ordinary callers
pub const USER_TOKEN: &str = "user_token";

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Exact match against the two known tokens
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ADMIN_TOKEN => Some(Role::Admin),
            USER_TOKEN => Some(Role::User),
            _ => None,
        }
    }

    /// Create, list, update and delete
    pub fn can_write(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Inactive banners are visible to admins only
    pub fn can_see_inactive(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// What an operation requires of its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Admin role only
    AdminOnly,
    /// Any recognized role
    AnyRole,
}

impl Access {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Access::AdminOnly => role.can_write(),
            Access::AnyRole => true,
        }
    }
}

/// Turn a presented token into a role
///
/// A missing or empty token fails with `AuthenticationMissing`; a token that
/// is not one of the two known roles fails with `AuthorizationDenied`.
pub fn authenticate(token: Option<&str>) -> Result<Role, BannerError> {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(BannerError::AuthenticationMissing),
    };

    Role::from_token(token).ok_or(BannerError::AuthorizationDenied)
}

/// Authenticate and check the role against `access` in one step
pub fn authorize(token: Option<&str>, access: Access) -> Result<Role, BannerError> {
    let role = authenticate(token)?;
    if access.permits(role) {
        Ok(role)
    } else {
        Err(BannerError::AuthorizationDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token() {
        assert_eq!(Role::from_token("admin_token"), Some(Role::Admin));
        assert_eq!(Role::from_token("user_token"), Some(Role::User));
        assert_eq!(Role::from_token("Admin_Token"), None);
        assert_eq!(Role::from_token("root"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(Role::Admin.can_write());
        assert!(Role::Admin.can_see_inactive());
        assert!(!Role::User.can_write());
        assert!(!Role::User.can_see_inactive());
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            authenticate(None),
            Err(BannerError::AuthenticationMissing)
        ));
        assert!(matches!(
            authenticate(Some("  ")),
            Err(BannerError::AuthenticationMissing)
        ));
    }

    #[test]
    fn test_unknown_token_is_denied() {
        assert!(matches!(
            authenticate(Some("guest_token")),
            Err(BannerError::AuthorizationDenied)
        ));
    }

    #[test]
    fn test_authorize_admin_only() {
        assert_eq!(
            authorize(Some(ADMIN_TOKEN), Access::AdminOnly).unwrap(),
            Role::Admin
        );
        assert!(matches!(
            authorize(Some(USER_TOKEN), Access::AdminOnly),
            Err(BannerError::AuthorizationDenied)
        ));
    }

    #[test]
    fn test_authorize_any_role() {
        assert_eq!(authorize(Some(USER_TOKEN), Access::AnyRole).unwrap(), Role::User);
        assert_eq!(
            authorize(Some(ADMIN_TOKEN), Access::AnyRole).unwrap(),
            Role::Admin
        );
    }
}
