use serde::{Deserialize, Serialize};

use super::error::{AuthError, AuthErrorKind};

/// Claim set decoded from a verified access token. Lives for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    /// Presence is enforced during verification; zero only if absent.
    #[serde(default)]
    pub exp: u64,
    /// `None` when the token carries no `permissions` claim at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}

/// Decide whether `claims` grant `required`.
///
/// Matching is exact and case-sensitive; there are no wildcards.
///
/// # Errors
///
/// [`AuthErrorKind::PermissionsClaimMissing`] when the token has no
/// `permissions` claim, [`AuthErrorKind::PermissionDenied`] when `required`
/// is not among them.
pub fn authorize(claims: &Claims, required: &str) -> Result<(), AuthError> {
    if claims.permissions.is_none() {
        return Err(AuthError::new(
            AuthErrorKind::PermissionsClaimMissing,
            "Permissions not included in JWT.",
        ));
    }

    if !claims.has_permission(required) {
        return Err(AuthError::new(
            AuthErrorKind::PermissionDenied,
            "Permission not found.",
        ));
    }

    Ok(())
}
