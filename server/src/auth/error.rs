use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;

/// Inline error envelope for auth failures (avoids coupling to api module).
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: u16,
    message: String,
}

/// Every way an authorization check can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    MissingAuthHeader,
    MalformedAuthHeader,
    MalformedToken,
    UnknownSigningKey,
    InvalidSignature,
    InvalidClaims,
    TokenExpired,
    PermissionsClaimMissing,
    PermissionDenied,
    KeyFetchFailed,
}

impl AuthErrorKind {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::MissingAuthHeader
            | Self::MalformedAuthHeader
            | Self::MalformedToken
            | Self::UnknownSigningKey
            | Self::InvalidSignature
            | Self::InvalidClaims
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            // A token without the claim is a provider configuration problem,
            // not an authorization decision.
            Self::PermissionsClaimMissing => StatusCode::BAD_REQUEST,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::KeyFetchFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "missing_auth_header",
            Self::MalformedAuthHeader => "malformed_auth_header",
            Self::MalformedToken => "malformed_token",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidClaims => "invalid_claims",
            Self::TokenExpired => "token_expired",
            Self::PermissionsClaimMissing => "permissions_claim_missing",
            Self::PermissionDenied => "permission_denied",
            Self::KeyFetchFailed => "key_fetch_failed",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authorization failure. The message is returned to the caller verbatim.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub const fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        counter!("brewhouse_auth_failures_total", "kind" => self.kind.as_str()).increment(1);

        let status = self.status();
        let body = Json(ErrorResponse {
            success: false,
            error: status.as_u16(),
            message: self.message,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_failure_kind() {
        assert_eq!(AuthErrorKind::MissingAuthHeader.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthErrorKind::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthErrorKind::PermissionsClaimMissing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthErrorKind::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthErrorKind::KeyFetchFailed.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_uses_common_envelope() {
        let response =
            AuthError::new(AuthErrorKind::PermissionDenied, "Permission not found.").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], 403);
        assert_eq!(json["message"], "Permission not found.");
    }
}
