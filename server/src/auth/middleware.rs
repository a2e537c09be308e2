use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::claims::{authorize, Claims};
use super::error::{AuthError, AuthErrorKind};
use super::verifier::Verifier;

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// [`AuthErrorKind::MissingAuthHeader`] when there is no header,
/// [`AuthErrorKind::MalformedAuthHeader`] for anything but exactly one
/// `Bearer` scheme word followed by a single token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        AuthError::new(
            AuthErrorKind::MissingAuthHeader,
            "Authorization header is expected.",
        )
    })?;

    let value = value.to_str().map_err(|_| {
        AuthError::new(
            AuthErrorKind::MalformedAuthHeader,
            "Authorization header is not valid text.",
        )
    })?;

    let parts: Vec<&str> = value.split(' ').collect();

    if !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(AuthError::new(
            AuthErrorKind::MalformedAuthHeader,
            "Authorization header must start with \"Bearer\".",
        ));
    }

    match parts.as_slice() {
        [_, token] if !token.is_empty() => Ok(token),
        [_] | [_, _] => Err(AuthError::new(
            AuthErrorKind::MalformedAuthHeader,
            "Token not found.",
        )),
        _ => Err(AuthError::new(
            AuthErrorKind::MalformedAuthHeader,
            "Authorization header must be bearer token.",
        )),
    }
}

/// Authorize a request: extract the bearer token, verify it, and check that
/// it grants `required`.
///
/// # Errors
///
/// The first [`AuthError`] raised by header parsing, verification, or the
/// permission check.
pub async fn guard(
    verifier: &Verifier,
    headers: &HeaderMap,
    required: &str,
) -> Result<Claims, AuthError> {
    let token = bearer_token(headers)?;
    let claims = verifier.verify(token).await?;
    authorize(&claims, required)?;
    Ok(claims)
}

/// Middleware state binding a verifier to one required permission.
#[derive(Clone)]
pub struct RequirePermission {
    verifier: Arc<Verifier>,
    permission: &'static str,
}

impl RequirePermission {
    pub fn new(verifier: &Arc<Verifier>, permission: &'static str) -> Self {
        Self {
            verifier: Arc::clone(verifier),
            permission,
        }
    }
}

/// Per-route middleware: rejects the request before the handler runs unless
/// the bearer token grants the bound permission. On success the [`Claims`]
/// are inserted into the request extensions.
pub async fn require_permission(
    State(gate): State<RequirePermission>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = match guard(&gate.verifier, request.headers(), gate.permission).await {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(
                permission = gate.permission,
                kind = %e.kind(),
                path = %request.uri().path(),
                "Request rejected"
            );
            return Err(e);
        }
    };

    tracing::debug!(permission = gate.permission, sub = %claims.sub, "Request authorized");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
