use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::claims::Claims;
use super::error::{AuthError, AuthErrorKind};
use super::keys::KeyStore;

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

/// Verifies bearer tokens against the signing key set and the expected
/// issuer and audience.
pub struct Verifier {
    keys: Arc<KeyStore>,
    issuer: String,
    audience: String,
    leeway_secs: u64,
}

impl Verifier {
    pub fn new(keys: Arc<KeyStore>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_secs: 0,
        }
    }

    #[must_use]
    pub const fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    pub fn keys(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    /// Verify `token` and return its claim set.
    ///
    /// Checks run in order: token shape, header `kid`, key lookup,
    /// signature, issuer/audience, expiry. The first failure wins.
    ///
    /// # Errors
    ///
    /// An [`AuthError`] whose kind names the failed check.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.is_empty() || token.split('.').count() != 3 {
            return Err(AuthError::new(
                AuthErrorKind::MalformedToken,
                "Unable to parse authentication token.",
            ));
        }

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Undecodable token header");
            AuthError::new(
                AuthErrorKind::MalformedToken,
                "Unable to parse authentication token header.",
            )
        })?;

        let kid = header.kid.as_deref().ok_or_else(|| {
            AuthError::new(AuthErrorKind::MalformedToken, "Authorization malformed.")
        })?;

        let key = self.keys.get(kid).await?;

        if header.alg != key.algorithm {
            tracing::debug!(kid = %kid, token_alg = ?header.alg, key_alg = ?key.algorithm, "Algorithm mismatch");
            return Err(AuthError::new(
                AuthErrorKind::InvalidSignature,
                "Token algorithm does not match signing key.",
            ));
        }

        let mut validation = Validation::new(key.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        // Expiry is checked below, after issuer and audience.
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &key.key, &validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if claims.exp.saturating_add(self.leeway_secs) < now_unix_secs() {
            return Err(AuthError::new(AuthErrorKind::TokenExpired, "Token expired."));
        }

        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_) => AuthError::new(
            AuthErrorKind::InvalidSignature,
            "Token signature is invalid.",
        ),
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Json(_) => AuthError::new(
            AuthErrorKind::InvalidClaims,
            "Incorrect claims. Please, check the audience and issuer.",
        ),
        ErrorKind::ExpiredSignature => {
            AuthError::new(AuthErrorKind::TokenExpired, "Token expired.")
        }
        _ => AuthError::new(
            AuthErrorKind::MalformedToken,
            "Unable to parse authentication token.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"brewhouse-verifier-test-secret";
    const ISSUER: &str = "https://tenant.example.com/";
    const AUDIENCE: &str = "drinks";

    fn verifier() -> Verifier {
        let set: JwkSet = serde_json::from_value(json!({
            "keys": [{"kty": "oct", "kid": "k1", "alg": "HS256", "k": URL_SAFE_NO_PAD.encode(SECRET)}]
        }))
        .unwrap();
        Verifier::new(Arc::new(KeyStore::from_jwk_set(&set)), ISSUER, AUDIENCE)
    }

    fn sign(header: &Header, claims: &serde_json::Value, secret: &[u8]) -> String {
        encode(header, claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn header(kid: Option<&str>) -> Header {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = kid.map(ToString::to_string);
        header
    }

    fn claims_json(exp_offset: i64) -> serde_json::Value {
        let exp = i64::try_from(now_unix_secs()).unwrap() + exp_offset;
        json!({
            "sub": "auth0|manager",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": exp,
            "permissions": ["get:drinks-detail", "post:drinks"]
        })
    }

    async fn verify_err(token: &str) -> AuthErrorKind {
        verifier().verify(token).await.unwrap_err().kind()
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let token = sign(&header(Some("k1")), &claims_json(3600), SECRET);
        let claims = verifier().verify(&token).await.unwrap();
        assert_eq!(claims.sub, "auth0|manager");
        assert!(claims.has_permission("post:drinks"));
    }

    #[tokio::test]
    async fn accepts_audience_array() {
        let mut claims = claims_json(3600);
        claims["aud"] = json!(["https://other.example.com/userinfo", AUDIENCE]);
        let token = sign(&header(Some("k1")), &claims, SECRET);
        assert!(verifier().verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_shapes() {
        assert_eq!(verify_err("").await, AuthErrorKind::MalformedToken);
        assert_eq!(verify_err("only.two").await, AuthErrorKind::MalformedToken);
        assert_eq!(verify_err("a.b.c.d").await, AuthErrorKind::MalformedToken);
        assert_eq!(verify_err("!!!.###.$$$").await, AuthErrorKind::MalformedToken);
    }

    #[tokio::test]
    async fn rejects_missing_kid() {
        let token = sign(&header(None), &claims_json(3600), SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::MalformedToken);
    }

    #[tokio::test]
    async fn rejects_unknown_kid() {
        let token = sign(&header(Some("k2")), &claims_json(3600), SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::UnknownSigningKey);
    }

    #[tokio::test]
    async fn rejects_bad_signature() {
        let token = sign(&header(Some("k1")), &claims_json(3600), b"some-other-secret");
        assert_eq!(verify_err(&token).await, AuthErrorKind::InvalidSignature);
    }

    #[tokio::test]
    async fn rejects_algorithm_other_than_keys() {
        let mut h = Header::new(Algorithm::HS384);
        h.kid = Some("k1".to_string());
        let token = sign(&h, &claims_json(3600), SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::InvalidSignature);
    }

    #[tokio::test]
    async fn rejects_wrong_issuer_or_audience() {
        let mut claims = claims_json(3600);
        claims["iss"] = json!("https://evil.example.com/");
        let token = sign(&header(Some("k1")), &claims, SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::InvalidClaims);

        let mut claims = claims_json(3600);
        claims["aud"] = json!("someone-else");
        let token = sign(&header(Some("k1")), &claims, SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::InvalidClaims);
    }

    #[tokio::test]
    async fn rejects_missing_exp() {
        let mut claims = claims_json(3600);
        claims.as_object_mut().unwrap().remove("exp");
        let token = sign(&header(Some("k1")), &claims, SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::InvalidClaims);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let token = sign(&header(Some("k1")), &claims_json(-120), SECRET);
        assert_eq!(verify_err(&token).await, AuthErrorKind::TokenExpired);
    }

    #[tokio::test]
    async fn leeway_tolerates_small_skew() {
        let token = sign(&header(Some("k1")), &claims_json(-5), SECRET);
        assert!(verifier().with_leeway(60).verify(&token).await.is_ok());
    }
}
