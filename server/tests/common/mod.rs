//! Shared helpers: a symmetric JWK set, token minting and an in-memory app.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use brewhouse_server::api;
use brewhouse_server::auth::{KeyStore, Verifier};
use brewhouse_server::db::DrinkStore;
use brewhouse_server::state::AppState;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const SECRET: &[u8] = b"brewhouse-integration-secret";
pub const KID: &str = "test-key";
pub const ISSUER: &str = "https://brewhouse.test/";
pub const AUDIENCE: &str = "drinks";

pub const MANAGER: &[&str] = &[
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];
pub const BARISTA: &[&str] = &["get:drinks-detail"];

pub fn jwks_json() -> Value {
    json!({
        "keys": [{
            "kty": "oct",
            "kid": KID,
            "alg": "HS256",
            "k": URL_SAFE_NO_PAD.encode(SECRET)
        }]
    })
}

pub fn jwk_set() -> JwkSet {
    serde_json::from_value(jwks_json()).unwrap()
}

fn now() -> i64 {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    i64::try_from(secs).unwrap()
}

/// Sign arbitrary claims with the test key.
pub fn sign(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

/// A valid token carrying `permissions`, or no `permissions` claim at all.
pub fn token(permissions: Option<&[&str]>) -> String {
    let mut claims = json!({
        "sub": "auth0|tester",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now() + 3600,
    });
    if let Some(perms) = permissions {
        claims["permissions"] = json!(perms);
    }
    sign(&claims)
}

/// A token with the right `kid` but signed by a different secret.
pub fn token_signed_with(secret: &[u8], permissions: &[&str]) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    let claims = json!({
        "sub": "auth0|forger",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now() + 3600,
        "permissions": permissions,
    });
    encode(&header, &claims, &EncodingKey::from_secret(secret)).unwrap()
}

pub fn expired_token(permissions: &[&str]) -> String {
    sign(&json!({
        "sub": "auth0|tester",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now() - 3600,
        "permissions": permissions,
    }))
}

pub fn verifier(keys: KeyStore) -> Arc<Verifier> {
    Arc::new(Verifier::new(Arc::new(keys), ISSUER, AUDIENCE))
}

pub async fn create_test_app() -> Router {
    let store = DrinkStore::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    let state = Arc::new(AppState::new(store, verifier(KeyStore::from_jwk_set(&jwk_set()))));
    api::create_router(state, &["*".to_string()])
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = body.map_or_else(Body::empty, |body| {
        Body::from(serde_json::to_string(&body).unwrap())
    });
    request_raw(app, method, uri, bearer.map(|t| format!("Bearer {t}")), body).await
}

/// Send a request with a literal `Authorization` value and raw body.
pub async fn request_raw(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<String>,
    body: Body,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        req = req.header("authorization", value);
    }

    let response = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}
