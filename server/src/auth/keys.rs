//! Signing key set fetched from a JSON Web Key Set endpoint.
//!
//! The key set is held as an immutable snapshot. A refresh builds a complete
//! new snapshot and swaps it in, so concurrent readers only ever see a whole
//! set.

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use super::error::{AuthError, AuthErrorKind};

/// A verification key resolved from a JWK.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub algorithm: Algorithm,
    pub key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Build a signing key from a JWK. Keys without a `kid`, or whose
    /// algorithm cannot be used for signatures, yield `None`.
    pub fn from_jwk(jwk: &Jwk) -> Option<Self> {
        let kid = jwk.common.key_id.clone()?;
        let algorithm = signing_algorithm(jwk)?;
        let key = match DecodingKey::from_jwk(jwk) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(kid = %kid, error = %e, "Skipping unusable JWK");
                return None;
            }
        };
        Some(Self { kid, algorithm, key })
    }
}

/// The key's declared `alg`, else the default for its key family.
fn signing_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    if let Some(alg) = &jwk.common.key_algorithm {
        return match alg {
            KeyAlgorithm::HS256 => Some(Algorithm::HS256),
            KeyAlgorithm::HS384 => Some(Algorithm::HS384),
            KeyAlgorithm::HS512 => Some(Algorithm::HS512),
            KeyAlgorithm::ES256 => Some(Algorithm::ES256),
            KeyAlgorithm::ES384 => Some(Algorithm::ES384),
            KeyAlgorithm::RS256 => Some(Algorithm::RS256),
            KeyAlgorithm::RS384 => Some(Algorithm::RS384),
            KeyAlgorithm::RS512 => Some(Algorithm::RS512),
            KeyAlgorithm::PS256 => Some(Algorithm::PS256),
            KeyAlgorithm::PS384 => Some(Algorithm::PS384),
            KeyAlgorithm::PS512 => Some(Algorithm::PS512),
            KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
            // Encryption algorithms (RSA-OAEP etc.)
            _ => None,
        };
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Some(Algorithm::RS256),
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => Some(Algorithm::ES256),
            EllipticCurve::P384 => Some(Algorithm::ES384),
            _ => None,
        },
        AlgorithmParameters::OctetKeyPair(_) => Some(Algorithm::EdDSA),
        AlgorithmParameters::OctetKey(_) => Some(Algorithm::HS256),
    }
}

/// One complete, immutable view of the key set.
#[derive(Debug)]
pub struct KeySnapshot {
    keys: HashMap<String, SigningKey>,
    fetched_at: Instant,
}

impl KeySnapshot {
    pub fn from_jwk_set(set: &JwkSet) -> Self {
        let keys = set
            .keys
            .iter()
            .filter_map(SigningKey::from_jwk)
            .map(|k| (k.kid.clone(), k))
            .collect();

        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Same keys, with the age reset to now.
    fn renewed(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            fetched_at: Instant::now(),
        }
    }
}

enum KeySource {
    Remote { client: Client, url: String },
    Static,
}

/// Process-wide signing key set.
///
/// Fetches are serialized through `refresh_gate`: concurrent lookups that
/// find the set missing or stale wait for one fetch instead of each
/// starting their own.
pub struct KeyStore {
    source: KeySource,
    snapshot: RwLock<Option<Arc<KeySnapshot>>>,
    refresh_gate: Mutex<()>,
    refresh_after: Option<Duration>,
}

impl KeyStore {
    /// Key set served by a JWKS endpoint. Nothing is fetched until
    /// [`KeyStore::refresh`] or the first lookup.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn remote(
        url: impl Into<String>,
        refresh_after: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            source: KeySource::Remote {
                client,
                url: url.into(),
            },
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            refresh_after,
        })
    }

    /// Fixed key set that is never refetched.
    pub fn from_jwk_set(set: &JwkSet) -> Self {
        Self {
            source: KeySource::Static,
            snapshot: RwLock::new(Some(Arc::new(KeySnapshot::from_jwk_set(set)))),
            refresh_gate: Mutex::new(()),
            refresh_after: None,
        }
    }

    /// Look up the key for `kid`, fetching the set first if none is loaded
    /// or the loaded one is stale.
    ///
    /// # Errors
    ///
    /// [`AuthErrorKind::KeyFetchFailed`] if no key set could be obtained,
    /// [`AuthErrorKind::UnknownSigningKey`] if the set has no such key.
    pub async fn get(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let snapshot = self.current().await?;
        snapshot.get(kid).cloned().ok_or_else(|| {
            tracing::debug!(kid = %kid, "No signing key with this kid");
            AuthError::new(
                AuthErrorKind::UnknownSigningKey,
                "Unable to find the appropriate key.",
            )
        })
    }

    /// Fetch the key set and swap it in. Returns the number of usable keys.
    ///
    /// # Errors
    ///
    /// [`AuthErrorKind::KeyFetchFailed`] on network failure, a non-success
    /// status, or an unparseable body.
    pub async fn refresh(&self) -> Result<usize, AuthError> {
        let _gate = self.refresh_gate.lock().await;
        Ok(self.refresh_locked().await?.len())
    }

    /// Fetch and swap in a new snapshot. Caller holds `refresh_gate`.
    async fn refresh_locked(&self) -> Result<Arc<KeySnapshot>, AuthError> {
        let KeySource::Remote { client, url } = &self.source else {
            return self.snapshot.read().await.clone().ok_or_else(|| {
                AuthError::new(AuthErrorKind::KeyFetchFailed, "Signing keys unavailable.")
            });
        };

        let snapshot = Arc::new(fetch(client, url).await?);
        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn current(&self) -> Result<Arc<KeySnapshot>, AuthError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let previous = self.snapshot.read().await.clone();
        match (self.refresh_locked().await, previous) {
            (Ok(snapshot), _) => Ok(snapshot),
            (Err(e), Some(previous)) => {
                tracing::warn!(error = %e, "Key set refresh failed, keeping previous keys");
                // Restart the refresh window so the next lookups do not retry at once.
                let renewed = Arc::new(previous.renewed());
                *self.snapshot.write().await = Some(Arc::clone(&renewed));
                Ok(renewed)
            }
            (Err(e), None) => Err(e),
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<KeySnapshot>> {
        self.snapshot
            .read()
            .await
            .clone()
            .filter(|snapshot| !self.is_stale(snapshot))
    }

    fn is_stale(&self, snapshot: &KeySnapshot) -> bool {
        matches!(self.source, KeySource::Remote { .. })
            && self
                .refresh_after
                .is_some_and(|ttl| snapshot.fetched_at.elapsed() >= ttl)
    }
}

async fn fetch(client: &Client, url: &str) -> Result<KeySnapshot, AuthError> {
    tracing::info!(jwks_url = %url, "Fetching signing keys");

    let fetch_failed = |detail: String| {
        tracing::error!(jwks_url = %url, error = %detail, "Failed to fetch signing keys");
        AuthError::new(
            AuthErrorKind::KeyFetchFailed,
            format!("Unable to fetch signing keys: {detail}"),
        )
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(fetch_failed(format!("HTTP {}", response.status())));
    }

    let set: JwkSet = response
        .json()
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;

    let snapshot = KeySnapshot::from_jwk_set(&set);
    tracing::info!(jwks_url = %url, keys = snapshot.len(), "Loaded signing keys");
    Ok(snapshot)
}
