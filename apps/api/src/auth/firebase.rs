//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs signed by Google. Signing keys are published as a JWK set
//! and rotate every few hours, so they are cached and refetched when a token names
//! a `kid` we have not seen.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
/// Minimum gap between refetches triggered by unknown key ids.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const STARTUP_FETCH_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token required")]
    MissingToken,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error("Token is missing a key id")]
    MissingKeyId,

    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    #[error("Token verification failed: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Could not fetch signing keys: {0}")]
    KeyFetch(#[from] reqwest::Error),
}

/// Claims carried by a Firebase ID token that Astra relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseClaims {
    /// Firebase uid.
    pub sub: String,
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

/// Verifies Firebase ID tokens for one project. Cheap to clone.
#[derive(Clone)]
pub struct FirebaseVerifier {
    project_id: String,
    http: reqwest::Client,
    cache: Arc<RwLock<KeyCache>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(KeyCache::default())),
        }
    }

    /// Fetches signing keys at startup, retrying with exponential backoff.
    /// A failure here is not fatal: keys are fetched again on the first request.
    pub async fn warm_up(&self) {
        for attempt in 0..STARTUP_FETCH_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                tokio::time::sleep(delay).await;
            }
            match self.refresh_keys().await {
                Ok(count) => {
                    info!("Loaded {count} Firebase signing keys");
                    return;
                }
                Err(e) => warn!(
                    "Firebase key fetch attempt {} of {} failed: {e}",
                    attempt + 1,
                    STARTUP_FETCH_ATTEMPTS
                ),
            }
        }
        warn!("Starting without Firebase signing keys; will retry on first request");
    }

    async fn refresh_keys(&self) -> Result<usize, AuthError> {
        let set: JwkSet = self
            .http
            .get(FIREBASE_JWKS_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => warn!("Skipping unusable Firebase key {kid}: {e}"),
            }
        }

        let count = keys.len();
        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        Ok(count)
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = cache.keys.get(kid) {
                return Ok(key.clone());
            }
            let recently_fetched = cache
                .fetched_at
                .is_some_and(|at| at.elapsed() < MIN_REFRESH_INTERVAL);
            if recently_fetched {
                return Err(AuthError::UnknownKey(kid.to_string()));
            }
        }

        self.refresh_keys().await?;
        self.cache
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    pub async fn verify(&self, token: &str) -> Result<FirebaseClaims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let key = self.key_for(&kid).await?;

        let validation = self.validation();
        let data = decode::<FirebaseClaims>(token, &key, &validation)?;
        Ok(data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);
        validation
    }
}
