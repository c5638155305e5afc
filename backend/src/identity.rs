//! Identity-token verification.
//!
//! The API never issues tokens; it only turns a bearer token into the
//! caller's [`Identity`]. Production uses Firebase ID tokens, local
//! development and the test suite use an HS256 shared secret.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header, errors::ErrorKind, jwk::JwkSet, Algorithm, DecodingKey, Validation,
};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// The authenticated caller, attached to every task request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub owner_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token expired")]
    Expired,

    #[error("token rejected: {0}")]
    Rejected(String),

    #[error("verification unavailable: {0}")]
    Unavailable(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            _ => VerifyError::Rejected(error.to_string()),
        }
    }
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct IdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

impl IdClaims {
    fn into_identity(self) -> Result<Identity, VerifyError> {
        if self.sub.is_empty() {
            return Err(VerifyError::Rejected("token has an empty subject".to_string()));
        }
        Ok(Identity {
            owner_id: self.sub,
            email: self.email,
        })
    }
}

/// HS256 tokens signed with a secret shared with whoever mints them.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let data = decode::<IdClaims>(token, &self.key, &self.validation)?;
        data.claims.into_identity()
    }
}

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const KEY_SET_TTL: Duration = Duration::from_secs(60 * 60);

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens (RS256) against Google's published key set.
pub struct FirebaseVerifier {
    project_id: String,
    client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            client: reqwest::Client::new(),
            cache: RwLock::new(None),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < KEY_SET_TTL {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(DecodingKey::from_jwk(jwk)?);
                    }
                }
            }
        }

        // Missing or stale: Google rotates keys, so refetch before rejecting.
        let keys = self.fetch_keys().await?;
        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()?
            .ok_or_else(|| VerifyError::Rejected(format!("unknown signing key {kid}")));

        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        key
    }

    async fn fetch_keys(&self) -> Result<JwkSet, VerifyError> {
        tracing::debug!("fetching Firebase signing keys");
        self.client
            .get(FIREBASE_JWKS_URL)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| VerifyError::Unavailable(error.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|error| VerifyError::Unavailable(error.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Rejected(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Rejected("token has no key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<IdClaims>(token, &key, &self.validation())?;
        data.claims.into_identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        email: Option<&'a str>,
        exp: i64,
    }

    fn mint(secret: &str, sub: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub,
            email: Some("student@example.com"),
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let verifier = SharedSecretVerifier::new("secret");
        let identity = verifier.verify(&mint("secret", "uid-1", 3600)).await.unwrap();
        assert_eq!(identity.owner_id, "uid-1");
        assert_eq!(identity.email.as_deref(), Some("student@example.com"));
    }

    #[tokio::test]
    async fn expired_token_is_classified_as_expired() {
        let verifier = SharedSecretVerifier::new("secret");
        let error = verifier
            .verify(&mint("secret", "uid-1", -3600))
            .await
            .unwrap_err();
        assert!(matches!(error, VerifyError::Expired));
    }

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let verifier = SharedSecretVerifier::new("secret");
        let error = verifier
            .verify(&mint("other", "uid-1", 3600))
            .await
            .unwrap_err();
        assert!(matches!(error, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn garbage_and_empty_subjects_are_rejected() {
        let verifier = SharedSecretVerifier::new("secret");
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(VerifyError::Rejected(_))
        ));
        assert!(matches!(
            verifier.verify(&mint("secret", "", 3600)).await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn firebase_verifier_rejects_non_rs256_before_fetching_keys() {
        let verifier = FirebaseVerifier::new("planner");
        let error = verifier
            .verify(&mint("secret", "uid-1", 3600))
            .await
            .unwrap_err();
        assert!(matches!(error, VerifyError::Rejected(_)));
    }
}
