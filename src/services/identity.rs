use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const JWKS_CACHE_KEY: &str = "jwks";

/// Errors that can occur when verifying a federated ID token
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Federated sign-in is not configured")]
    NotConfigured,

    #[error("Key set request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Key set unavailable: {0}")]
    KeySet(String),

    #[error("Token signed with an unknown key")]
    UnknownKey,

    #[error("ID token expired")]
    Expired,

    #[error("Invalid ID token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Identity asserted by a verified Firebase ID token
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedIdentity {
    #[serde(rename = "sub")]
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies Firebase ID tokens against Google's published signing keys
///
/// The key set is fetched on first use and cached for an hour.
pub struct IdentityVerifier {
    project_id: Option<String>,
    jwks_url: String,
    client: Client,
    keys: moka::future::Cache<&'static str, Arc<JwkSet>>,
}

impl IdentityVerifier {
    pub fn new(project_id: Option<String>, jwks_url: String) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        let keys = moka::future::CacheBuilder::new(1)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Ok(Self {
            project_id: project_id.filter(|p| !p.is_empty()),
            jwks_url,
            client,
            keys,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    async fn fetch_keys(&self) -> Result<Arc<JwkSet>, IdentityError> {
        tracing::debug!("Fetching signing keys from {}", self.jwks_url);

        let response = self.client.get(&self.jwks_url).send().await?;
        if !response.status().is_success() {
            return Err(IdentityError::KeySet(format!(
                "key endpoint returned {}",
                response.status()
            )));
        }

        let keys: JwkSet = response.json().await?;
        Ok(Arc::new(keys))
    }

    async fn key_set(&self) -> Result<Arc<JwkSet>, IdentityError> {
        self.keys
            .try_get_with(JWKS_CACHE_KEY, self.fetch_keys())
            .await
            .map_err(|e| IdentityError::KeySet(e.to_string()))
    }

    /// Verify signature, audience, issuer and expiry of an ID token
    pub async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, IdentityError> {
        let project_id = self.project_id.as_deref().ok_or(IdentityError::NotConfigured)?;

        let header = decode_header(id_token)?;
        let kid = header.kid.ok_or(IdentityError::UnknownKey)?;

        let keys = self.key_set().await?;
        let jwk = keys.find(&kid).ok_or(IdentityError::UnknownKey)?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", project_id)]);

        let data = decode::<FederatedIdentity>(id_token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => IdentityError::Expired,
            _ => IdentityError::InvalidToken(e),
        })?;

        tracing::debug!("Verified ID token for uid {}", data.claims.uid);
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token_with_kid(kid: &str) -> String {
        let mut header = Header::default();
        header.kid = Some(kid.to_string());
        encode(
            &header,
            &json!({"sub": "uid-1", "email": "a@example.com", "exp": 4_000_000_000u64}),
            &EncodingKey::from_secret(b"irrelevant"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_rejects() {
        let verifier = IdentityVerifier::new(None, "http://127.0.0.1:1/keys".to_string()).unwrap();
        assert!(!verifier.is_configured());
        assert!(matches!(
            verifier.verify(&token_with_kid("k1")).await,
            Err(IdentityError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_unknown_key_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/keys")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"keys": [{
                    "kty": "RSA",
                    "alg": "RS256",
                    "use": "sig",
                    "kid": "known",
                    "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
                    "e": "AQAB"
                }]})
                .to_string(),
            )
            .create_async()
            .await;

        let verifier =
            IdentityVerifier::new(Some("demo-project".to_string()), format!("{}/keys", server.url())).unwrap();

        assert!(matches!(
            verifier.verify(&token_with_kid("rotated-away")).await,
            Err(IdentityError::UnknownKey)
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_key_endpoint_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/keys")
            .with_status(503)
            .create_async()
            .await;

        let verifier =
            IdentityVerifier::new(Some("demo-project".to_string()), format!("{}/keys", server.url())).unwrap();

        assert!(matches!(
            verifier.verify(&token_with_kid("k1")).await,
            Err(IdentityError::KeySet(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_token() {
        let verifier = IdentityVerifier::new(Some("demo-project".to_string()), "http://127.0.0.1:1/keys".to_string())
            .unwrap();
        assert!(matches!(
            verifier.verify("garbage").await,
            Err(IdentityError::InvalidToken(_))
        ));
    }
}
