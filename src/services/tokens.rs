use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from session tokens and password hashing
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("Token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 session tokens and hashes passwords
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    bcrypt_cost: u32,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_hours * 3600,
            bcrypt_cost,
        }
    }

    /// Sign a session token for a user, valid from now
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    /// Sign a session token issued at `iat` (seconds since the epoch)
    pub fn issue_at(&self, user_id: i64, iat: i64) -> Result<String, TokenError> {
        let claims = Claims {
            id: user_id,
            iat,
            exp: iat + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, password: &str) -> Result<String, TokenError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;

        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Compare a password with a stored hash on the blocking pool
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, TokenError> {
        let password = password.to_string();
        let hash = hash.to_string();

        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(matches)
    }
}
