//! Signed bearer tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::account::{AccountClaims, AccountContext, Role},
};

/// Issues and verifies HS256 tokens. There is no refresh: an expired token
/// means logging in again.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for an account
    pub fn issue(&self, account_id: Uuid, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = AccountClaims {
            sub: account_id.to_string(),
            account_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify signature and expiry; any failure is `Authentication`
    pub fn verify(&self, token: &str) -> AppResult<AccountContext> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<AccountClaims>(token, &self.decoding, &validation)
            .map(|data| AccountContext::from(data.claims))
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                AppError::Authentication("Invalid or expired token".to_string())
            })
    }
}
