// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User registration and bearer token handling.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 hashes with a per-user random
//! salt. Tokens are HS256 JWTs; nothing about them is stored server side, so
//! any token with a valid signature, issuer and expiry is accepted.

use crate::config::Config;
use crate::db::{StoreError, UserRepository};
use crate::models::User;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Checked against when the user is unknown, so that a failed login costs
/// the same whether or not the username exists.
const DUMMY_PASSWORD: &str = "job-offers-unknown-user";

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username {0} already taken")]
    UsernameTaken(String),

    #[error("Bad Credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal auth error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Registration, login and token validation.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    signing_key: Arc<[u8]>,
    issuer: String,
    token_ttl_secs: u64,
    hash_iterations: NonZeroU32,
    dummy_hash: Arc<str>,
    rng: SystemRandom,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &Config) -> Self {
        Self {
            users,
            signing_key: Arc::from(config.jwt_signing_key.as_slice()),
            issuer: config.jwt_issuer.clone(),
            token_ttl_secs: config.jwt_expiration_days.saturating_mul(24 * 60 * 60),
            hash_iterations: config.password_hash_iterations,
            dummy_hash: Arc::from(encode_password_hash(
                config.password_hash_iterations,
                &[0u8; SALT_LEN],
                DUMMY_PASSWORD,
            )),
            rng: SystemRandom::new(),
        }
    }

    /// Register a new user.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = User {
            username: username.to_string(),
            password_hash: self.hash_password(password)?,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        match self.users.create(&user).await {
            Ok(()) => {
                tracing::info!(username, "User registered");
                Ok(user)
            }
            Err(e) if e.is_duplicate_key() => Err(AuthError::UsernameTaken(username.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a bearer token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            tracing::debug!(username, "Login for unknown user");
            verify_password(&self.dummy_hash, password);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&user.password_hash, password) {
            tracing::debug!(username, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token(&user.username)
    }

    /// Validate a bearer token and return the username it was issued to.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&self.signing_key), &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(data.claims.sub)
    }

    /// Create a JWT for `username`.
    pub fn issue_token(&self, username: &str) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(anyhow::Error::from)?
            .as_secs();

        let claims = Claims {
            sub: username.to_string(),
            iss: self.issuer.clone(),
            iat: now as usize,
            exp: now.saturating_add(self.token_ttl_secs) as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| AuthError::Internal(e.into()))
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| anyhow::anyhow!("Failed to generate password salt"))?;

        Ok(encode_password_hash(self.hash_iterations, &salt, password))
    }
}

/// Derive and encode as `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
fn encode_password_hash(iterations: NonZeroU32, salt: &[u8], password: &str) -> String {
    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(PBKDF2_ALG, iterations, salt, password.as_bytes(), &mut hash);

    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Constant-time check of `password` against an encoded hash.
fn verify_password(encoded: &str, password: &str) -> bool {
    let parts: Vec<&str> = encoded.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        tracing::error!("Malformed password hash in store");
        return false;
    };
    if *scheme != HASH_SCHEME {
        tracing::error!(scheme = %scheme, "Unknown password hash scheme");
        return false;
    }

    let (Ok(iterations), Ok(salt), Ok(hash)) = (
        iterations.parse::<NonZeroU32>(),
        STANDARD_NO_PAD.decode(salt),
        STANDARD_NO_PAD.decode(hash),
    ) else {
        tracing::error!("Malformed password hash in store");
        return false;
    };

    pbkdf2::verify(PBKDF2_ALG, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn service() -> (MemoryDb, AuthService) {
        let db = MemoryDb::new();
        let service = AuthService::new(Arc::new(db.clone()), &Config::default());
        (db, service)
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (db, auth) = service();

        auth.register("someUser", "somePassword").await.unwrap();

        let stored = db.find_by_username("someUser").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(!stored.password_hash.contains("somePassword"));
        assert!(verify_password(&stored.password_hash, "somePassword"));
        assert!(!verify_password(&stored.password_hash, "somePassword!"));
    }

    #[tokio::test]
    async fn test_same_password_gets_different_salts() {
        let (_db, auth) = service();

        let a = auth.hash_password("hunter2").unwrap();
        let b = auth.hash_password("hunter2").unwrap();

        assert_ne!(a, b);
        assert!(verify_password(&a, "hunter2"));
        assert!(verify_password(&b, "hunter2"));
    }

    #[tokio::test]
    async fn test_register_twice_is_username_taken() {
        let (_db, auth) = service();
        auth.register("someUser", "somePassword").await.unwrap();

        let err = auth.register("someUser", "other").await.unwrap_err();

        assert!(matches!(err, AuthError::UsernameTaken(ref name) if name == "someUser"));
    }

    #[tokio::test]
    async fn test_authenticate_issues_token_for_valid_credentials() {
        let (_db, auth) = service();
        auth.register("someUser", "somePassword").await.unwrap();

        let token = auth.authenticate("someUser", "somePassword").await.unwrap();

        assert_eq!(auth.validate(&token).unwrap(), "someUser");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let (_db, auth) = service();
        auth.register("someUser", "somePassword").await.unwrap();

        let wrong_password = auth.authenticate("someUser", "nope").await.unwrap_err();
        let unknown_user = auth.authenticate("nobody", "somePassword").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_validate_rejects_garbage_and_foreign_tokens() {
        let (_db, auth) = service();
        let mut other_config = Config::default();
        other_config.jwt_signing_key = b"a_completely_different_signing_key".to_vec();
        let other = AuthService::new(Arc::new(MemoryDb::new()), &other_config);

        let foreign = other.issue_token("someUser").unwrap();

        assert!(matches!(
            auth.validate("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(auth.validate(&foreign), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_validate_rejects_wrong_issuer() {
        let (_db, auth) = service();
        let mut other_config = Config::default();
        other_config.jwt_issuer = "someone-else".to_string();
        let other = AuthService::new(Arc::new(MemoryDb::new()), &other_config);

        let token = other.issue_token("someUser").unwrap();

        assert!(matches!(auth.validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_unknown_user_check_does_full_hash_work() {
        let (_db, auth) = service();

        // Well formed and at the configured cost, so verification runs the
        // full derivation instead of bailing out on a parse error.
        assert!(auth.dummy_hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password(&auth.dummy_hash, DUMMY_PASSWORD));
    }

    #[tokio::test]
    async fn test_dummy_password_does_not_log_in_unknown_user() {
        let (_db, auth) = service();

        let err = auth.authenticate("nobody", DUMMY_PASSWORD).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_verify_password_rejects_malformed_hashes() {
        assert!(!verify_password("", "x"));
        assert!(!verify_password("plain-text-password", "plain-text-password"));
        assert!(!verify_password("bcrypt$10$abc$def", "x"));
        assert!(!verify_password("pbkdf2-sha256$0$abc$def", "x"));
    }
}
