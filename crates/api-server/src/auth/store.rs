//! Credential store and token issuance over the users table.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use td_core::user::User;

const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret-change-me";
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub claims: AuthClaims,
    pub user: User,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Clone)]
pub struct AuthStore {
    pool: SqlitePool,
    jwt_secret: String,
    token_ttl_seconds: i64,
}

impl AuthStore {
    pub fn new(pool: SqlitePool) -> Self {
        let jwt_secret = std::env::var("TD_AUTH_JWT_SECRET")
            .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
        let token_ttl_seconds = std::env::var("TD_AUTH_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);

        Self {
            pool,
            jwt_secret,
            token_ttl_seconds,
        }
    }

    /// Register a new user. Conflict when the username is taken.
    pub async fn signup(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = normalize_username(username)?;
        validate_password(password)?;

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(&username)
        .bind(hash_password(password))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                AuthError::Conflict(format!("Username '{}' is already taken", username))
            }
            _ => storage_error(err),
        })?;

        self.get_user_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AuthError::Storage("Created user row is missing".to_string()))
    }

    /// Verify credentials and issue session claims.
    pub async fn signin(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let username = normalize_username(username)?;
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        // Same message for unknown user and wrong password
        let user = user.ok_or_else(invalid_credentials)?;
        if !verify_password(&user.password_hash, password) {
            return Err(invalid_credentials());
        }

        let claims = self.issue_claims(&user)?;
        Ok(AuthSession { claims, user })
    }

    /// Decode a bearer token and load the user it names.
    pub async fn authorize_bearer(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.decode_claims(token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AuthError::Unauthorized("Invalid token subject".to_string()))?;
        self.get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("User not found".to_string()))
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)
    }

    fn issue_claims(&self, user: &User) -> Result<AuthClaims, AuthError> {
        let exp = (Utc::now() + Duration::seconds(self.token_ttl_seconds)).timestamp();
        let exp = usize::try_from(exp)
            .map_err(|_| AuthError::Storage("Failed to encode token expiration".to_string()))?;

        Ok(AuthClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            exp,
        })
    }

    pub fn encode_claims(&self, claims: &AuthClaims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|err| AuthError::Storage(format!("Failed to encode JWT: {}", err)))
    }

    pub fn decode_claims(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let decoded = decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| AuthError::Unauthorized(format!("Invalid token: {}", err)))?;
        Ok(decoded.claims)
    }
}

fn invalid_credentials() -> AuthError {
    AuthError::Unauthorized("Invalid username or password".to_string())
}

fn storage_error(err: sqlx::Error) -> AuthError {
    AuthError::Storage(err.to_string())
}

fn normalize_username(username: &str) -> Result<String, AuthError> {
    let trimmed = username.trim();
    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(AuthError::InvalidInput(
            "Username must be 3 to 32 characters".to_string(),
        ));
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
    {
        return Err(AuthError::InvalidInput(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    format!(
        "v1${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    let (Some("v1"), Some(encoded_salt), Some(encoded_digest)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(encoded_salt) else {
        return false;
    };
    let Ok(expected_digest) = URL_SAFE_NO_PAD.decode(encoded_digest) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    expected_digest == hasher.finalize().as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::db;

    async fn build_store() -> AuthStore {
        let pool = db::connect_in_memory().await.unwrap();
        AuthStore::new(pool)
    }

    #[tokio::test]
    async fn signup_and_signin_roundtrip() {
        let store = build_store().await;
        let user = store.signup("casey", "verysecurepw").await.unwrap();
        assert!(user.id > 0);
        assert_eq!(user.username, "casey");

        let session = store.signin("casey", "verysecurepw").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.claims.sub, user.id.to_string());

        let token = store.encode_claims(&session.claims).unwrap();
        let authed = store.authorize_bearer(&token).await.unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn signin_rejects_wrong_password() {
        let store = build_store().await;
        store.signup("casey", "verysecurepw").await.unwrap();

        let err = store.signin("casey", "not-the-password").await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn signin_rejects_unknown_user() {
        let store = build_store().await;
        let err = store.signin("nobody", "whatever-pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = build_store().await;
        store.signup("casey", "verysecurepw").await.unwrap();

        let err = store.signup("casey", "anotherpass").await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn signup_validates_inputs() {
        let store = build_store().await;
        assert!(matches!(
            store.signup("ab", "verysecurepw").await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
        assert!(matches!(
            store.signup("casey", "short").await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
        assert!(matches!(
            store.signup("not a name", "verysecurepw").await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_rejected() {
        let store = build_store().await;
        let err = store.authorize_bearer("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[test]
    fn password_hashes_are_salted() {
        let first = hash_password("same-password");
        let second = hash_password("same-password");
        assert_ne!(first, second);
        assert!(verify_password(&first, "same-password"));
        assert!(verify_password(&second, "same-password"));
        assert!(!verify_password(&first, "other-password"));
        assert!(!verify_password("v0$bogus$hash", "same-password"));
    }
}
