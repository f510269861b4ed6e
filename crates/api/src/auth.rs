//! Credential store and token issuer.
//!
//! Passwords are stored as `salt$digest` where the digest is a salted
//! SHA-256. Bearer tokens are `base64url(claims).hex(sha256(secret.payload))`
//! — a compact signed-claims scheme; validation is a pure function over the
//! configured secret.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use crate::database::{Repository, User};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::{ApiError, ApiResult};

/// Auth API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

// ==================== Password hashing ====================

/// Hash a password with a fresh random salt. Output shape: `salt$digest-hex`.
pub fn hash_password(password: &str) -> String {
    let mut salt_bytes = [0u8; 16];
    for b in salt_bytes.iter_mut() {
        *b = fastrand::u8(..);
    }
    let salt = hex::encode(salt_bytes);
    let digest = salted_digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Check a password against a stored `salt$digest` hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    salted_digest(salt, password) == digest
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// ==================== Token codec ====================

/// Claims embedded in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: i64,
    pub username: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

fn sign_payload(secret: &str, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a signed token for the given user.
pub fn issue_token(user_id: i64, username: &str, secret: &str, ttl_secs: u64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user_id,
        username: username.to_string(),
        iat: now,
        exp: now + ttl_secs as i64,
    };
    // Claims are plain serializable fields; serialization cannot fail.
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
    let signature = sign_payload(secret, &payload);
    format!("{}.{}", payload, signature)
}

/// Validate a token: signature first, then expiry. Returns the claims when
/// valid, `None` otherwise.
pub fn verify_token(token: &str, secret: &str) -> Option<TokenClaims> {
    let (payload, signature) = token.split_once('.')?;
    if sign_payload(secret, payload) != signature {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    if claims.exp <= chrono::Utc::now().timestamp() {
        return None;
    }
    Some(claims)
}

/// Pull a user id out of an `Authorization: Bearer <token>` header, if the
/// header is present and the token verifies.
pub fn bearer_user_id(headers: &HeaderMap, secret: &str) -> Option<i64> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    verify_token(token, secret).map(|claims| claims.sub)
}

/// Like [`bearer_user_id`] but mandatory: a missing header and a bad token
/// are distinct auth errors.
pub fn require_user(headers: &HeaderMap, secret: &str) -> Result<i64, ApiError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("未登录".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .and_then(|token| verify_token(token, secret))
        .map(|claims| claims.sub)
        .ok_or_else(|| ApiError::Auth("Token无效".to_string()))
}

// ==================== Service ====================

/// Registration and login over the user table.
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
    token_secret: String,
    token_ttl: u64,
}

/// Token plus the freshly loaded user record.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

impl AuthService {
    pub fn new(repo: Repository, token_secret: String, token_ttl: u64) -> Self {
        Self {
            repo,
            token_secret,
            token_ttl,
        }
    }

    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    /// Create an account. Fails with Conflict when the username is taken.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
        phone: Option<&str>,
        nickname: Option<&str>,
    ) -> ApiResult<AuthPayload> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::InvalidRequest(
                "用户名和密码不能为空".to_string(),
            ));
        }

        if self.repo.username_exists(username).await? {
            return Err(ApiError::Conflict("用户名已存在".to_string()));
        }

        let created_at = chrono::Utc::now().timestamp();
        let user_id = self
            .repo
            .create_user(
                username,
                &hash_password(password),
                email,
                phone,
                nickname,
                created_at,
            )
            .await?;

        let user = self
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::Internal("刚注册的用户不存在".to_string()))?;

        info!("registered user {} (id={})", username, user_id);
        let token = issue_token(user_id, username, &self.token_secret, self.token_ttl);
        Ok(AuthPayload { token, user })
    }

    /// Verify credentials and issue a token.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthPayload> {
        let user = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;

        if !verify_password(password, &user.password_hash) {
            return Err(ApiError::Auth("密码错误".to_string()));
        }

        let token = issue_token(user.id, &user.username, &self.token_secret, self.token_ttl);
        Ok(AuthPayload { token, user })
    }
}

// ==================== Handlers ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<AuthPayload>>> {
    let payload = state
        .auth
        .register(
            &req.username,
            &req.password,
            req.email.as_deref(),
            req.phone.as_deref(),
            req.nickname.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::success_with("注册成功", payload)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthPayload>>> {
    let payload = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(ApiResponse::success_with("登录成功", payload)))
}
