use crate::application_port::CallContext;
use crate::domain_model::{ConflictField, IssuedRefreshToken, RefreshToken, User, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} already registered")]
    AlreadyExists(ConflictField),
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token invalid")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("operation canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone)]
pub enum LoginIdentifier {
    Username(String),
    Email(String),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub identifier: LoginIdentifier,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

/// The pair handed back on login and refresh.
///
/// The refresh token travels in a cookie, so it is left out of JSON bodies.
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    #[serde(skip_serializing)]
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError>;
}

/// `verify_password` returns `Ok(false)` on a mismatch and `Err` only when the
/// hasher itself fails.
#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &[u8]) -> Result<String, AuthError>;
    async fn verify_password(
        &self,
        password: &[u8],
        password_hash: &str,
    ) -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, ctx: &CallContext, request: RegisterInput)
    -> Result<UserId, AuthError>;

    async fn login_by_username(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &[u8],
    ) -> Result<User, AuthError>;

    async fn login_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &[u8],
    ) -> Result<User, AuthError>;

    async fn issue_access_token(
        &self,
        user_id: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;

    async fn issue_refresh_token(
        &self,
        ctx: &CallContext,
        user_id: UserId,
    ) -> Result<IssuedRefreshToken, AuthError>;

    async fn validate_refresh_token(
        &self,
        ctx: &CallContext,
        token: &RefreshToken,
    ) -> Result<UserId, AuthError>;

    async fn rotate_refresh_token(
        &self,
        ctx: &CallContext,
        user_id: UserId,
    ) -> Result<IssuedRefreshToken, AuthError>;

    async fn revoke(&self, ctx: &CallContext, user_id: UserId) -> Result<(), AuthError>;

    /// Verifies credentials and mints a fresh access/refresh pair.
    async fn login(&self, ctx: &CallContext, request: LoginInput)
    -> Result<LoginResult, AuthError>;

    /// Exchanges a live refresh token for a new pair, killing the presented one.
    async fn refresh(
        &self,
        ctx: &CallContext,
        refresh_token: &RefreshToken,
    ) -> Result<AuthTokens, AuthError>;
}
