use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    refresh_ttl: Duration,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        refresh_store: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            refresh_store,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }

    pub fn with_refresh_ttl(mut self, refresh_ttl: Duration) -> Self {
        self.refresh_ttl = refresh_ttl;
        self
    }

    async fn check_password(
        &self,
        ctx: &CallContext,
        user: Option<User>,
        password: &[u8],
    ) -> Result<User, AuthError> {
        let user = user.ok_or(AuthError::NotFound)?;

        let ok = ctx
            .run(
                self.credential_hasher
                    .verify_password(password, &user.password_hash),
            )
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn mint_refresh_token(
        &self,
        ctx: &CallContext,
        user_id: UserId,
    ) -> Result<IssuedRefreshToken, AuthError> {
        let token = RefreshToken::generate()
            .map_err(|e| AuthError::InternalError(format!("refresh token entropy: {e}")))?;
        let hash = token.hash();
        let expires_at: DateTime<Utc> = Utc::now() + self.refresh_ttl;

        ctx.check()?;
        ctx.run(self.refresh_store.put(user_id, &hash, expires_at))
            .await?;

        debug!(%user_id, %expires_at, "refresh session installed");
        Ok(IssuedRefreshToken { token, expires_at })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(
        &self,
        ctx: &CallContext,
        request: RegisterInput,
    ) -> Result<UserId, AuthError> {
        let RegisterInput {
            username,
            email,
            password,
            name,
            surname,
        } = request;

        if ctx
            .run(self.user_repo.get_user_by_email(&email))
            .await?
            .is_some()
        {
            return Err(AuthError::AlreadyExists(ConflictField::Email));
        }

        if ctx
            .run(self.user_repo.get_user_by_username(&username))
            .await?
            .is_some()
        {
            return Err(AuthError::AlreadyExists(ConflictField::Username));
        }

        let password_hash = ctx
            .run(self.credential_hasher.hash_password(password.as_bytes()))
            .await?;

        let user = User {
            id: UserId::new_v4(),
            username,
            email,
            password_hash,
            name,
            surname,
        };

        ctx.check()?;
        ctx.run(self.user_repo.create_user(&user)).await?;

        info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    async fn login_by_username(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &[u8],
    ) -> Result<User, AuthError> {
        let user = ctx
            .run(self.user_repo.get_user_by_username(username))
            .await?;
        self.check_password(ctx, user, password).await
    }

    async fn login_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &[u8],
    ) -> Result<User, AuthError> {
        let user = ctx.run(self.user_repo.get_user_by_email(email)).await?;
        self.check_password(ctx, user, password).await
    }

    async fn issue_access_token(
        &self,
        user_id: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        self.token_codec.issue_access_token(user_id).await
    }

    async fn issue_refresh_token(
        &self,
        ctx: &CallContext,
        user_id: UserId,
    ) -> Result<IssuedRefreshToken, AuthError> {
        self.mint_refresh_token(ctx, user_id).await
    }

    async fn validate_refresh_token(
        &self,
        ctx: &CallContext,
        token: &RefreshToken,
    ) -> Result<UserId, AuthError> {
        if !token.is_supported_version() {
            return Err(AuthError::InvalidToken);
        }

        ctx.run(self.refresh_store.lookup_user_by_hash(&token.hash()))
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    async fn rotate_refresh_token(
        &self,
        ctx: &CallContext,
        user_id: UserId,
    ) -> Result<IssuedRefreshToken, AuthError> {
        // `put` drops the old session in the same step that installs the new one.
        self.mint_refresh_token(ctx, user_id).await
    }

    async fn revoke(&self, ctx: &CallContext, user_id: UserId) -> Result<(), AuthError> {
        ctx.check()?;
        ctx.run(self.refresh_store.revoke(user_id)).await?;
        info!(%user_id, "refresh session revoked");
        Ok(())
    }

    async fn login(
        &self,
        ctx: &CallContext,
        request: LoginInput,
    ) -> Result<LoginResult, AuthError> {
        let LoginInput {
            identifier,
            password,
        } = request;

        let user = match &identifier {
            LoginIdentifier::Username(username) => {
                self.login_by_username(ctx, username, password.as_bytes())
                    .await?
            }
            LoginIdentifier::Email(email) => {
                self.login_by_email(ctx, email, password.as_bytes()).await?
            }
        };

        let (access_token, access_exp) = self.issue_access_token(user.id).await?;
        let refresh = self.issue_refresh_token(ctx, user.id).await?;

        info!(user_id = %user.id, "login succeeded");
        Ok(LoginResult {
            user,
            tokens: AuthTokens {
                access_token,
                refresh_token: refresh.token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh.expires_at,
            },
        })
    }

    async fn refresh(
        &self,
        ctx: &CallContext,
        refresh_token: &RefreshToken,
    ) -> Result<AuthTokens, AuthError> {
        let user_id = self.validate_refresh_token(ctx, refresh_token).await?;

        let refresh = self.rotate_refresh_token(ctx, user_id).await?;
        let (access_token, access_exp) = self.issue_access_token(user_id).await?;

        Ok(AuthTokens {
            access_token,
            refresh_token: refresh.token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh.expires_at,
        })
    }
}
