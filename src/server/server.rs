use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub token_codec: Arc<dyn TokenCodec>,
    request_timeout: Duration,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings, signing_key: Vec<u8>) -> anyhow::Result<Self> {
        if signing_key.is_empty() {
            return Err(anyhow!("signing key must not be empty"));
        }

        let argon2 = &settings.auth.argon2;
        let credential_hasher: Arc<dyn CredentialHasher> =
            Arc::new(Argon2PasswordHasher::new(Argon2Config {
                memory_kib: argon2.memory_kib,
                iterations: argon2.iterations,
                parallelism: argon2.parallelism,
            })?);

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            signing_key,
        }));

        let mut pool = None;
        let user_repo: Arc<dyn UserRepo> = match settings.user.backend.as_str() {
            "fake" => Arc::new(InMemoryUserRepo::new()),
            "real" => {
                let dsn = env_var(&settings.user.mysql_dsn_env)?;
                let mysql = MySqlPool::connect(&dsn).await?;
                pool = Some(mysql.clone());
                Arc::new(MySqlUserRepo::new(mysql))
            }
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        let refresh_store: Arc<dyn RefreshTokenStore> = match settings.session.backend.as_str()
        {
            "fake" => Arc::new(InMemoryRefreshTokenStore::new()),
            "real" => {
                let dsn = env_var(&settings.session.redis_dsn_env)?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisRefreshTokenStore::new(
                    redis_manager,
                    settings.session.key_prefix.clone(),
                ))
            }
            other => return Err(anyhow!("Unknown session backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(
            RealAuthService::new(
                user_repo,
                credential_hasher,
                token_codec.clone(),
                refresh_store,
            )
            .with_refresh_ttl(Duration::from_secs(settings.auth.refresh_ttl_secs)),
        );

        info!(
            user_backend = %settings.user.backend,
            session_backend = %settings.session.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            token_codec,
            request_timeout: Duration::from_millis(settings.http.request_timeout_ms),
            cancel: CancellationToken::new(),
            pool,
        })
    }

    /// A fresh context for one inbound request. Shutdown cancels all of them.
    pub fn request_context(&self) -> CallContext {
        CallContext::new(self.cancel.child_token(), Some(self.request_timeout))
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

fn env_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow!("environment variable {} is not set", name))
}
