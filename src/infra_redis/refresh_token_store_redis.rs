use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, Script, ToRedisArgs, Value,
};

const REFRESH_TOKEN_PUT: &str = include_str!("refresh_token_put.lua");
const REFRESH_TOKEN_REVOKE: &str = include_str!("refresh_token_revoke.lua");

/// Layout, with the prefix wrapped in a cluster hash tag:
///   `{<prefix>}:rth:<hash>`    -> user id
///   `{<prefix>}:rtu:<user_id>` -> hash
/// Both keys carry the same `PXAT`, so Redis expires them together. Mutations
/// only happen inside Lua scripts, which Redis runs atomically. The scripts
/// derive the old hash key at run time, so every key must share one slot; the
/// hash tag keeps that true on Redis Cluster.
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
    prefix: String,
    put_script: Script,
    revoke_script: Script,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRefreshTokenStore {
            conn,
            prefix: prefix.into(),
            put_script: Script::new(REFRESH_TOKEN_PUT),
            revoke_script: Script::new(REFRESH_TOKEN_REVOKE),
        }
    }

    fn hash_prefix(&self) -> String {
        hash_key_prefix(&self.prefix)
    }

    fn hash_key(&self, hash: &RefreshTokenHash) -> String {
        format!("{}{}", self.hash_prefix(), hash)
    }

    fn user_key(&self, user_id: UserId) -> String {
        format!("{}{}", user_key_prefix(&self.prefix), user_id)
    }
}

fn hash_key_prefix(prefix: &str) -> String {
    format!("{{{prefix}}}:rth:")
}

fn user_key_prefix(prefix: &str) -> String {
    format!("{{{prefix}}}:rtu:")
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let user_id = s.parse::<UserId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid UserId string",
                e.to_string(),
            ))
        })?;
        Ok(user_id)
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn put(
        &self,
        user_id: UserId,
        hash: &RefreshTokenHash,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .put_script
            .key(self.hash_key(hash))
            .key(self.user_key(user_id))
            .arg(&user_id)
            .arg(&hash.0)
            .arg(expires_at.timestamp_millis())
            .arg(self.hash_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn lookup_user_by_hash(
        &self,
        hash: &RefreshTokenHash,
    ) -> Result<Option<UserId>, AuthError> {
        let mut conn = self.conn.clone();
        let val: Option<UserId> = conn
            .get(self.hash_key(hash))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn lookup_hash_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<RefreshTokenHash>, AuthError> {
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(self.user_key(user_id))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val.map(RefreshTokenHash))
    }

    async fn revoke(&self, user_id: UserId) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .revoke_script
            .key(self.user_key(user_id))
            .arg(self.hash_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}
