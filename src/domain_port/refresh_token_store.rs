use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Holds at most one live refresh session per user, indexed both by token hash
/// and by user id. Both index entries share the same absolute expiry.
#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Replace the user's session in one atomic step: the previous hash (if any)
    /// stops resolving in the same transaction that installs the new one.
    async fn put(
        &self,
        user_id: UserId,
        hash: &RefreshTokenHash,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    async fn lookup_user_by_hash(
        &self,
        hash: &RefreshTokenHash,
    ) -> Result<Option<UserId>, AuthError>;

    async fn lookup_hash_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<RefreshTokenHash>, AuthError>;

    /// Drop both index entries. Revoking a missing session is not an error.
    async fn revoke(&self, user_id: UserId) -> Result<(), AuthError>;
}
