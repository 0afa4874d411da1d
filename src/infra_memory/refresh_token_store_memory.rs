use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Sessions {
    by_hash: HashMap<RefreshTokenHash, (UserId, DateTime<Utc>)>,
    by_user: HashMap<UserId, (RefreshTokenHash, DateTime<Utc>)>,
}

impl Sessions {
    fn remove_user(&mut self, user_id: UserId) {
        if let Some((hash, _)) = self.by_user.remove(&user_id) {
            self.by_hash.remove(&hash);
        }
    }
}

/// Both indexes sit behind one mutex, so every operation is a single critical
/// section. Expired entries read as absent and are dropped when touched.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    sessions: Mutex<Sessions>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>, AuthError> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::Store("session map poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn put(
        &self,
        user_id: UserId,
        hash: &RefreshTokenHash,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut sessions = self.lock()?;
        sessions.remove_user(user_id);
        sessions
            .by_hash
            .insert(hash.clone(), (user_id, expires_at));
        sessions.by_user.insert(user_id, (hash.clone(), expires_at));
        Ok(())
    }

    async fn lookup_user_by_hash(
        &self,
        hash: &RefreshTokenHash,
    ) -> Result<Option<UserId>, AuthError> {
        let mut sessions = self.lock()?;
        match sessions.by_hash.get(hash).copied() {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(Some(user_id)),
            Some((user_id, _)) => {
                sessions.remove_user(user_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn lookup_hash_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<RefreshTokenHash>, AuthError> {
        let mut sessions = self.lock()?;
        match sessions.by_user.get(&user_id).cloned() {
            Some((hash, expires_at)) if expires_at > Utc::now() => Ok(Some(hash)),
            Some(_) => {
                sessions.remove_user(user_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, user_id: UserId) -> Result<(), AuthError> {
        self.lock()?.remove_user(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn hash(s: &str) -> RefreshTokenHash {
        RefreshToken(s.to_string()).hash()
    }

    fn week() -> DateTime<Utc> {
        Utc::now() + Duration::days(7)
    }

    #[tokio::test]
    async fn put_is_visible_from_both_indexes() {
        let store = InMemoryRefreshTokenStore::new();
        let user = UserId::new_v4();
        store.put(user, &hash("rt1.a"), week()).await.unwrap();

        assert_eq!(
            store.lookup_user_by_hash(&hash("rt1.a")).await.unwrap(),
            Some(user)
        );
        assert_eq!(
            store.lookup_hash_by_user(user).await.unwrap(),
            Some(hash("rt1.a"))
        );
    }

    #[tokio::test]
    async fn put_replaces_previous_session() {
        let store = InMemoryRefreshTokenStore::new();
        let user = UserId::new_v4();
        store.put(user, &hash("rt1.a"), week()).await.unwrap();
        store.put(user, &hash("rt1.b"), week()).await.unwrap();

        assert_eq!(store.lookup_user_by_hash(&hash("rt1.a")).await.unwrap(), None);
        assert_eq!(
            store.lookup_user_by_hash(&hash("rt1.b")).await.unwrap(),
            Some(user)
        );
        assert_eq!(
            store.lookup_hash_by_user(user).await.unwrap(),
            Some(hash("rt1.b"))
        );
    }

    #[tokio::test]
    async fn sessions_of_different_users_are_independent() {
        let store = InMemoryRefreshTokenStore::new();
        let alice = UserId::new_v4();
        let bob = UserId::new_v4();
        store.put(alice, &hash("rt1.a"), week()).await.unwrap();
        store.put(bob, &hash("rt1.b"), week()).await.unwrap();
        store.revoke(alice).await.unwrap();

        assert_eq!(store.lookup_user_by_hash(&hash("rt1.a")).await.unwrap(), None);
        assert_eq!(
            store.lookup_user_by_hash(&hash("rt1.b")).await.unwrap(),
            Some(bob)
        );
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = InMemoryRefreshTokenStore::new();
        let user = UserId::new_v4();
        store
            .put(user, &hash("rt1.a"), Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(store.lookup_user_by_hash(&hash("rt1.a")).await.unwrap(), None);
        assert_eq!(store.lookup_hash_by_user(user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = InMemoryRefreshTokenStore::new();
        let user = UserId::new_v4();
        store.revoke(user).await.unwrap();
        store.put(user, &hash("rt1.a"), week()).await.unwrap();
        store.revoke(user).await.unwrap();
        store.revoke(user).await.unwrap();

        assert_eq!(store.lookup_user_by_hash(&hash("rt1.a")).await.unwrap(), None);
        assert_eq!(store.lookup_hash_by_user(user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_puts_leave_a_single_survivor() {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let user = UserId::new_v4();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let h = hash(&format!("rt1.{i}"));
                    store.put(user, &h, week()).await.unwrap();
                    h
                })
            })
            .collect();

        let mut hashes = Vec::new();
        for handle in handles {
            hashes.push(handle.await.unwrap());
        }

        let mut live = Vec::new();
        for h in &hashes {
            if store.lookup_user_by_hash(h).await.unwrap().is_some() {
                live.push(h.clone());
            }
        }
        assert_eq!(live.len(), 1);
        assert_eq!(store.lookup_hash_by_user(user).await.unwrap(), live.pop());
    }
}
