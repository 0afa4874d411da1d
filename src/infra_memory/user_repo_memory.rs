use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, User>>, AuthError> {
        self.users
            .lock()
            .map_err(|_| AuthError::Store("user map poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn create_user(&self, user: &User) -> Result<(), AuthError> {
        let mut users = self.lock()?;
        for existing in users.values() {
            if existing.email == user.email {
                return Err(AuthError::AlreadyExists(ConflictField::Email));
            }
            if existing.username == user.username {
                return Err(AuthError::AlreadyExists(ConflictField::Username));
            }
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.lock()?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.lock()?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> User {
        User {
            id: UserId::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            name: "N".to_string(),
            surname: "S".to_string(),
        }
    }

    #[tokio::test]
    async fn lookups_find_created_user() {
        let repo = InMemoryUserRepo::new();
        let alice = user("alice", "alice@example.com");
        repo.create_user(&alice).await.unwrap();

        let by_mail = repo.get_user_by_email("alice@example.com").await.unwrap();
        let by_name = repo.get_user_by_username("alice").await.unwrap();
        assert_eq!(by_mail.map(|u| u.id), Some(alice.id));
        assert_eq!(by_name.map(|u| u.id), Some(alice.id));
        assert!(repo.get_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_enforces_uniqueness() {
        let repo = InMemoryUserRepo::new();
        repo.create_user(&user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = repo
            .create_user(&user("other", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(ConflictField::Email)));

        let err = repo
            .create_user(&user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::AlreadyExists(ConflictField::Username)
        ));
    }
}
