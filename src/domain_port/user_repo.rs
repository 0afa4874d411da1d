use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a new account. A uniqueness violation on email or username is
    /// reported as `AuthError::AlreadyExists`, never as a store fault.
    async fn create_user(&self, user: &User) -> Result<(), AuthError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;
}
