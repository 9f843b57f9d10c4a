use async_trait::async_trait;
use linkshelf_common::UserIdentity;
use super::{AuthRejection, Credential, SessionClaims};

/// Everything handlers need to authenticate users
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Derive a storable credential; runs off the async executor
    async fn hash_password(&self, plain: String) -> anyhow::Result<Credential>;
    /// Check a password against a stored credential; runs off the async executor
    async fn verify_password(&self, plain: String, stored: Credential) -> bool;
    /// Burn the same work as a real verification when no user matched
    async fn verify_unknown_user(&self, plain: String);
    fn issue_token(&self, user: UserIdentity) -> anyhow::Result<String>;
    fn verify_token(&self, token: &str) -> Result<SessionClaims, AuthRejection>;
}
