use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use linkshelf_common::UserIdentity;
use tokio::task;

use super::password::{self, Credential};
use super::session::{Clock, SystemClock, TokenSigner, TokenVerifier};
use super::{AuthRejection, AuthService, SessionClaims};
use crate::config::Settings;

pub struct DefaultAuth {
    signer: TokenSigner,
    verifier: TokenVerifier,
}

impl DefaultAuth {
    pub fn new(settings: &Settings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        let secret = settings.jwt_secret.as_bytes();
        let ttl = Duration::from_secs(settings.token_ttl_secs);
        Self {
            signer: TokenSigner::new(secret, ttl, clock.clone()),
            verifier: TokenVerifier::new(secret, clock),
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn hash_password(&self, mut plain: String) -> anyhow::Result<Credential> {
        let credential =
            task::spawn_blocking(move || password::hash_password_secure(&mut plain)).await??;
        Ok(credential)
    }

    async fn verify_password(&self, plain: String, stored: Credential) -> bool {
        match task::spawn_blocking(move || password::verify_password(&plain, &stored)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                false
            }
        }
    }

    async fn verify_unknown_user(&self, plain: String) {
        let outcome = task::spawn_blocking(move || {
            let _ = password::verify_password(&plain, password::decoy_credential());
        })
        .await;
        if let Err(e) = outcome {
            tracing::error!(error = %e, "decoy verification task failed");
        }
    }

    fn issue_token(&self, user: UserIdentity) -> anyhow::Result<String> {
        Ok(self.signer.issue(user)?)
    }

    fn verify_token(&self, token: &str) -> Result<SessionClaims, AuthRejection> {
        self.verifier.verify(token)
    }
}
