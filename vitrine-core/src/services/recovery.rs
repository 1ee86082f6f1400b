use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error,
    credentials::CredentialVerifier,
    error::ValidationError,
    mailer::{Mailer, reset_email},
    repositories::AccountRepository,
    token::{ResetTokenService, TokenConfig},
};

/// Service for the password-recovery flow.
///
/// Issuance stores exactly one pending token per account, so a second
/// request silently supersedes the first. Consumption is delegated to
/// the repository, which checks the stored token and expiry and clears
/// them atomically with the digest update.
pub struct RecoveryService<R: AccountRepository> {
    repository: Arc<R>,
    tokens: ResetTokenService,
    ttl: chrono::Duration,
    mailer: Arc<dyn Mailer>,
    verifier: CredentialVerifier,
    reset_base_url: String,
}

impl<R: AccountRepository> RecoveryService<R> {
    pub fn new(
        repository: Arc<R>,
        config: TokenConfig,
        mailer: Arc<dyn Mailer>,
        reset_base_url: impl Into<String>,
    ) -> Self {
        let ttl = config.ttl();
        Self {
            repository,
            tokens: ResetTokenService::new(config),
            ttl,
            mailer,
            verifier: CredentialVerifier::new(),
            reset_base_url: reset_base_url.into(),
        }
    }

    /// Request a password reset for the given email.
    ///
    /// Returns the issued token when the email resolves to an account
    /// and `None` otherwise; the orchestrator maps both outcomes to
    /// the same acknowledgment so the response never reveals whether
    /// an email exists. Mail delivery is best-effort: a transport
    /// failure is logged and swallowed for the same reason.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, Error> {
        let account = match self.repository.find_by_email(email).await? {
            Some(account) => account,
            None => return Ok(None),
        };

        let token = self.tokens.issue(&account.email)?;
        let expires_at = Utc::now() + self.ttl;

        self.repository
            .set_reset_token(&account.id, &token, expires_at)
            .await?;

        let reset_url = format!("{}?token={}", self.reset_base_url, token);
        let (subject, body) = reset_email(&account.name, &reset_url);
        if let Err(e) = self.mailer.send(&account.email, &subject, &body).await {
            tracing::warn!(error = %e, "failed to send password reset email");
        }

        Ok(Some(token))
    }

    /// Complete a reset: validate the signed token, then atomically
    /// consume the stored token and set the new password digest.
    /// Replaying a consumed token, presenting a superseded token, or
    /// presenting one past its window all fail the same way.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        if new_password.is_empty() {
            return Err(ValidationError::MissingField("password".to_string()).into());
        }

        let email = self.tokens.validate(token)?;
        let new_hash = self.verifier.hash(new_password);

        self.repository
            .consume_reset_token(&email, token, &new_hash)
            .await?;

        Ok(())
    }
}
