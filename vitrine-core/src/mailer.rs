//! Outbound email capability
//!
//! Delivery is best-effort from the core's point of view: the
//! password-reset flow logs and swallows mailer failures so the
//! external response never reveals whether an email exists.

use async_trait::async_trait;

use crate::Error;

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error>;
}

/// Development transport that logs messages instead of delivering
/// them.
#[derive(Debug, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error> {
        tracing::info!(to, subject, body_len = body.len(), "outbound email");
        Ok(())
    }
}

/// Build the password-reset message body for a recipient.
pub fn reset_email(name: &str, reset_url: &str) -> (String, String) {
    let subject = "Password Reset Request".to_string();
    let body = format!(
        "Hello {name},\n\n\
         You requested to reset your password.\n\n\
         Click the link below to reset it (valid for 1 hour):\n\
         {reset_url}\n\n\
         If you didn't request this, please ignore this email.\n"
    );
    (subject, body)
}
