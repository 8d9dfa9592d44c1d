//! Outbound email.

use async_trait::async_trait;

use crate::credentials::RoleCredentials;

mod mock;
mod ses;

pub use mock::MockEmailSender;
pub use ses::SesEmailSender;

/// Errors from sending email.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email to {recipients}: {message}")]
    Send { recipients: String, message: String },
}

/// A rendered HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Sends email under assumed-role credentials.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        credentials: &RoleCredentials,
        message: &EmailMessage,
    ) -> Result<(), EmailError>;
}
