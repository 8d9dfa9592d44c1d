//! Mock email sender for testing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Barrier, RwLock};

use super::{EmailError, EmailMessage, EmailSender};
use crate::credentials::RoleCredentials;

/// Records every message it is asked to send. Sends addressed to a
/// recipient registered with [`MockEmailSender::fail_for`] fail.
#[derive(Default)]
pub struct MockEmailSender {
    sent: RwLock<Vec<EmailMessage>>,
    attempts: RwLock<usize>,
    failing_recipients: RwLock<HashSet<String>>,
    hold: RwLock<Option<Arc<Barrier>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any send whose To list contains `recipient`.
    pub async fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .write()
            .await
            .insert(recipient.to_string());
    }

    /// Make every send wait until `in_flight` sends are in progress.
    ///
    /// Sends issued one after another never reach the count and hang.
    pub async fn hold_until(&self, in_flight: usize) {
        *self.hold.write().await = Some(Arc::new(Barrier::new(in_flight)));
    }

    /// Messages successfully sent.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().await.clone()
    }

    /// Number of send calls, successful or not.
    pub async fn attempts(&self) -> usize {
        *self.attempts.read().await
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(
        &self,
        _credentials: &RoleCredentials,
        message: &EmailMessage,
    ) -> Result<(), EmailError> {
        *self.attempts.write().await += 1;

        let hold = self.hold.read().await.clone();
        if let Some(barrier) = hold {
            barrier.wait().await;
        }

        let failing = self.failing_recipients.read().await;
        if message.to.iter().any(|to| failing.contains(to)) {
            return Err(EmailError::Send {
                recipients: message.to.join(", "),
                message: "MessageRejected".to_string(),
            });
        }
        drop(failing);

        self.sent.write().await.push(message.clone());
        Ok(())
    }
}
