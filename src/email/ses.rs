//! Amazon SES (v2) email sender.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client;
use tracing::debug;

use super::{EmailError, EmailMessage, EmailSender};
use crate::credentials::RoleCredentials;

const CHARSET: &str = "UTF-8";

/// Sends through SES using a client built from the caller's credentials.
pub struct SesEmailSender {
    sdk_config: SdkConfig,
}

impl SesEmailSender {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client(&self, credentials: &RoleCredentials) -> Client {
        let ses_config = aws_sdk_sesv2::config::Builder::from(&self.sdk_config)
            .credentials_provider(credentials.to_sdk_credentials())
            .build();
        Client::from_conf(ses_config)
    }
}

fn content(data: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send(
        &self,
        credentials: &RoleCredentials,
        message: &EmailMessage,
    ) -> Result<(), EmailError> {
        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .set_bcc_addresses(Some(message.bcc.clone()))
            .build();

        let simple = Message::builder()
            .subject(content(&message.subject)?)
            .body(Body::builder().html(content(&message.html_body)?).build())
            .build();

        let output = self
            .client(credentials)
            .send_email()
            .from_email_address(&message.from)
            .destination(destination)
            .content(EmailContent::builder().simple(simple).build())
            .send()
            .await
            .map_err(|e| EmailError::Send {
                recipients: message.to.join(", "),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(
            message_id = ?output.message_id(),
            subject = %message.subject,
            "Sent email through SES"
        );

        Ok(())
    }
}
