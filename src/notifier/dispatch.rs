//! Concurrent notification dispatch.

use futures::future::join_all;
use tracing::{error, info};

use super::summary::ResolvedAppSummary;
use super::template;
use crate::config::NotifierConfig;
use crate::credentials::RoleCredentials;
use crate::email::{EmailError, EmailMessage, EmailSender};

/// Outcome of one application's send.
#[derive(Debug)]
pub struct SendOutcome {
    pub application: String,
    pub result: Result<(), EmailError>,
}

/// Build the email for one application.
pub fn build_message(config: &NotifierConfig, app: &ResolvedAppSummary) -> EmailMessage {
    EmailMessage {
        from: config.sender_email.clone(),
        to: app.support_emails.clone(),
        bcc: config.integration_team_emails.clone(),
        subject: template::subject(&app.display_name),
        html_body: template::render_html(app),
    }
}

/// Send every application's email concurrently and wait for all of them.
///
/// One failed send never cancels the others; every outcome is returned.
pub async fn send_all(
    config: &NotifierConfig,
    sender: &dyn EmailSender,
    credentials: &RoleCredentials,
    apps: &[ResolvedAppSummary],
) -> Vec<SendOutcome> {
    let sends = apps.iter().map(|app| async move {
        let message = build_message(config, app);
        let result = sender.send(credentials, &message).await;
        match &result {
            Ok(()) => info!(
                application = %app.summary.short_name,
                failed_events = app.summary.failed_events_count,
                recipients = message.to.len(),
                "Sent delivery failure notification"
            ),
            Err(e) => error!(
                application = %app.summary.short_name,
                error = %e,
                "Failed to send delivery failure notification"
            ),
        }
        SendOutcome {
            application: app.summary.short_name.clone(),
            result,
        }
    });

    join_all(sends).await
}
