//! Schedule-triggered handler for the failure notifier.

use std::sync::Arc;

use chrono::Utc;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use crate::notifier::{NotificationReport, Notifier};

/// Handles the hourly schedule tick.
///
/// The scheduler payload is ignored; the window is always derived from the
/// invocation time.
pub struct ScheduleHandler {
    notifier: Arc<Notifier>,
}

impl ScheduleHandler {
    pub fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<NotificationReport, LambdaError> {
        let request_id = event.context.request_id;
        info!(request_id = %request_id, "Starting delivery failure notification run");

        match self.notifier.run(Utc::now()).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Notification run failed");
                Err(e.into())
            }
        }
    }
}
