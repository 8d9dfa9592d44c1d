//! Bootstrap utilities for the Lambda binaries.
//!
//! Shared cold-start initialization.

use aws_config::{BehaviorVersion, SdkConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the HUB_LOG environment variable.
///
/// Defaults to "info" level if HUB_LOG is not set. Output is one JSON
/// object per line, which CloudWatch Logs indexes directly.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_current_span(false)
                .without_time(),
        )
        .init();
}

/// Load the function's own AWS configuration.
pub async fn load_aws_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}
