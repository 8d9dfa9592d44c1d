//! Cross-account role assumption.
//!
//! SES sending and, in non-production brokers, reads of the production
//! applications table happen under roles owned by other accounts. The
//! notifier obtains temporary credentials through [`RoleAssumer`] and
//! hands them to the clients that need them.

use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use tokio::sync::RwLock;
use tracing::info;

/// Session name reported to STS.
pub const SESSION_NAME: &str = "integration-hub-dlq-notification";

/// Provider name attached to SDK credentials built from an assumed role.
const PROVIDER_NAME: &str = "IntegrationHubAssumedRole";

/// Errors from role assumption.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("Failed to assume role {role_arn}: {message}")]
    AssumeRole { role_arn: String, message: String },

    #[error("AssumeRole for {role_arn} returned no credentials")]
    MissingCredentials { role_arn: String },
}

/// Temporary credentials for an assumed role.
#[derive(Clone)]
pub struct RoleCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<SystemTime>,
}

impl std::fmt::Debug for RoleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl RoleCredentials {
    /// Convert into credentials usable by any AWS SDK client config.
    pub fn to_sdk_credentials(&self) -> aws_sdk_sts::config::Credentials {
        aws_sdk_sts::config::Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            Some(self.session_token.clone()),
            self.expiration,
            PROVIDER_NAME,
        )
    }
}

/// Obtains temporary credentials for a role.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(&self, role_arn: &str) -> Result<RoleCredentials, CredentialsError>;
}

/// STS-backed role assumption.
pub struct StsRoleAssumer {
    client: StsClient,
}

impl StsRoleAssumer {
    pub fn new(client: StsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(&self, role_arn: &str) -> Result<RoleCredentials, CredentialsError> {
        let output = self
            .client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(SESSION_NAME)
            .send()
            .await
            .map_err(|e| CredentialsError::AssumeRole {
                role_arn: role_arn.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let creds = output
            .credentials()
            .ok_or_else(|| CredentialsError::MissingCredentials {
                role_arn: role_arn.to_string(),
            })?;

        info!(role_arn = %role_arn, "Assumed role");

        Ok(RoleCredentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expiration: SystemTime::try_from(*creds.expiration()).ok(),
        })
    }
}

/// Mock role assumer for testing.
#[derive(Default)]
pub struct MockRoleAssumer {
    fail: RwLock<bool>,
    assumed: RwLock<Vec<String>>,
}

impl MockRoleAssumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Role ARNs assumed so far, in call order.
    pub async fn assumed_roles(&self) -> Vec<String> {
        self.assumed.read().await.clone()
    }
}

#[async_trait]
impl RoleAssumer for MockRoleAssumer {
    async fn assume_role(&self, role_arn: &str) -> Result<RoleCredentials, CredentialsError> {
        if *self.fail.read().await {
            return Err(CredentialsError::AssumeRole {
                role_arn: role_arn.to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        self.assumed.write().await.push(role_arn.to_string());
        Ok(RoleCredentials {
            access_key_id: "ASIAMOCK".to_string(),
            secret_access_key: "mock-secret".to_string(),
            session_token: "mock-token".to_string(),
            expiration: None,
        })
    }
}
