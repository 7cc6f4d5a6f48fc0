//! Temporary AWS credentials for signing the realtime handshake.
//!
//! Credentials are short-lived; callers must ask the provider again for
//! every connection attempt instead of holding on to a previous value.

use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};

use crate::error::RealtimeError;

/// A set of (possibly temporary) AWS credentials.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Present for STS / Cognito identity-pool credentials.
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Source of fresh credentials.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, RealtimeError>;
}

/// Credentials from the AWS default provider chain (env, profile, web
/// identity, instance metadata).
pub struct AwsCredentialsProvider {
    inner: SharedCredentialsProvider,
}

impl AwsCredentialsProvider {
    pub fn new(inner: SharedCredentialsProvider) -> Self {
        Self { inner }
    }

    /// Load the default chain from the environment.
    pub async fn from_env() -> Result<Self, RealtimeError> {
        let config = aws_config::load_from_env().await;
        let inner = config
            .credentials_provider()
            .ok_or_else(|| RealtimeError::Credentials("no AWS credentials provider configured".into()))?;
        Ok(Self::new(inner))
    }
}

#[async_trait]
impl CredentialsProvider for AwsCredentialsProvider {
    async fn credentials(&self) -> Result<Credentials, RealtimeError> {
        let creds = self
            .inner
            .provide_credentials()
            .await
            .map_err(|e| RealtimeError::Credentials(e.to_string()))?;

        Ok(Credentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().map(str::to_owned),
        })
    }
}
