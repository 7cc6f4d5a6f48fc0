//! REST client for the admin export endpoints.
//!
//! Both calls hit `{API_ENDPOINT}admin/csv` with the instructor's id token
//! in the `Authorization` header:
//!
//! - `GET` reports whether a completion record exists
//!   (`{"completionStatus": bool}`).
//! - `DELETE` removes the caller's completed records so they are not
//!   reported again.

use std::time::Duration;

use chatlogs_core::error::CoreError;
use chatlogs_core::types::{JobStatus, SessionId};
use reqwest::StatusCode;

/// Path of the export status resource, relative to the API endpoint.
const CSV_STATUS_PATH: &str = "admin/csv";

/// Upper bound on one status or delete request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the status REST layer.
#[derive(Debug, thiserror::Error)]
pub enum StatusApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The id token was rejected.
    #[error("Not authorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// The backend returned some other non-2xx status code.
    #[error("Status API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<StatusApiError> for CoreError {
    fn from(err: StatusApiError) -> Self {
        match err {
            StatusApiError::Request(_) => CoreError::Transport(err.to_string()),
            StatusApiError::Unauthorized { .. } => CoreError::Auth(err.to_string()),
            StatusApiError::ApiError { .. } => CoreError::Internal(err.to_string()),
        }
    }
}

/// HTTP client for the export status endpoints.
pub struct StatusApi {
    client: reqwest::Client,
    status_url: String,
}

impl StatusApi {
    /// * `api_endpoint` - REST API base URL, e.g.
    ///   `https://abc.execute-api.us-east-1.amazonaws.com/prod/`. A missing
    ///   trailing slash is added.
    pub fn new(api_endpoint: &str) -> Self {
        Self::with_timeout(api_endpoint, REQUEST_TIMEOUT)
    }

    /// Like [`new`](Self::new) with a custom per-request timeout.
    pub fn with_timeout(api_endpoint: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, api_endpoint)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(client: reqwest::Client, api_endpoint: &str) -> Self {
        let base = api_endpoint.trim_end_matches('/');
        Self {
            client,
            status_url: format!("{base}/{CSV_STATUS_PATH}"),
        }
    }

    /// Ask whether the export for `session_id` has completed.
    ///
    /// The backend answers for the caller, not per session; `session_id`
    /// is only used for logging.
    pub async fn check_status(
        &self,
        session_id: &SessionId,
        id_token: &str,
    ) -> Result<JobStatus, StatusApiError> {
        let response = self
            .client
            .get(&self.status_url)
            .header(reqwest::header::AUTHORIZATION, id_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(session_id = %session_id, "No completion record");
            return Ok(JobStatus::NotFound);
        }
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        let status = JobStatus::from_completion_flag(
            parsed.as_ref().and_then(|v| v.get("completionStatus")),
        );

        tracing::debug!(session_id = %session_id, ?status, "Fetched export status");
        Ok(status)
    }

    /// Remove the caller's completed export records.
    ///
    /// Idempotent: a 404 counts as success.
    pub async fn delete_completion_record(&self, id_token: &str) -> Result<(), StatusApiError> {
        let response = self
            .client
            .delete(&self.status_url)
            .header(reqwest::header::AUTHORIZATION, id_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Completion record already removed");
            return Ok(());
        }
        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Map non-2xx responses to errors, keeping the body for debugging.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StatusApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let status = status.as_u16();
        Err(match status {
            401 | 403 => StatusApiError::Unauthorized { status, body },
            _ => StatusApiError::ApiError { status, body },
        })
    }
}
