//! Webhook sink: POSTs finished sessions to an HTTP endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::SubmissionError;
use crate::session::SubmissionRecord;

use super::sink::SubmissionSink;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends each record as a JSON body to a fixed URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SubmissionSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError> {
        debug!(url = %self.url, session_id = %record.session_id, "Posting submission");

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmissionError::Timeout {
                        sink: "webhook".to_string(),
                        timeout: self.timeout,
                    }
                } else {
                    SubmissionError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                sink: "webhook".to_string(),
                reason: format!("{status}: {}", body.chars().take(200).collect::<String>()),
            });
        }

        info!(session_id = %record.session_id, status = %status, "Submission delivered");
        Ok(())
    }
}
