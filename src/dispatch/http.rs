//! HTTP collector client.
//!
//! Submits one JSON payload per request with a bearer token. Only `200 OK`
//! counts as accepted; the body of any other answer is kept for the log.

use super::{AttemptError, Collector, Payload, SubmitFuture};
use reqwest::StatusCode;

/// Collector reached over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpCollector {
    endpoint: String,
    token: String,
    http_client: reqwest::Client,
}

impl HttpCollector {
    /// Create a collector for `endpoint` authenticating with `token`.
    ///
    /// Timeouts are left to the dispatcher, which bounds every attempt.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn post(&self, payload: &Payload) -> Result<(), AttemptError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));

        Err(AttemptError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl Collector for HttpCollector {
    fn submit<'a>(&'a self, payload: &'a Payload) -> SubmitFuture<'a> {
        Box::pin(self.post(payload))
    }
}
