// HTTP transport with a bounded retry loop.
//
// Only 429, 500 and 503 are worth another try; everything else is returned
// immediately. Network failures are not retried either, and surface as
// transport errors rather than status errors. Every non-2xx response is
// logged with its status, body and endpoint. Credentials live in headers
// and are never part of the log line.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ContentSafetyError, Result};

/// Statuses that trigger another attempt.
pub const RETRYABLE_STATUSES: [u16; 3] = [429, 500, 503];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Status and body of a successful exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| ContentSafetyError::Decode(e.to_string()))
    }
}

#[derive(Clone)]
pub struct RetryingHttpClient {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RetryingHttpClient {
    /// `max_attempts` counts the first try; it is raised to 1 if zero.
    pub fn new(client: Client, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Send a request, retrying retryable statuses with a fixed delay.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let mut request = self
                .client
                .request(method.clone(), url)
                .headers(headers.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| {
                warn!(endpoint = url, error = %e, "Content Safety request could not be sent");
                ContentSafetyError::Transport(e.to_string())
            })?;

            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|e| ContentSafetyError::Transport(e.to_string()))?;

            if (200..300).contains(&status) {
                debug!(
                    endpoint = url,
                    status = status,
                    attempt = attempt,
                    "Content Safety request succeeded"
                );
                return Ok(HttpResponse { status, body: text });
            }

            warn!(
                status = status,
                body = %text,
                endpoint = url,
                attempt = attempt,
                max_attempts = self.max_attempts,
                "Content Safety API returned an error"
            );

            if !is_retryable_status(status) {
                return Err(ContentSafetyError::RemoteApi {
                    status,
                    message: error_message(&text),
                });
            }

            if attempt >= self.max_attempts {
                return Err(ContentSafetyError::RetriesExhausted {
                    attempts: attempt,
                    status,
                    body: text,
                });
            }

            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Pull the human-readable message out of an Azure error body, falling
/// back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                code: Some(code),
                message,
            },
        }) => format!("{code}: {message}"),
        Ok(envelope) => envelope.error.message,
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_exactly_the_transient_ones() {
        for status in [429, 500, 503] {
            assert!(is_retryable_status(status), "{status} should retry");
        }
        for status in [200, 400, 401, 403, 404, 409, 502, 504] {
            assert!(!is_retryable_status(status), "{status} should not retry");
        }
    }

    #[test]
    fn error_message_prefers_azure_envelope() {
        let body = r#"{"error": {"code": "InvalidRequestBody", "message": "Text is empty"}}"#;
        assert_eq!(error_message(body), "InvalidRequestBody: Text is empty");
    }

    #[test]
    fn error_message_without_code() {
        let body = r#"{"error": {"message": "Denied"}}"#;
        assert_eq!(error_message(body), "Denied");
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("Service Unavailable"), "Service Unavailable");
        assert_eq!(error_message(""), "");
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        let client = RetryingHttpClient::new(Client::new(), 0, Duration::ZERO);
        assert_eq!(client.max_attempts(), 1);
    }
}
