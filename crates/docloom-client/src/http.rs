//! Shared HTTP transport for the workflow client.
//!
//! One `reqwest::Client` per workflow client, with timeout and retry policy:
//! up to `max_retries` retries with exponential backoff for 5xx responses and
//! transport failures, never for 4xx. Retrying is safe here because the
//! outline update is idempotent and the generate calls are keyed by request
//! id.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use docloom_utils::error::{ApiError, ConfigError};

use crate::wire::ErrorBody;

/// Initial backoff before the first retry; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Delay before retrying after failed attempt `attempt` (1-based):
/// 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    INITIAL_BACKOFF * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// HTTP transport with the client's timeout and retry policy baked in.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    timeout: Duration,
    max_retries: u32,
}

impl HttpClient {
    /// Build the underlying `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the client cannot be constructed.
    pub fn new(
        connect_timeout: Duration,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout,
            max_retries,
        })
    }

    /// Execute a request, retrying 5xx and transport failures with backoff.
    ///
    /// # Errors
    ///
    /// - `ApiError::Timeout` when the per-call timeout elapses
    /// - `ApiError::Validation` for 400/422 responses
    /// - `ApiError::Server` for other non-2xx responses (after retries for 5xx)
    /// - `ApiError::Network` for transport failures (after retries)
    pub async fn execute_with_retry(
        &self,
        request_builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<Response, ApiError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| ApiError::Network("failed to clone request for retry".to_string()))?
                .timeout(self.timeout)
                .build()
                .map_err(|e| ApiError::Network(format!("failed to build request: {e}")))?;

            debug!(
                operation,
                attempt,
                timeout_secs = self.timeout.as_secs(),
                "executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    let detail = read_detail(response).await;

                    if status.is_server_error() && attempt <= self.max_retries {
                        warn!(
                            operation,
                            attempt,
                            status = status.as_u16(),
                            "server error, will retry"
                        );
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }

                    return Err(map_status(status, detail));
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(ApiError::Timeout {
                            duration: self.timeout,
                        });
                    }

                    if attempt <= self.max_retries {
                        warn!(operation, attempt, error = %e, "network error, will retry");
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }

                    return Err(ApiError::Network(format!("{operation} request failed: {e}")));
                }
            }
        }
    }
}

/// Extract the service's `detail` message from an error response.
///
/// Falls back to the raw body, then the status line, so the caller always
/// gets something human-readable.
async fn read_detail(response: Response) -> String {
    let status = response.status();
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    };

    match response.text().await {
        Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.detail,
            Err(_) if body.trim().is_empty() => fallback(),
            Err(_) => body.trim().to_string(),
        },
        Err(_) => fallback(),
    }
}

/// Map a non-2xx status plus its detail message to an `ApiError`.
///
/// 400/422 are the service's request-validation rejections; everything else
/// (including 404 for unknown request ids) is a server failure.
pub(crate) fn map_status(status: StatusCode, detail: String) -> ApiError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation { detail }
        }
        _ => ApiError::Server {
            status: status.as_u16(),
            detail,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn http_client_construction_succeeds() {
        let client = HttpClient::new(Duration::from_secs(1), Duration::from_secs(5), 2);
        assert!(client.is_ok());
    }

    #[test]
    fn map_400_to_validation() {
        let err = map_status(StatusCode::BAD_REQUEST, "不支持的文档类型".to_string());
        assert_eq!(
            err,
            ApiError::Validation {
                detail: "不支持的文档类型".to_string()
            }
        );
    }

    #[test]
    fn map_422_to_validation() {
        let err = map_status(StatusCode::UNPROCESSABLE_ENTITY, "field required".to_string());
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn map_404_to_server_failure() {
        let err = map_status(StatusCode::NOT_FOUND, "请求ID不存在".to_string());
        assert_eq!(
            err,
            ApiError::Server {
                status: 404,
                detail: "请求ID不存在".to_string()
            }
        );
    }

    #[test]
    fn map_500_to_server_failure() {
        let err = map_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "内容数据为空，无法生成文档".to_string(),
        );
        match err {
            ApiError::Server { status, detail } => {
                assert_eq!(status, 500);
                assert!(detail.contains("内容数据为空"));
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }
}
