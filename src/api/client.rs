//! Rate-limited submission client.

use std::time::Duration;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{CrptError, Result};
use crate::ratelimit::FixedWindowLimiter;

use super::document::{Document, SubmissionRequest};
use super::transport::{HttpTransport, Transport};

/// Client for the CRPT document registration API.
///
/// Every submission passes through the owned [`FixedWindowLimiter`] before a
/// request is issued, so no more than the configured limit of calls reach the
/// API per window. Safe to share across tasks behind an `Arc`.
pub struct CrptClient<T: Transport> {
    limiter: FixedWindowLimiter,
    transport: T,
    acquire_timeout: Option<Duration>,
}

impl CrptClient<HttpTransport> {
    /// Create a client with the production HTTP transport.
    ///
    /// Must be called from within a tokio runtime: construction spawns the
    /// limiter's replenishment task.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> CrptClient<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        let limiter = FixedWindowLimiter::new(
            config.rate_limit.request_limit,
            config.rate_limit.window_duration(),
        )?;

        info!(
            endpoint = %config.endpoint,
            request_limit = config.rate_limit.request_limit,
            window_ms = config.rate_limit.window_duration().as_millis() as u64,
            "Created CRPT client"
        );

        Ok(Self {
            limiter,
            transport,
            acquire_timeout: config.acquire_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Submit a document with its detached signature.
    ///
    /// Blocks until a rate limit permit is available (bounded by the
    /// configured acquire timeout, if any), then sends the request. A status
    /// below 400 is success; 400 and above surfaces as [`CrptError::Api`]
    /// with the status code and response body. The permit stays consumed
    /// either way; the replenishment tick alone restores capacity.
    pub async fn create_document(&self, document: &Document, signature: &str) -> Result<()> {
        match self.acquire_timeout {
            Some(timeout) => self.limiter.acquire_within(timeout).await?,
            None => self.limiter.acquire().await?,
        }

        let body = serde_json::to_string(&SubmissionRequest {
            document,
            signature,
        })?;

        let reply = self.transport.send(body).await?;

        if reply.status >= 400 {
            debug!(status = reply.status, "API rejected submission");
            return Err(CrptError::Api {
                status: reply.status,
                body: reply.body,
            });
        }

        debug!(status = reply.status, "Document submitted");
        Ok(())
    }

    /// Access the rate limiter, e.g. to observe remaining capacity.
    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// Release the limiter's replenishment task.
    ///
    /// Callers still waiting for a permit observe [`CrptError::Closed`].
    pub fn shutdown(&self) {
        self.limiter.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::HttpReply;
    use crate::config::RateLimitConfig;
    use crate::ratelimit::TimeWindow;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::time::Instant;
    use tokio_test::assert_ok;

    /// Scripted transport recording every request body it receives.
    struct MockTransport {
        replies: Mutex<VecDeque<Result<HttpReply>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockTransport {
        fn new(replies: Vec<Result<HttpReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn ok(status: u16, body: &str) -> Result<HttpReply> {
            Ok(HttpReply {
                status,
                body: body.to_string(),
            })
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, body: String) -> Result<HttpReply> {
            self.requests.lock().push(body);
            self.replies
                .lock()
                .pop_front()
                .expect("unexpected request beyond scripted replies")
        }
    }

    fn test_config(request_limit: u32) -> ClientConfig {
        ClientConfig {
            rate_limit: RateLimitConfig {
                request_limit,
                window: TimeWindow::Second,
                window_amount: 1,
            },
            ..ClientConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submission_sends_exact_body() {
        let transport = MockTransport::new(vec![MockTransport::ok(200, "{}")]);
        let requests = Arc::clone(&transport.requests);
        let client = CrptClient::with_transport(&test_config(5), transport).unwrap();

        let document = Document::new("1", "RU", "milk");
        assert_ok!(client.create_document(&document, "sig").await);

        let sent = requests.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            r#"{"document":{"omsId":"1","country":"RU","product":"milk","description":null,"serialNumber":null},"signature":"sig"}"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_error_carries_status_and_body() {
        let transport = MockTransport::new(vec![MockTransport::ok(
            429,
            r#"{"error":"too many requests"}"#,
        )]);
        let client = CrptClient::with_transport(&test_config(1), transport).unwrap();

        let document = Document::new("1", "RU", "milk");
        let result = client.create_document(&document, "sig").await;

        match result {
            Err(CrptError::Api { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, r#"{"error":"too many requests"}"#);
            }
            other => panic!("expected API error, got {:?}", other.err()),
        }

        // No refund on API-level failure: the permit stays consumed.
        assert_eq!(client.limiter().available_permits(), 0);
    }

    // Real network failures surface as `CrptError::Transport` via the `?` in
    // `HttpTransport::send`; a `reqwest::Error` cannot be constructed here, so
    // the scripted transport fails with an I/O error of the same shape.
    #[tokio::test(start_paused = true)]
    async fn test_send_failure_propagates_unchanged() {
        let transport = MockTransport::new(vec![Err(CrptError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))]);
        let client = CrptClient::with_transport(&test_config(1), transport).unwrap();

        let document = Document::new("1", "RU", "milk");
        let result = client.create_document(&document, "sig").await;
        assert!(matches!(result, Err(CrptError::Io(_))));
        assert_eq!(client.limiter().available_permits(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submissions_beyond_limit_wait_for_tick() {
        let transport = MockTransport::new(vec![
            MockTransport::ok(200, "{}"),
            MockTransport::ok(200, "{}"),
            MockTransport::ok(200, "{}"),
        ]);
        let client =
            Arc::new(CrptClient::with_transport(&test_config(2), transport).unwrap());

        let start = Instant::now();
        let mut handles = Vec::new();
        for i in 0..3u32 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                let document = Document::new(i.to_string(), "RU", "milk");
                client.create_document(&document, "sig").await
            }));
        }

        for handle in handles {
            assert_ok!(handle.await.unwrap());
        }
        // The third submission crossed a window boundary.
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_timeout_surfaces_cancellation() {
        let mut config = test_config(1);
        config.acquire_timeout_ms = Some(100);

        let transport = MockTransport::new(vec![MockTransport::ok(200, "{}")]);
        let client = CrptClient::with_transport(&config, transport).unwrap();

        let document = Document::new("1", "RU", "milk");
        assert_ok!(client.create_document(&document, "sig").await);

        // Quota exhausted and the next tick is 900ms out; this caller gives up.
        let result = client.create_document(&document, "sig").await;
        assert!(matches!(result, Err(CrptError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_config_rejected() {
        let transport = MockTransport::new(vec![]);
        let result = CrptClient::with_transport(&test_config(0), transport);
        assert!(matches!(result, Err(CrptError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_fails_pending_submissions() {
        let transport = MockTransport::new(vec![MockTransport::ok(200, "{}")]);
        let client = CrptClient::with_transport(&test_config(1), transport).unwrap();

        let document = Document::new("1", "RU", "milk");
        assert_ok!(client.create_document(&document, "sig").await);

        client.shutdown();
        let result = client.create_document(&document, "sig").await;
        assert!(matches!(result, Err(CrptError::Closed)));
    }
}
