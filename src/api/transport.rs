//! HTTP transport abstraction for document submission.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::trace;

use crate::config::ClientConfig;
use crate::error::Result;

const CONTENT_TYPE_JSON: &str = "application/json";

/// A completed HTTP exchange: status code plus the full response body text.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Trait for sending a serialized submission body to the registration API.
///
/// This seam lets tests drive the client against a scripted transport
/// without a network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the body to the registration endpoint and return the reply.
    async fn send(&self, body: String) -> Result<HttpReply>;
}

/// Production transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: String) -> Result<HttpReply> {
        trace!(endpoint = %self.endpoint, bytes = body.len(), "Sending submission request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(status = status, "Received submission response");
        Ok(HttpReply { status, body })
    }
}
