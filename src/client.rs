//! Network collaborators: the speed-test HTTP transport and the latency probe

pub mod probe;


pub use probe::TcpLatencyProbe;

use crate::{
    error::{AppError, Result},
    models::Config,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;
use tokio::time::timeout;

/// Moves payloads to and from the speed-test endpoint
#[async_trait]
pub trait SpeedTestTransport: Send + Sync {
    /// Download exactly `size_bytes` bytes, returning the number received
    async fn fetch_bytes(&self, size_bytes: u64) -> Result<u64>;

    /// Upload `payload`
    async fn send_bytes(&self, payload: Bytes) -> Result<()>;
}

/// Measures round-trip latency to a host
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Latency in milliseconds, `None` when the host did not answer
    async fn probe_latency(&self, host: &str) -> Result<Option<f64>>;
}

/// Speed-test transport backed by one pooled reqwest client.
///
/// There is no deadline on a whole transfer. `idle_timeout` bounds connection
/// setup and every gap between received chunks, so a slow link still
/// completes and scores low.
pub struct HttpSpeedClient {
    client: Client,
    download_url: Url,
    upload_url: Url,
    idle_timeout: Duration,
    max_retries: u32,
}

impl HttpSpeedClient {
    /// Create a client for the speed-test endpoint at `base_url`
    pub fn new(base_url: &str, idle_timeout: Duration, max_retries: u32) -> Result<Self> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let download_url = base.join("__down")?;
        let upload_url = base.join("__up")?;

        let client = Client::builder()
            .connect_timeout(idle_timeout)
            .tcp_keepalive(idle_timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            download_url,
            upload_url,
            idle_timeout,
            max_retries,
        })
    }

    /// Create the client described by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.speedtest_url,
            config.timeout(),
            crate::defaults::DEFAULT_TRANSPORT_RETRIES,
        )
    }

    pub fn download_url(&self, size_bytes: u64) -> Url {
        let mut url = self.download_url.clone();
        url.query_pairs_mut().append_pair("bytes", &size_bytes.to_string());
        url
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// Send a request, retrying connection failures up to `max_retries` times.
    ///
    /// Only connect errors are retried; nothing has reached the server yet.
    /// `response_wait` bounds one attempt up to the response headers.
    async fn send_with_retries<F>(
        &self,
        build: F,
        response_wait: Option<Duration>,
    ) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut retries = 0;
        loop {
            let attempt = build().send();
            let outcome = match response_wait {
                Some(wait) => timeout(wait, attempt).await.map_err(|_| {
                    AppError::timeout(format!("No response within {}s", wait.as_secs_f64()))
                })?,
                None => attempt.await,
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && retries < self.max_retries => {
                    retries += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn check_status(response: &Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_request(format!(
                "{} answered with HTTP {}",
                response.url(),
                status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeedTestTransport for HttpSpeedClient {
    async fn fetch_bytes(&self, size_bytes: u64) -> Result<u64> {
        let url = self.download_url(size_bytes);
        // Connect plus one idle gap
        let response_wait = self.idle_timeout.saturating_mul(2);
        let mut response = self
            .send_with_retries(|| self.client.get(url.clone()), Some(response_wait))
            .await?;
        Self::check_status(&response)?;

        // Stream the body so large tiers are never buffered whole
        let mut received: u64 = 0;
        loop {
            let chunk = timeout(self.idle_timeout, response.chunk())
                .await
                .map_err(|_| {
                    AppError::timeout(format!(
                        "Download stalled for {}s after {} of {} bytes",
                        self.idle_timeout.as_secs_f64(),
                        received,
                        size_bytes
                    ))
                })?
                .map_err(|e| {
                    if e.is_body() && !e.is_timeout() {
                        AppError::connection(format!("Download interrupted: {}", e))
                    } else {
                        AppError::from(e)
                    }
                })?;

            match chunk {
                Some(bytes) => received += bytes.len() as u64,
                None => break,
            }
        }

        if received != size_bytes {
            return Err(AppError::http_request(format!(
                "Requested {} bytes but received {}",
                size_bytes, received
            )));
        }

        Ok(received)
    }

    async fn send_bytes(&self, payload: Bytes) -> Result<()> {
        // The server answers only after the whole body, so no response bound
        let response = self
            .send_with_retries(
                || self.client.post(self.upload_url.clone()).body(payload.clone()),
                None,
            )
            .await?;
        Self::check_status(&response)?;
        Ok(())
    }
}
