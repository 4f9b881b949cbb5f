//! Webhook delivery with a single retry.
//!
//! [`WebhookDelivery`] POSTs a JSON payload to a webhook URL. Every attempt
//! is bounded by the client timeout; a failed attempt is retried once after
//! one second. Delivery is at-least-once-attempted: a failure never rolls
//! back the invocation count that triggered it.

use std::time::Duration;

use serde::Serialize;

/// Delays before each retry.
const RETRY_DELAYS: [Duration; 1] = [Duration::from_secs(1)];

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

pub struct WebhookDelivery {
    client: reqwest::Client,
}

impl WebhookDelivery {
    /// Create a delivery service whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Deliver `payload` to `url`, retrying per [`RETRY_DELAYS`].
    pub async fn deliver<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<(), WebhookError> {
        for (attempt, delay) in RETRY_DELAYS.iter().enumerate() {
            match self.try_send(url, payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last delay.
        self.try_send(url, payload).await.inspect_err(|e| {
            tracing::error!(url, error = %e, "Webhook delivery failed after retry");
        })
    }

    /// Execute a single POST request and check the response status.
    async fn try_send<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
