//! Callback dispatch over HTTP.
//!
//! A dispatch is a single `POST` with the document JSON as body. Only a
//! `200` counts as success. Nothing is retried here; a failed callback is
//! retried by leaving the queue message unacknowledged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{error, info};
use url::Url;

use crate::context::AppContext;
use crate::error::DispatchError;

/// One outbound callback call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRequest {
    pub url: String,
    pub payload: String,
}

impl CallbackRequest {
    pub fn new(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload: payload.into(),
        }
    }
}

/// Sends callback requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send(&self, request: &CallbackRequest) -> Result<(), DispatchError>;
}

/// [`CallbackSender`] backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpCallbackSender {
    client: Client,
    timeout: Duration,
}

impl HttpCallbackSender {
    pub fn new(ctx: &AppContext) -> Self {
        Self::with_client(ctx.http.clone(), ctx.config.callback.timeout())
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackSender {
    async fn send(&self, request: &CallbackRequest) -> Result<(), DispatchError> {
        let url = Url::parse(&request.url).map_err(|source| DispatchError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;

        info!(
            callback_url = %url,
            payload_length = request.payload.len(),
            timeout_seconds = self.timeout.as_secs_f64(),
            "callback_dispatch_starting"
        );

        let response = self
            .client
            .post(url.clone())
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(request.payload.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(callback_url = %url, error = %e, "callback_dispatch_timeout");
                    DispatchError::Timeout(self.timeout)
                } else {
                    error!(callback_url = %url, error = %e, "callback_dispatch_error");
                    DispatchError::Network(e)
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            error!(callback_url = %url, status_code = status, "callback_dispatch_rejected");
            return Err(DispatchError::UnexpectedStatus { status });
        }

        info!(callback_url = %url, status_code = status, "callback_dispatch_complete");
        Ok(())
    }
}
