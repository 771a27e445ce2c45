//! Shared application context built once at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use reqwest::Client;
use tracing::info;

use crate::config::Config;

/// Everything the adapters need to construct themselves.
///
/// Built once in `main` and handed to every constructor; nothing is looked
/// up from process globals.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub aws: SdkConfig,
    pub http: Client,
}

impl AppContext {
    pub fn new(config: Config, aws: SdkConfig, http: Client) -> Self {
        Self {
            config: Arc::new(config),
            aws,
            http,
        }
    }

    /// Build the context from loaded configuration, resolving AWS
    /// credentials and region through the default provider chain.
    pub async fn from_config(config: Config) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.aws.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.aws.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let aws = loader.load().await;

        info!(
            region = ?aws.region().map(|r| r.to_string()),
            endpoint_override = config.aws.endpoint_url.is_some(),
            "aws_config_loaded"
        );

        let http = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::new(config, aws, http))
    }
}
