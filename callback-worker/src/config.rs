//! Configuration module for YAML config files.
//!
//! Files are layered in the order given on the command line, so later files
//! override keys set by earlier ones. Environment variables prefixed with
//! `INGESTION_CALLBACK` (separator `__`) are applied last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::ConfigError;

/// Prefix for environment overrides, e.g. `INGESTION_CALLBACK__SQS__QUEUE_NAME`.
pub const ENV_PREFIX: &str = "INGESTION_CALLBACK";

/// SQS allows at most 10 messages per receive call.
pub const MAX_RECEIVE_BATCH: i32 = 10;

/// Application configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sqs: QueueConfig,

    pub s3: StoreConfig,

    #[serde(default)]
    pub callback: CallbackConfig,

    #[serde(default)]
    pub consumer: ConsumerConfig,

    #[serde(default)]
    pub aws: AwsConfig,
}

/// Notification queue settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Queue name, resolved to a url once at startup
    pub queue_name: String,
}

/// Document bucket settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub bucket: String,

    /// Path-style addressing, needed by most S3 emulators
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackConfig {
    /// HTTP request timeout for callback calls
    #[serde(default = "default_callback_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_callback_timeout_secs(),
        }
    }
}

impl CallbackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    /// Delay between two poll cycles
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Messages requested per poll
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,

    /// Acknowledge notifications that need no callback (non-create events,
    /// empty keys). When false they are left for redelivery.
    #[serde(default = "default_ack_skipped")]
    pub ack_skipped: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_messages: default_max_messages(),
            ack_skipped: default_ack_skipped(),
        }
    }
}

impl ConsumerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Batch size clamped to what a single receive call accepts.
    pub fn batch_size(&self) -> i32 {
        self.max_messages.clamp(1, MAX_RECEIVE_BATCH)
    }
}

/// Optional overrides for the AWS SDK; unset fields fall back to the
/// default credential and region chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_callback_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_messages() -> i32 {
    MAX_RECEIVE_BATCH
}

fn default_ack_skipped() -> bool {
    true
}

impl Config {
    /// Read and merge configuration from the given YAML files.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        Self::load(paths, env_overrides())
    }

    fn load<P: AsRef<Path>>(paths: &[P], env: Environment) -> Result<Self, ConfigError> {
        if paths.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut builder = ::config::Config::builder();
        for path in paths {
            let path = path.as_ref();
            validate_path(path)?;
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

/// Make sure a path names a regular file that can be read.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|source| ConfigError::Unreadable {
        path: PathBuf::from(path),
        source,
    })?;

    if metadata.is_dir() {
        return Err(ConfigError::IsDirectory(PathBuf::from(path)));
    }

    Ok(())
}
