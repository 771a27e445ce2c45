//! Command line surface.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::ConfigError;

#[derive(Debug, Parser)]
#[command(name = "ingestion-callback", about = "ingestion-callback command")]
pub struct Cli {
    /// Config file; repeat to layer several files
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Vec<PathBuf>,

    /// Use the dev profile (human-readable debug logs)
    #[arg(long, global = true, default_value_t = false)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run ingestion-callback server
    Server {
        /// Listen address for the health endpoint
        #[arg(long, default_value = ":8000")]
        port: String,
    },
}

impl Cli {
    /// Load the layered configuration named by `--config`.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        Config::from_paths(self.config.as_slice())
    }
}

/// Parse a listen address, accepting the `:8000` shorthand for all interfaces.
pub fn parse_listen_addr(raw: &str) -> Result<SocketAddr, std::net::AddrParseError> {
    if let Some(port) = raw.strip_prefix(':') {
        format!("0.0.0.0:{}", port).parse()
    } else {
        raw.parse()
    }
}
