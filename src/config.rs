//! Configuration parsing and validation for the relay server
//!
//! This module handles command-line argument parsing and validation using clap.
//! Every option can also be supplied through the environment variable named in
//! its `env` attribute.
use anyhow::anyhow;
use chatrelay::auth::BearerToken;
use chatrelay::relay::{DEFAULT_UPSTREAM_URL, RelayConfig};
use clap::Parser;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the relay server will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Bearer token for the upstream model API. The server still starts without
    /// one; chat requests then report the misconfiguration.
    #[arg(long, env = "AWS_BEARER_TOKEN_BEDROCK", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// The upstream converse endpoint.
    #[arg(long, env = "CHATRELAY_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: Url,

    /// Overall timeout (in seconds) for one upstream call.
    #[arg(long, env = "CHATRELAY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Maximum number of idle HTTP connections to keep alive per upstream host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "chatrelay")]
    pub metrics_prefix: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, env = "CHATRELAY_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("Upstream timeout must be at least one second"));
        }
        if !matches!(self.upstream_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Upstream URL '{}' must use http or https",
                self.upstream_url
            ));
        }
        if self.metrics && self.metrics_port == self.port {
            return Err(anyhow!(
                "Metrics port {} clashes with the server port",
                self.metrics_port
            ));
        }
        Ok(self)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig::builder()
            .upstream_url(self.upstream_url.clone())
            .maybe_bearer_token(BearerToken::from_config_value(self.bearer_token.clone()))
            .timeout(Duration::from_secs(self.timeout_secs))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .build()
    }
}
