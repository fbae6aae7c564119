//! Configuration management for the dead queue check

use crate::errors::{CheckError, Result};
use crate::silence::SilenceSpec;
use clap::Parser;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Command line surface. Every option can also come from the environment.
#[derive(Debug, Parser)]
#[command(name = "check-sidekiq-dead")]
#[command(about = "Check that the Sidekiq dead queue is empty")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Url to query
    #[arg(short, long, env = "SIDEKIQ_STATS_URL")]
    pub url: String,

    /// Basic auth credentials if you need them
    #[arg(short, long, value_name = "USER:PASSWORD", env = "SIDEKIQ_STATS_AUTH")]
    pub auth: Option<Credentials>,

    /// Time period in 24h format to silence alerts
    #[arg(short, long, value_name = "START_TIME-NUMBER_OF_HOURS", env = "SIDEKIQ_SILENCE")]
    pub silence: Option<SilenceSpec>,

    /// Disables alerting for the dead queue during weekends
    #[arg(
        short = 'w',
        long,
        value_name = "true|false",
        env = "SIDEKIQ_SILENCE_WEEKENDS",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub silence_weekends: bool,

    /// Request timeout in seconds for the stats endpoint
    #[arg(short, long, value_name = "SECONDS", env = "SIDEKIQ_STATS_TIMEOUT")]
    pub timeout: Option<u64>,
}

/// Basic auth credential pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl FromStr for Credentials {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        let (username, password) = s.split_once(':').ok_or_else(|| {
            CheckError::Config("auth must be given as USER:PASSWORD".to_string())
        })?;

        if username.is_empty() {
            return Err(CheckError::Config("auth username cannot be empty".to_string()));
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

// Keep the password out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Flatten a clap error into one line, dropping the usage and help hints
pub fn argument_error_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with("Usage:") && !line.starts_with("For more information"))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match message.strip_prefix("error: ") {
        Some(stripped) => stripped.to_string(),
        None if message.is_empty() => "invalid arguments".to_string(),
        None => message,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sidekiq stats endpoint
    pub url: String,

    /// Optional basic auth credentials
    pub auth: Option<Credentials>,

    /// Optional recurring daily silence period
    pub silence: Option<SilenceSpec>,

    /// Silence the check on Saturdays and Sundays (UTC)
    pub silence_weekends: bool,

    /// HTTP timeout, client default when unset
    pub http_timeout: Option<Duration>,
}

impl Config {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
            silence: None,
            silence_weekends: false,
            http_timeout: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(CheckError::Config("url cannot be empty".to_string()));
        }

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(CheckError::Config(format!(
                "url '{}' must use http or https",
                self.url
            )));
        }

        if self.http_timeout == Some(Duration::ZERO) {
            return Err(CheckError::Config("timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = CheckError;

    fn try_from(cli: Cli) -> Result<Self> {
        let config = Config {
            url: cli.url,
            auth: cli.auth,
            silence: cli.silence,
            silence_weekends: cli.silence_weekends,
            http_timeout: cli.timeout.map(Duration::from_secs),
        };

        config.validate()?;
        Ok(config)
    }
}
