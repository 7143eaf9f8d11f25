//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::util::time::{DEFAULT_TICK_RATE, MAX_TICK_RATE};

/// Bind address used when nothing else is configured
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8765";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Maximum time a single outbound frame may take to write
    pub send_timeout: Duration,
    /// Frames buffered per connection before new ones are dropped
    pub outbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8765)),
            log_level: "info".to_string(),
            tick_rate: DEFAULT_TICK_RATE,
            send_timeout: Duration::from_millis(250),
            outbox_capacity: 8,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// The first command-line argument, if present, overrides the bind address.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok(), env::args().nth(1))
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, addr_arg: Option<String>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Hosting platforms hand out PORT, fall back to SERVER_ADDR or default
        let server_addr = match (addr_arg, lookup("PORT")) {
            (Some(addr), _) => addr,
            (None, Some(port)) => format!("0.0.0.0:{}", port),
            (None, None) => {
                lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string())
            }
        };

        let tick_rate = match lookup("TICK_RATE") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|rate| (1..=MAX_TICK_RATE).contains(rate))
                .ok_or(ConfigError::InvalidValue("TICK_RATE"))?,
            None => defaults.tick_rate,
        };

        let send_timeout = match lookup("SEND_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::InvalidValue("SEND_TIMEOUT_MS"))?,
            None => defaults.send_timeout,
        };

        let outbox_capacity = match lookup("OUTBOX_CAPACITY") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|cap| *cap > 0)
                .ok_or(ConfigError::InvalidValue("OUTBOX_CAPACITY"))?,
            None => defaults.outbox_capacity,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            tick_rate,
            send_timeout,
            outbox_capacity,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid server address format: {0}")]
    InvalidAddress(String),
}
