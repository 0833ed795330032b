//! Host configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. CLI flags override the environment.

use mindikot::{
    GameMode, SessionConfig,
    constants::{MAX_NAME_LENGTH, PLACEHOLDER_NAME, SUPPORTED_PLAYER_COUNTS},
    session::config::DEFAULT_OUTBOUND_BUFFER,
};
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "0.0.0.0:6969";

/// Values given on the command line, each taking precedence over the
/// matching environment variable.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub players: Option<usize>,
    pub mode: Option<GameMode>,
    pub name: Option<String>,
}

/// Complete host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind: SocketAddr,
    pub players: usize,
    pub mode: GameMode,
    /// Name shown for the host's own seat.
    pub host_name: String,
    /// Messages queued per connection before broadcasts to it are dropped.
    pub outbound_buffer: usize,
    /// Fixed shuffle seed, for reproducible deals.
    pub seed: Option<u64>,
}

impl HostConfig {
    /// Load configuration from environment variables, then apply CLI
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but can't be parsed.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env::<SocketAddr>("MINDIKOT_BIND")?
                .map_or_else(|| DEFAULT_BIND.parse(), Ok)
                .map_err(|_| ConfigError::Invalid {
                    var: "MINDIKOT_BIND".to_string(),
                    reason: "Must be an IP:PORT address".to_string(),
                })?,
        };

        let players = match overrides.players {
            Some(players) => players,
            None => parse_env("MINDIKOT_PLAYERS")?.unwrap_or(SUPPORTED_PLAYER_COUNTS[0]),
        };

        let mode = match overrides.mode {
            Some(mode) => mode,
            None => parse_env("MINDIKOT_MODE")?.unwrap_or_default(),
        };

        let host_name = overrides
            .name
            .or_else(|| std::env::var("MINDIKOT_HOST_NAME").ok())
            .unwrap_or_else(whoami::username);

        Ok(Self {
            bind,
            players,
            mode,
            host_name,
            outbound_buffer: parse_env_or("MINDIKOT_OUTBOUND_BUFFER", DEFAULT_OUTBOUND_BUFFER),
            seed: parse_env("MINDIKOT_SEED")?,
        })
    }

    /// Validate configuration after loading.
    ///
    /// # Errors
    ///
    /// Names the first variable holding a bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_PLAYER_COUNTS.contains(&self.players) {
            return Err(ConfigError::Invalid {
                var: "MINDIKOT_PLAYERS".to_string(),
                reason: format!("Must be 4 or 6, got {}", self.players),
            });
        }

        if self.outbound_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: "MINDIKOT_OUTBOUND_BUFFER".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let name = self.host_name.trim();
        if name == PLACEHOLDER_NAME {
            return Err(ConfigError::Invalid {
                var: "MINDIKOT_HOST_NAME".to_string(),
                reason: format!("{PLACEHOLDER_NAME:?} is reserved for empty seats"),
            });
        }
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(ConfigError::Invalid {
                var: "MINDIKOT_HOST_NAME".to_string(),
                reason: format!("Must be 1 to {MAX_NAME_LENGTH} characters"),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            required_player_count: self.players,
            game_mode: self.mode,
            host_name: self.host_name.clone(),
            outbound_buffer: self.outbound_buffer,
            seed: self.seed,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parses an optional environment variable, failing only when it's set to
/// something unparsable.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|error: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: error.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
