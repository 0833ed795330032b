//! Session configuration.

use serde::{Deserialize, Serialize};

use super::errors::SessionError;
use crate::game::{
    GameMode,
    constants::{PLACEHOLDER_NAME, SUPPORTED_PLAYER_COUNTS},
    entities::sanitize_name,
};

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Seats in the session, the host's included. 4 or 6.
    pub required_player_count: usize,
    pub game_mode: GameMode,
    /// Name of the host's own seat.
    pub host_name: String,
    /// Messages queued per connection before broadcasts to it are dropped.
    pub outbound_buffer: usize,
    /// Fixed shuffle seed. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            required_player_count: SUPPORTED_PLAYER_COUNTS[0],
            game_mode: GameMode::default(),
            host_name: "Host".to_string(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfiguration`] describing the first
    /// bad field.
    pub fn validate(&self) -> Result<(), SessionError> {
        if !SUPPORTED_PLAYER_COUNTS.contains(&self.required_player_count) {
            return Err(SessionError::InvalidConfiguration(format!(
                "player count must be 4 or 6, got {}",
                self.required_player_count
            )));
        }
        if self.outbound_buffer == 0 {
            return Err(SessionError::InvalidConfiguration(
                "outbound buffer must be at least 1".to_string(),
            ));
        }
        // A placeholder name would keep the first deal waiting forever.
        let name = sanitize_name(&self.host_name);
        if name.is_empty() || name == PLACEHOLDER_NAME {
            return Err(SessionError::InvalidConfiguration(format!(
                "host name can't be empty or {PLACEHOLDER_NAME:?}"
            )));
        }
        Ok(())
    }
}
