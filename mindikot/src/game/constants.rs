//! Game-wide constants.

use super::entities::TeamId;

/// Player counts a Mindikot table can be set up for.
pub const SUPPORTED_PLAYER_COUNTS: [usize; 2] = [4, 6];

/// Seat reserved for the hosting player.
pub const HOST_SEAT: usize = 0;

/// Name shown for a seat that is connected but hasn't introduced itself.
pub const PLACEHOLDER_NAME: &str = "Waiting...";

/// Suffix appended to a seat's name once its connection drops mid-game.
pub const LEFT_SUFFIX: &str = " [LEFT]";

/// Names are trimmed and truncated to this many characters.
pub const MAX_NAME_LENGTH: usize = 24;

/// Team ids in seating order. Even seats play for the first team.
pub const TEAM_IDS: [TeamId; 2] = [1, 2];

/// Number of tens a team must collect for a kot.
pub const TENS_FOR_KOT: usize = 4;
