//! Running totals across the rounds of a session.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::game::{RoundResult, TeamId, constants::TEAM_IDS};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Scoreboard {
    pub rounds_played: u32,
    pub rounds_won: BTreeMap<TeamId, u32>,
    /// Rounds won by kot, counted in `rounds_won` as well.
    pub kots: BTreeMap<TeamId, u32>,
    pub draws: u32,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    #[must_use]
    pub fn new() -> Self {
        let zeroed = || TEAM_IDS.iter().map(|&id| (id, 0)).collect();
        Self {
            rounds_played: 0,
            rounds_won: zeroed(),
            kots: zeroed(),
            draws: 0,
        }
    }

    pub fn record(&mut self, result: &RoundResult) {
        self.rounds_played += 1;
        match result.winning_team {
            Some(team) => {
                *self.rounds_won.entry(team).or_insert(0) += 1;
                if result.is_kot {
                    *self.kots.entry(team).or_insert(0) += 1;
                }
            }
            None => self.draws += 1,
        }
    }

    /// Team with strictly more rounds won than any other.
    #[must_use]
    pub fn leader(&self) -> Option<TeamId> {
        let top = self.rounds_won.values().copied().max()?;
        let mut leaders = self.rounds_won.iter().filter(|&(_, &won)| won == top);
        match (leaders.next(), leaders.next()) {
            (Some((&team, _)), None) => Some(team),
            _ => None,
        }
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let teams = self
            .rounds_won
            .iter()
            .map(|(team, won)| {
                let kots = self.kots.get(team).copied().unwrap_or(0);
                format!("team {team}: {won} won ({kots} kot)")
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{teams}, {} drawn", self.draws)
    }
}
