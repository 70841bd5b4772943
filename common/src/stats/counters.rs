use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::games::tictactoe::GameStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    XWon,
    OWon,
    Draw,
}

impl GameOutcome {
    pub fn from_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::XWon => Some(GameOutcome::XWon),
            GameStatus::OWon => Some(GameOutcome::OWon),
            GameStatus::Draw => Some(GameOutcome::Draw),
            GameStatus::InProgress => None,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            GameOutcome::XWon => "X",
            GameOutcome::OWon => "O",
            GameOutcome::Draw => "DRAW",
        }
    }
}

impl FromStr for GameOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(GameOutcome::XWon),
            "O" => Ok(GameOutcome::OWon),
            "DRAW" => Ok(GameOutcome::Draw),
            other => Err(format!("Unknown game result '{}'", other)),
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCounters {
    #[serde(default)]
    pub wins_x: u64,
    #[serde(default)]
    pub wins_o: u64,
    #[serde(default)]
    pub draws: u64,
}

impl StatsCounters {
    pub fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::XWon => self.wins_x += 1,
            GameOutcome::OWon => self.wins_o += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    pub fn total_games(&self) -> u64 {
        self.wins_x + self.wins_o + self.draws
    }
}
