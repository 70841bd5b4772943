use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::GameOutcome;
use super::bot_controller::{BotError, BotInput, calculate_minimax_move};
use super::types::{Board, BoardError, GameStatus, Mark, WinningLine};
use super::win_detector::{check_win_with_line, evaluate_status};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    HumanVsHuman,
    HumanVsBot { bot_mark: Mark },
}

impl GameMode {
    pub fn bot_mark(&self) -> Option<Mark> {
        match self {
            GameMode::HumanVsHuman => None,
            GameMode::HumanVsBot { bot_mark } => Some(*bot_mark),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("game is already over")]
    GameOver,

    #[error("not your turn")]
    NotYourTurn,

    #[error("{0} cannot be a player mark")]
    InvalidMark(Mark),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Bot(#[from] BotError),
}

#[derive(Debug, Clone)]
pub struct TicTacToeGameState {
    pub board: Board,
    pub mode: GameMode,
    pub current_mark: Mark,
    pub status: GameStatus,
    pub last_move: Option<usize>,
    outcome_taken: bool,
}

impl TicTacToeGameState {
    pub fn new(mode: GameMode, first_mark: Mark) -> Result<Self, GameError> {
        if let Some(bot_mark) = mode.bot_mark() {
            bot_mark.opponent().ok_or(GameError::InvalidMark(bot_mark))?;
        }
        first_mark.opponent().ok_or(GameError::InvalidMark(first_mark))?;

        Ok(Self {
            board: Board::empty(),
            mode,
            current_mark: first_mark,
            status: GameStatus::InProgress,
            last_move: None,
            outcome_taken: false,
        })
    }

    pub fn is_bot_turn(&self) -> bool {
        self.status == GameStatus::InProgress && self.mode.bot_mark() == Some(self.current_mark)
    }

    /// Applies a human move. Rejected while the bot is due to move.
    pub fn place_mark(&mut self, index: usize) -> Result<(), GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        if self.is_bot_turn() {
            return Err(GameError::NotYourTurn);
        }
        self.apply_move(index)
    }

    /// Computes and applies the bot's move, returning the chosen cell.
    pub fn play_bot_turn(&mut self) -> Result<Option<usize>, GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        if !self.is_bot_turn() {
            return Err(GameError::NotYourTurn);
        }

        let chosen = calculate_minimax_move(&BotInput::from_game_state(self))?;
        if let Some(index) = chosen {
            self.apply_move(index)?;
        }
        Ok(chosen)
    }

    /// Applies a move computed elsewhere for the bot, e.g. on a worker thread.
    pub fn apply_bot_move(&mut self, index: usize) -> Result<(), GameError> {
        if !self.is_bot_turn() {
            return Err(GameError::NotYourTurn);
        }
        self.apply_move(index)
    }

    fn apply_move(&mut self, index: usize) -> Result<(), GameError> {
        self.board = self.board.with_mark(index, self.current_mark)?;
        self.last_move = Some(index);
        self.status = evaluate_status(&self.board);

        if self.status == GameStatus::InProgress {
            self.switch_turn();
        }
        Ok(())
    }

    fn switch_turn(&mut self) {
        if let Some(next) = self.current_mark.opponent() {
            self.current_mark = next;
        }
    }

    pub fn winning_line(&self) -> Option<WinningLine> {
        check_win_with_line(&self.board)
    }

    /// Yields the outcome of a finished game once; later calls return `None`
    /// until the game is reset.
    pub fn take_outcome(&mut self) -> Option<GameOutcome> {
        if self.outcome_taken {
            return None;
        }
        let outcome = GameOutcome::from_status(self.status)?;
        self.outcome_taken = true;
        Some(outcome)
    }

    pub fn reset(&mut self, first_mark: Mark) -> Result<(), GameError> {
        *self = Self::new(self.mode, first_mark)?;
        Ok(())
    }
}
