use serde::{Deserialize, Serialize};

use common::SessionId;
use common::games::tictactoe::{GameMode, GameStatus, Mark, TicTacToeGameState};

use crate::error::ServerError;

/// Parses a player mark from its wire form; an empty cell is not a player.
pub fn parse_player_mark(symbol: &str) -> Result<Mark, ServerError> {
    let mark = Mark::from_symbol(symbol)?;
    if mark == Mark::Empty {
        return Err(ServerError::InvalidRequest(
            "mark must be 'X' or 'O'".to_string(),
        ));
    }
    Ok(mark)
}

#[derive(Debug, Deserialize)]
pub struct BotMoveRequest {
    pub board: Vec<Option<String>>,
    pub bot_mark: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BotMoveResponse {
    pub index: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeRequest {
    Human,
    #[default]
    Bot,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateGameRequest {
    pub mode: ModeRequest,
    pub bot_mark: Option<String>,
    pub first_mark: Option<String>,
}

impl CreateGameRequest {
    pub fn game_mode(&self) -> Result<GameMode, ServerError> {
        match self.mode {
            ModeRequest::Human => Ok(GameMode::HumanVsHuman),
            ModeRequest::Bot => {
                let bot_mark = match self.bot_mark.as_deref() {
                    Some(symbol) => parse_player_mark(symbol)?,
                    None => Mark::O,
                };
                Ok(GameMode::HumanVsBot { bot_mark })
            }
        }
    }

    pub fn first_mark(&self) -> Result<Mark, ServerError> {
        parse_optional_first_mark(self.first_mark.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub index: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequest {
    pub first_mark: Option<String>,
}

impl ResetRequest {
    pub fn first_mark(&self) -> Result<Mark, ServerError> {
        parse_optional_first_mark(self.first_mark.as_deref())
    }
}

fn parse_optional_first_mark(symbol: Option<&str>) -> Result<Mark, ServerError> {
    match symbol {
        Some(symbol) => parse_player_mark(symbol),
        None => Ok(Mark::X),
    }
}

#[derive(Debug, Deserialize)]
pub struct IncrementStatsRequest {
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct GameView {
    pub id: String,
    pub board: Vec<Option<String>>,
    pub mode: ModeRequest,
    pub bot_mark: Option<String>,
    pub current_mark: String,
    pub status: &'static str,
    pub winner: Option<String>,
    pub winning_line: Option<[usize; 3]>,
    pub last_move: Option<usize>,
}

impl GameView {
    pub fn new(session_id: &SessionId, state: &TicTacToeGameState) -> Self {
        let (mode, bot_mark) = match state.mode {
            GameMode::HumanVsHuman => (ModeRequest::Human, None),
            GameMode::HumanVsBot { bot_mark } => (ModeRequest::Bot, Some(bot_mark.symbol().to_string())),
        };
        let winning_line = state.winning_line();

        Self {
            id: session_id.to_string(),
            board: state.board.to_symbols(),
            mode,
            bot_mark,
            current_mark: state.current_mark.symbol().to_string(),
            status: status_name(state.status),
            winner: winning_line.map(|line| line.mark.symbol().to_string()),
            winning_line: winning_line.map(|line| line.cells),
            last_move: state.last_move,
        }
    }
}

fn status_name(status: GameStatus) -> &'static str {
    match status {
        GameStatus::InProgress => "in_progress",
        GameStatus::XWon => "x_won",
        GameStatus::OWon => "o_won",
        GameStatus::Draw => "draw",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_mark() {
        assert_eq!(parse_player_mark("x").unwrap(), Mark::X);
        assert_eq!(parse_player_mark("O").unwrap(), Mark::O);
        assert!(parse_player_mark("").is_err());
        assert!(parse_player_mark("Q").is_err());
    }

    #[test]
    fn test_create_request_defaults_to_bot_playing_o() {
        let request = CreateGameRequest::default();

        assert_eq!(
            request.game_mode().unwrap(),
            GameMode::HumanVsBot { bot_mark: Mark::O }
        );
        assert_eq!(request.first_mark().unwrap(), Mark::X);
    }

    #[test]
    fn test_game_view_reports_winner() {
        let mut state = TicTacToeGameState::new(GameMode::HumanVsHuman, Mark::X).unwrap();
        for index in [2, 0, 4, 1, 6] {
            state.place_mark(index).unwrap();
        }
        let view = GameView::new(&SessionId::new("s1".to_string()), &state);

        assert_eq!(view.status, "x_won");
        assert_eq!(view.winner.as_deref(), Some("X"));
        assert_eq!(view.winning_line, Some([2, 4, 6]));
        assert_eq!(view.board[1].as_deref(), Some("O"));
        assert_eq!(view.board[3], None);
    }
}
