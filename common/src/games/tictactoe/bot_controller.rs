use thiserror::Error;

use super::game_state::TicTacToeGameState;
use super::types::{BOARD_SIZE, Board, Mark};
use super::win_detector::check_win;

/// Outcome of a line of play from the bot's point of view. Not discounted by depth,
/// so a slow forced win scores the same as an immediate one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Score {
    Loss = -10,
    Draw = 0,
    Win = 10,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("bot mark must be X or O")]
    InvalidBotMark,

    #[error("game is already over, {winner} has won")]
    GameAlreadyOver { winner: Mark },
}

pub struct BotInput {
    pub board: Board,
    pub bot_mark: Mark,
}

impl BotInput {
    pub fn new(board: Board, bot_mark: Mark) -> Self {
        Self { board, bot_mark }
    }

    pub fn from_game_state(state: &TicTacToeGameState) -> Self {
        Self {
            board: state.board,
            bot_mark: state.current_mark,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    index: Option<usize>,
    score: Score,
}

impl Candidate {
    fn terminal(score: Score) -> Self {
        Self { index: None, score }
    }
}

/// Picks the minimax-optimal cell for `bot_mark` by searching the whole remaining tree.
///
/// Returns `Ok(None)` when the board is full. Among equally scored moves the lowest
/// index wins: a candidate only replaces the current best on a strict improvement,
/// and cells are scanned in ascending order.
pub fn calculate_minimax_move(input: &BotInput) -> Result<Option<usize>, BotError> {
    let bot_mark = input.bot_mark;
    let opponent_mark = bot_mark.opponent().ok_or(BotError::InvalidBotMark)?;

    if let Some(winner) = check_win(&input.board) {
        return Err(BotError::GameAlreadyOver { winner });
    }

    let mut cells = *input.board.cells();
    let best = minimax(&mut cells, bot_mark, bot_mark, opponent_mark);
    Ok(best.index)
}

fn minimax(
    cells: &mut [Mark; BOARD_SIZE],
    mark_to_move: Mark,
    bot_mark: Mark,
    opponent_mark: Mark,
) -> Candidate {
    match check_win(&Board::from(*cells)) {
        Some(winner) if winner == bot_mark => return Candidate::terminal(Score::Win),
        Some(_) => return Candidate::terminal(Score::Loss),
        None => {}
    }

    let next_mark = if mark_to_move == bot_mark {
        opponent_mark
    } else {
        bot_mark
    };
    let is_maximizing = mark_to_move == bot_mark;

    let mut best: Option<Candidate> = None;

    for index in 0..BOARD_SIZE {
        if cells[index] != Mark::Empty {
            continue;
        }

        cells[index] = mark_to_move;
        let score = minimax(cells, next_mark, bot_mark, opponent_mark).score;
        cells[index] = Mark::Empty;

        let improves = match best {
            None => true,
            Some(current) if is_maximizing => score > current.score,
            Some(current) => score < current.score,
        };
        if improves {
            best = Some(Candidate {
                index: Some(index),
                score,
            });
        }
    }

    // no empty cell and no winner
    best.unwrap_or(Candidate::terminal(Score::Draw))
}
