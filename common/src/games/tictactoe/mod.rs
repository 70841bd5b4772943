pub mod board;
pub mod bot_controller;
pub mod game_state;
pub mod types;
pub mod win_detector;

pub use board::{get_available_moves, is_board_full};
pub use bot_controller::{BotError, BotInput, Score, calculate_minimax_move};
pub use game_state::{GameError, GameMode, TicTacToeGameState};
pub use types::{BOARD_SIZE, Board, BoardError, GameStatus, Mark, WinningLine};
pub use win_detector::{WIN_LINES, check_win, check_win_with_line, evaluate_status};
