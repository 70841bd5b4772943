use super::board::is_board_full;
use super::types::{Board, GameStatus, Mark, WinningLine};

pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the mark occupying a full line, if any. Draws are not reported here.
pub fn check_win(board: &Board) -> Option<Mark> {
    check_win_with_line(board).map(|line| line.mark)
}

pub fn check_win_with_line(board: &Board) -> Option<WinningLine> {
    let cells = board.cells();
    WIN_LINES.iter().find_map(|&[a, b, c]| {
        let mark = cells[a];
        if mark != Mark::Empty && mark == cells[b] && mark == cells[c] {
            Some(WinningLine::new(mark, [a, b, c]))
        } else {
            None
        }
    })
}

pub fn evaluate_status(board: &Board) -> GameStatus {
    if let Some(status) = check_win(board).and_then(GameStatus::won_by) {
        status
    } else if is_board_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}
