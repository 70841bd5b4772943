use super::types::{Board, Mark};

pub fn get_available_moves(board: &Board) -> Vec<usize> {
    board
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, cell)| **cell == Mark::Empty)
        .map(|(index, _)| index)
        .collect()
}

pub fn is_board_full(board: &Board) -> bool {
    board.cells().iter().all(|&cell| cell != Mark::Empty)
}
