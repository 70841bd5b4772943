use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BOARD_SIZE: usize = 9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    #[default]
    Empty,
    X,
    O,
}

impl Mark {
    pub fn opponent(&self) -> Option<Mark> {
        match self {
            Mark::X => Some(Mark::O),
            Mark::O => Some(Mark::X),
            Mark::Empty => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
            Mark::Empty => "",
        }
    }

    /// Parses `"X"`/`"O"` (case-insensitive) and `""` for an empty cell.
    pub fn from_symbol(symbol: &str) -> Result<Mark, BoardError> {
        match symbol.trim() {
            "X" | "x" => Ok(Mark::X),
            "O" | "o" => Ok(Mark::O),
            "" => Ok(Mark::Empty),
            other => Err(BoardError::InvalidMark(other.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Mark::Empty
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Empty => write!(f, "."),
            _ => write!(f, "{}", self.symbol()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must have exactly 9 cells, got {0}")]
    InvalidLength(usize),

    #[error("invalid mark '{0}' (expected 'X', 'O' or empty)")]
    InvalidMark(String),

    #[error("cell index {0} is out of bounds")]
    IndexOutOfBounds(usize),

    #[error("cell {0} is already marked")]
    CellOccupied(usize),
}

/// The 3x3 grid, row-major: row 0 is indices 0..3, row 1 is 3..6, row 2 is 6..9.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board([Mark; BOARD_SIZE]);

impl Board {
    pub fn empty() -> Self {
        Self([Mark::Empty; BOARD_SIZE])
    }

    pub fn from_cells(cells: &[Mark]) -> Result<Self, BoardError> {
        let cells: [Mark; BOARD_SIZE] = cells
            .try_into()
            .map_err(|_| BoardError::InvalidLength(cells.len()))?;
        Ok(Self(cells))
    }

    /// Builds a board from its wire form, where `None` marks an empty cell.
    pub fn from_symbols(symbols: &[Option<String>]) -> Result<Self, BoardError> {
        let cells = symbols
            .iter()
            .map(|symbol| match symbol {
                Some(s) => Mark::from_symbol(s),
                None => Ok(Mark::Empty),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_cells(&cells)
    }

    pub fn to_symbols(&self) -> Vec<Option<String>> {
        self.0
            .iter()
            .map(|mark| match mark {
                Mark::Empty => None,
                m => Some(m.symbol().to_string()),
            })
            .collect()
    }

    pub fn cells(&self) -> &[Mark; BOARD_SIZE] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        self.0.get(index).copied()
    }

    /// Returns a new board with `mark` placed at `index`; `self` is left untouched.
    pub fn with_mark(&self, index: usize, mark: Mark) -> Result<Self, BoardError> {
        let cell = self.get(index).ok_or(BoardError::IndexOutOfBounds(index))?;
        if !cell.is_empty() {
            return Err(BoardError::CellOccupied(index));
        }
        let mut cells = self.0;
        cells[index] = mark;
        Ok(Self(cells))
    }
}

impl From<[Mark; BOARD_SIZE]> for Board {
    fn from(cells: [Mark; BOARD_SIZE]) -> Self {
        Self(cells)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_index, row) in self.0.chunks(3).enumerate() {
            if row_index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}{}{}", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    XWon,
    OWon,
    Draw,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        *self != GameStatus::InProgress
    }

    /// Status of a game won by `mark`; an empty cell wins nothing.
    pub fn won_by(mark: Mark) -> Option<GameStatus> {
        match mark {
            Mark::X => Some(GameStatus::XWon),
            Mark::O => Some(GameStatus::OWon),
            Mark::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinningLine {
    pub mark: Mark,
    pub cells: [usize; 3],
}

impl WinningLine {
    pub fn new(mark: Mark, cells: [usize; 3]) -> Self {
        Self { mark, cells }
    }
}
