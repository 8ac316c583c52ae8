use crate::puzzle_sliding16::utils::{MAX_BOARD_SIZE, DENIED};
use arrayvec::ArrayVec;
use std::fmt;

/// Direction in which the blank moves.
///
/// Applying a direction swaps the blank with the tile adjacent to it in that direction.
/// The discriminants index the rows of [`Neighbors`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    /// No move, e.g. before the first move of a search.
    None = 4,
}

impl Direction {
    /// All real directions, in the default search order.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

    #[inline(always)] pub fn index(self) -> usize { self as usize }

    /// Returns the direction with given `index` (`0..4`), or `None` for any other value.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Direction::Left,
            1 => Direction::Up,
            2 => Direction::Right,
            3 => Direction::Down,
            _ => Direction::None,
        }
    }

    /// Returns the direction that undoes `self`.
    #[inline] pub fn opposite(self) -> Self {
        match self {
            Direction::None => Direction::None,
            d => Self::from_index((d.index() + 2) % 4),
        }
    }

    /// Returns the direction that corresponds to `self` on the board mirrored by the main diagonal.
    #[inline] pub fn transposed(self) -> Self {
        match self {
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Left,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::None => Direction::None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Left => "LEFT",
            Direction::Up => "UP",
            Direction::Right => "RIGHT",
            Direction::Down => "DOWN",
            Direction::None => "NONE",
        })
    }
}

/// Stores indices of neighbors (or DENIED in the case of no neighbor) and is indexed by (in order): index of the cell and the direction.
pub type Neighbors = [[u8; 4]; MAX_BOARD_SIZE];

/// Returns index of cell with given (c, r) coordinates in the board with given number of cols.
#[inline(always)] pub fn cell_nr(cols: u8, c: u8, r: u8) -> u8 { r * cols + c }

/// Constructs neighbors matrix for the board of the size `cols` x `rows`.
pub fn construct_neighbors(cols: u8, rows: u8) -> Neighbors {
    let mut neighbors = [[DENIED; 4]; MAX_BOARD_SIZE];
    for r in 0..rows {
        for c in 0..cols {
            let cell = &mut neighbors[cell_nr(cols, c, r) as usize];
            if c != 0 { cell[Direction::Left.index()] = cell_nr(cols, c-1, r); }
            if r != 0 { cell[Direction::Up.index()] = cell_nr(cols, c, r-1); }
            if c+1 != cols { cell[Direction::Right.index()] = cell_nr(cols, c+1, r); }
            if r+1 != rows { cell[Direction::Down.index()] = cell_nr(cols, c, r+1); }
        }
    }
    neighbors
}

/// Returns directions in which the blank placed at `cell` can move.
pub fn moves_of(neighbors: &Neighbors, cell: u8) -> ArrayVec::<Direction, 4> {
    Direction::ALL.iter().copied()
        .filter(|d| neighbors[cell as usize][d.index()] != DENIED)
        .collect()
}
