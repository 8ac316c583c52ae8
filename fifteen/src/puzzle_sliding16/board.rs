use crate::error::BoardError;
use crate::puzzle_sliding16::heuristic::TileMove;
use crate::puzzle_sliding16::neighbors::Direction;
use crate::puzzle_sliding16::state::{self, State};
use crate::puzzle_sliding16::utils::MAX_SIDE;
use arrayvec::ArrayVec;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// Returns the cell that `cell` is mapped to by the mirror in the main diagonal of the board with given `side`.
#[inline(always)] pub fn transposed_cell(cell: u8, side: u8) -> u8 {
    (cell % side) * side + cell / side
}

/// Returns the side of a square board with `len` cells, if supported.
fn side_for_len(len: usize) -> Option<u8> {
    (2..=MAX_SIDE as u8).find(|s| (*s as usize) * (*s as usize) == len)
}

/// Immutable square board of the sliding puzzle.
///
/// Goal: blank in cell 0 and tile `t` in cell `t` (cells are numbered row-major).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    state: State,
    side: u8,
    blank: u8,
}

impl Board {
    /// Constructs board from row-major `tiles` (0 = blank).
    ///
    /// The length of `tiles` must be 4, 9 or 16 and the tiles must form a permutation of `0..tiles.len()`.
    pub fn new(tiles: &[u8]) -> Result<Self, BoardError> {
        let side = side_for_len(tiles.len()).ok_or(BoardError::WrongLength(tiles.len()))?;
        let mut seen = 0u32;
        for &t in tiles {
            if t as usize >= tiles.len() {
                return Err(BoardError::TileOutOfRange { tile: t, size: tiles.len() });
            }
            if seen & (1 << t) != 0 { return Err(BoardError::DuplicateTile(t)); }
            seen |= 1 << t;
        }
        Ok(Self::with_state(tiles.iter().copied().collect(), side))
    }

    /// Constructs board from data given in the format that assumes blank to be in the bottom-right corner of the goal state.
    pub fn from_bottom_right_format(tiles: &[u8]) -> Result<Self, BoardError> {
        let board = Self::new(tiles)?;
        let s = tiles.len() as u8;
        Ok(Self::with_state(tiles.iter().rev().map(|t| state::from_bottom_right_format(*t, s)).collect(), board.side))
    }

    /// Constructs board from valid packed `state` of the board with given `side`.
    pub(crate) fn with_state(state: State, side: u8) -> Self {
        let size = side * side;
        let blank = state.position_of(0, size).unwrap_or(0);
        Self { state, side, blank }
    }

    /// Returns the goal board with given `side` (2, 3 or 4).
    pub fn goal(side: u8) -> Self {
        assert!((2..=MAX_SIDE as u8).contains(&side), "unsupported board side {}", side);
        Self { state: State::goal(side * side), side, blank: 0 }
    }

    /// Returns uniformly drawn solvable board with given `side`.
    pub fn random<R: Rng + ?Sized>(side: u8, rng: &mut R) -> Self {
        let goal = Self::goal(side);
        let mut tiles = goal.to_bytes();
        tiles.shuffle(rng);
        let mut board = Self::with_state(tiles.iter().copied().collect(), side);
        if !board.is_solvable() {
            // swapping two tiles (not blank) changes the parity of permutation
            let blank = board.blank;
            let mut non_blank = (0..board.size()).filter(move |c| *c != blank);
            if let (Some(a), Some(b)) = (non_blank.next(), non_blank.next()) {
                tiles.swap(a as usize, b as usize);
                board = Self::with_state(tiles.iter().copied().collect(), side);
            }
        }
        board
    }

    /// Returns the board obtained from the goal by `moves` random moves, never undoing the previous move.
    pub fn random_walk<R: Rng + ?Sized>(side: u8, moves: u16, rng: &mut R) -> Self {
        let mut board = Self::goal(side);
        let mut previous = Direction::None;
        for _ in 0..moves {
            let candidates: ArrayVec<Direction, 4> = board.valid_moves().into_iter()
                .filter(|d| *d != previous.opposite())
                .collect();
            if let Some(d) = candidates.choose(rng) {
                if let Some(next) = board.shift(*d) { board = next; }
                previous = *d;
            }
        }
        board
    }

    #[inline(always)] pub fn side(&self) -> u8 { self.side }

    /// Returns the number of cells.
    #[inline(always)] pub fn size(&self) -> u8 { self.side * self.side }

    /// Returns the cell occupied by blank.
    #[inline(always)] pub fn blank(&self) -> u8 { self.blank }

    #[inline(always)] pub fn state(&self) -> State { self.state }

    #[inline(always)] pub fn tile_at(&self, cell: u8) -> u8 { self.state.tile_at(cell) }

    /// Returns the iterator over tiles, in row-major cell order.
    #[inline] pub fn tiles(&self) -> state::TilesIterator { self.state.tiles(self.size()) }

    /// Returns the row-major byte encoding of the board.
    pub fn to_bytes(&self) -> Vec<u8> { self.tiles().collect() }

    #[inline] pub fn is_goal(&self) -> bool { self.state == State::goal(self.size()) }

    /// Checks whether the goal can be reached from `self`.
    ///
    /// Each move swaps blank with a neighbor, so it changes both the parity of the tile permutation
    /// and the parity of the blank's row+column. Thus the board is solvable iff the two parities are equal.
    pub fn is_solvable(&self) -> bool {
        let tiles = self.to_bytes();
        let mut inversions = 0u32;
        for (i, a) in tiles.iter().enumerate() {
            inversions += tiles[i+1..].iter().filter(|b| *b < a).count() as u32;
        }
        let blank_parity = (self.blank / self.side + self.blank % self.side) as u32;
        inversions % 2 == blank_parity % 2
    }

    /// Returns the cell the blank moves to in direction `d`, or `None` if `d` is illegal.
    pub fn neighbor_cell(&self, d: Direction) -> Option<u8> {
        let (r, c) = (self.blank / self.side, self.blank % self.side);
        match d {
            Direction::Left if c > 0 => Some(self.blank - 1),
            Direction::Up if r > 0 => Some(self.blank - self.side),
            Direction::Right if c + 1 < self.side => Some(self.blank + 1),
            Direction::Down if r + 1 < self.side => Some(self.blank + self.side),
            _ => None,
        }
    }

    /// Returns the legal directions from the current blank position.
    pub fn valid_moves(&self) -> ArrayVec<Direction, 4> {
        Direction::ALL.iter().copied().filter(|d| self.neighbor_cell(*d).is_some()).collect()
    }

    /// Returns the board after moving blank to `new_blank` cell (which must neighbor the blank) and the description of the move.
    #[inline] pub(crate) fn moved_blank(&self, new_blank: u8) -> (Self, TileMove) {
        let mut state = self.state;
        let tile = state.move_blank(self.blank, new_blank);
        (Self { state, side: self.side, blank: new_blank }, TileMove { tile, from: new_blank, to: self.blank })
    }

    /// Returns the board after moving blank in direction `d` together with the description of the move,
    /// or `None` if `d` is illegal.
    #[inline] pub fn step(&self, d: Direction) -> Option<(Self, TileMove)> {
        self.neighbor_cell(d).map(|cell| self.moved_blank(cell))
    }

    /// Returns the board after moving blank in direction `d`, or `None` if `d` is illegal.
    #[inline] pub fn shift(&self, d: Direction) -> Option<Self> {
        self.step(d).map(|(board, _)| board)
    }

    /// Returns the board after applying all `moves`, or `None` if any of them is illegal.
    pub fn apply(&self, moves: &[Direction]) -> Option<Self> {
        moves.iter().try_fold(*self, |board, d| board.shift(*d))
    }

    /// Returns the board mirrored in the main diagonal, with tiles relabeled so that the goal maps onto itself.
    pub fn symmetric(&self) -> Self {
        let side = self.side;
        let state = (0..self.size())
            .map(|cell| transposed_cell(self.state.tile_at(transposed_cell(cell, side)), side))
            .collect();
        Self { state, side, blank: transposed_cell(self.blank, side) }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (cell, tile) in self.tiles().enumerate() {
            if tile == 0 { write!(f, "  ")?; } else { write!(f, "{:>2}", tile)?; }
            if (cell as u8 + 1) % self.side == 0 { writeln!(f)?; } else { write!(f, " ")?; }
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board{:?}", self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_invalid_boards() {
        assert_eq!(Board::new(&[0, 1, 2]), Err(BoardError::WrongLength(3)));
        assert_eq!(Board::new(&[0, 1, 2, 4]), Err(BoardError::TileOutOfRange { tile: 4, size: 4 }));
        assert_eq!(Board::new(&[0, 1, 1, 3]), Err(BoardError::DuplicateTile(1)));
        assert!(Board::new(&[3, 1, 2, 0]).is_ok());
    }

    #[test]
    fn test_goal_and_solvability_33() {
        let goal = Board::goal(3);
        assert!(goal.is_goal());
        assert!(goal.is_solvable());
        assert_eq!(goal.to_bytes(), [0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let swapped = Board::new(&[0, 2, 1, 3, 4, 5, 6, 7, 8]).unwrap();
        assert!(!swapped.is_solvable());
        let moved = goal.shift(Direction::Right).unwrap();
        assert_eq!(moved.to_bytes(), [1, 0, 2, 3, 4, 5, 6, 7, 8]);
        assert!(moved.is_solvable());
    }

    #[test]
    fn test_solvability_44() {
        // needs 52 moves
        let b = Board::new(&[14, 7, 1, 9, 12, 3, 6, 15, 8, 11, 2, 5, 10, 0, 4, 13]).unwrap();
        assert!(b.is_solvable());
        let b = Board::new(&[1, 0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 15, 14]).unwrap();
        assert!(!b.is_solvable());
    }

    #[test]
    fn test_moves() {
        let goal = Board::goal(4);
        assert_eq!(goal.valid_moves().as_slice(), &[Direction::Right, Direction::Down]);
        assert!(goal.shift(Direction::Left).is_none());
        assert!(goal.shift(Direction::Up).is_none());
        let (down, mv) = goal.step(Direction::Down).unwrap();
        assert_eq!(mv, TileMove { tile: 4, from: 4, to: 0 });
        assert_eq!(down.blank(), 4);
        assert_eq!(down.tile_at(0), 4);
        assert_eq!(down.valid_moves().as_slice(), &[Direction::Up, Direction::Right, Direction::Down]);
        assert_eq!(goal.apply(&[Direction::Down, Direction::Right, Direction::Up]).unwrap().to_bytes(),
                   [4, 0, 2, 3, 5, 1, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert!(goal.apply(&[Direction::Up]).is_none());
    }

    #[test]
    fn test_shift_is_reversible() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for side in 2..=4 {
            for _ in 0..50 {
                let b = Board::random(side, &mut rng);
                for d in b.valid_moves() {
                    let after = b.shift(d).unwrap();
                    assert!(after.valid_moves().contains(&d.opposite()));
                    assert_eq!(after.shift(d.opposite()), Some(b));
                }
            }
        }
    }

    #[test]
    fn test_symmetric() {
        let goal = Board::goal(4);
        assert_eq!(goal.symmetric(), goal);
        let b = Board::new(&[1, 0, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let s = b.symmetric();
        assert_eq!(s.to_bytes(), [3, 1, 2, 0, 4, 5, 6, 7, 8]);
        assert_eq!(s.blank(), 3);
        assert_eq!(Board::goal(3).shift(Direction::Down).unwrap(), s);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let b = Board::random(4, &mut rng);
            assert_eq!(b.symmetric().symmetric(), b);
            assert_eq!(b.symmetric().is_solvable(), b.is_solvable());
            for d in b.valid_moves() {
                assert_eq!(b.shift(d).unwrap().symmetric(), b.symmetric().shift(d.transposed()).unwrap());
            }
        }
    }

    #[test]
    fn test_random_boards_are_solvable() {
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        for side in 2..=4 {
            for _ in 0..100 {
                assert!(Board::random(side, &mut rng).is_solvable());
                assert!(Board::random_walk(side, 30, &mut rng).is_solvable());
            }
        }
    }

    #[test]
    fn test_from_bottom_right_format() {
        let b = Board::from_bottom_right_format(&[1, 2, 3, 4, 5, 6, 7, 8, 0]).unwrap();
        assert!(b.is_goal());
        let b = Board::from_bottom_right_format(&[1, 2, 3, 4, 5, 6, 7, 0, 8]).unwrap();
        assert_eq!(b, Board::goal(3).shift(Direction::Right).unwrap());
        assert!(Board::from_bottom_right_format(&[1, 2, 3, 9, 5, 6, 7, 0, 8]).is_err());
    }

    #[test]
    fn test_display() {
        let b = Board::new(&[1, 0, 2, 3]).unwrap();
        assert_eq!(b.to_string(), " 1   \n 2  3\n");
    }
}
