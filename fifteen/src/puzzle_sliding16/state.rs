use crate::puzzle_sliding16::utils::{BITS_PER_CELL, BITS_PER_CELL_MASK64};
use std::iter::{FromIterator, FusedIterator};

/// Tiles of a board packed into single `u64`, [`BITS_PER_CELL`] bits per cell.
///
/// Cell `i` occupies bits `4i..4i+4`. The number of cells is not stored,
/// it is kept by [`crate::puzzle_sliding16::board::Board`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct State {
    /// Indexed by board indices, gives tiles numbers that occupy given board cell.
    pub board: u64,
}

impl FromIterator<u8> for State {
    fn from_iter<T: IntoIterator<Item=u8>>(tiles: T) -> Self {
        let mut board = 0u64;
        let mut index = 0;
        for t in tiles {
            board |= (t as u64) << index;
            index += BITS_PER_CELL;
        }
        Self { board }
    }
}

/// Translates `tile` number from the format that assumes blank to be in the bottom-right corner of the goal state.
#[inline] pub fn from_bottom_right_format(tile: u8, board_size: u8) -> u8 {
    if tile == 0 { 0 } else { board_size - tile }
}

impl State {
    /// Constructs goal state for the board with `board_size` cells: blank in cell 0, tile `t` in cell `t`.
    pub fn goal(board_size: u8) -> Self {
        (0..board_size).collect()
    }

    /// Swaps blank with the tile that occupies `new_blank_position`.
    /// Returns number of this tile.
    pub fn move_blank(&mut self, current_blank_position: u8, new_blank_position: u8) -> u8 {
        let new_blank_index = new_blank_position * BITS_PER_CELL;
        let result = (self.board >> new_blank_index) & BITS_PER_CELL_MASK64;
        self.board &= !(BITS_PER_CELL_MASK64 << new_blank_index);
        self.board |= result << (current_blank_position * BITS_PER_CELL);
        result as u8
    }

    /// Returns the tile at `position`.
    #[inline] pub fn tile_at(&self, position: u8) -> u8 {
        ((self.board >> (position * BITS_PER_CELL)) & BITS_PER_CELL_MASK64) as u8
    }

    /// Returns the cell occupied by `tile` among the first `board_size` cells, if any.
    pub fn position_of(&self, tile: u8, board_size: u8) -> Option<u8> {
        (0..board_size).find(|p| self.tile_at(*p) == tile)
    }

    /// Returns the iterator over the tiles of the first `board_size` cells.
    #[inline] pub fn tiles(&self, board_size: u8) -> TilesIterator {
        TilesIterator { rest: self.board, remaining: board_size }
    }
}

/// Iterator over tiles of [`State`], in cell order.
#[derive(Copy, Clone)]
pub struct TilesIterator {
    rest: u64,
    remaining: u8
}

impl Iterator for TilesIterator {
    type Item = u8;

    #[inline] fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 { return None; }
        self.remaining -= 1;
        let result = (self.rest & BITS_PER_CELL_MASK64) as u8;
        self.rest >>= BITS_PER_CELL;
        Some(result)
    }

    #[inline] fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for TilesIterator {}

impl FusedIterator for TilesIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_and_move_blank_33() {
        let mut state: State = [4, 7, 0,   2, 3, 6,   8, 1, 5].iter().cloned().collect();
        assert_eq!(state.tiles(9).collect::<Vec<_>>(), [4, 7, 0, 2, 3, 6, 8, 1, 5]);
        assert_eq!(state.position_of(0, 9), Some(2));
        assert_eq!(state.move_blank(2, 5), 6);
        assert_eq!(state.tiles(9).collect::<Vec<_>>(), [4, 7, 6, 2, 3, 0, 8, 1, 5]);
        assert_eq!(state.move_blank(5, 4), 3);
        assert_eq!(state.tiles(9).collect::<Vec<_>>(), [4, 7, 6, 2, 0, 3, 8, 1, 5]);
        assert_eq!(state.tile_at(4), 0);
        assert_eq!(state.tile_at(5), 3);
    }

    #[test]
    fn test_goal_44() {
        let state = State::goal(16);
        assert_eq!(state.tiles(16).collect::<Vec<_>>(), (0..16).collect::<Vec<_>>());
        assert_eq!(state.tile_at(15), 15);
        assert_eq!(state.position_of(15, 16), Some(15));
        assert_eq!(state.position_of(15, 9), None);
    }

    #[test]
    fn test_blank_in_last_cell() {
        let state: State = [1, 2, 3, 0].iter().cloned().collect();
        assert_eq!(state.tiles(4).len(), 4);
        assert_eq!(state.tiles(4).last(), Some(0));
    }

    #[test]
    fn test_from_bottom_right_format() {
        assert_eq!(from_bottom_right_format(0, 16), 0);
        assert_eq!(from_bottom_right_format(1, 16), 15);
        assert_eq!(from_bottom_right_format(15, 16), 1);
    }
}
