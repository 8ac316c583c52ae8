use crate::puzzle_sliding16::utils::{DENIED, MAX_BOARD_SIZE, BITS_PER_CELL, BITS_PER_CELL_MASK32};
use crate::puzzle_sliding16::neighbors::Neighbors;
use crate::puzzle_sliding16::board::Board;
use arrayvec::ArrayVec;
use bitm::{BitAccess, BitVec};

/// Manipulate patterns.
///
/// Pattern is a vector of positions of tiles important for pattern, the 0-th important tile is always blank.
/// The important tiles are numbered from 0 and these numbers are indices of the pattern vector.
/// Pattern is encoded in u32 and uses BITS_PER_CELL bits per important tile to store its position.
///
/// The key of a pattern is the pattern without the position of blank, i.e. `pattern >> BITS_PER_CELL`.
/// Keys are used to index pattern databases of additive heuristics, which ignore the position of blank.
#[derive(Clone, Copy)]
pub struct PatternManipulator {
    /// Convert: tile number (index) -> 4 * number of important tile or DENIED if the tile is not important
    index_of_tile_in_pattern: [u8; MAX_BOARD_SIZE],

    /// Number of important tiles in pattern (including blank).
    pattern_len: u8
}

impl PatternManipulator {
    /// Returns pattern manipulator and the goal pattern for blank and given `group` of tiles.
    pub fn new(group: impl IntoIterator<Item=u8>) -> (Self, u32) {
        let mut goal_pattern = 0u32;
        let mut index_of_tile_in_pattern = [DENIED; MAX_BOARD_SIZE];
        index_of_tile_in_pattern[0] = 0;
        let mut index_of_important = BITS_PER_CELL;
        for tile_nr in group {
            // tile tile_nr occupies cell tile_nr in the goal
            goal_pattern |= (tile_nr as u32) << index_of_important;
            index_of_tile_in_pattern[tile_nr as usize] = index_of_important;
            index_of_important += BITS_PER_CELL;
        }
        (Self { index_of_tile_in_pattern, pattern_len: index_of_important/BITS_PER_CELL }, goal_pattern)
    }

    /// Returns the number of important tiles, including blank.
    #[inline] pub fn pattern_len(&self) -> u8 { self.pattern_len }

    /// Returns the number of bits occupied by keys.
    #[inline] pub fn key_bits(&self) -> u8 { (self.pattern_len - 1) * BITS_PER_CELL }

    /// Returns the position (field number) of tile with given number `tile_nr` in `pattern`.
    pub fn position_of(&self, pattern: u32, tile_nr: u8) -> u8 {
        let index = self.index_of_tile_in_pattern[tile_nr as usize];
        if index == DENIED {
            DENIED
        } else {
            ((pattern >> index) & BITS_PER_CELL_MASK32) as u8
        }
    }

    /// Returns the pattern which the given `board` matches to.
    pub fn pattern_for(&self, board: &Board) -> u32 {
        let mut pattern = 0;
        for (position, tile_nr) in board.tiles().enumerate() {
            let index = self.index_of_tile_in_pattern[tile_nr as usize];
            if index != DENIED { pattern |= (position as u32) << index; }
        }
        pattern
    }

    /// Returns the key of the pattern which the given `board` matches to.
    #[inline] pub fn key_for(&self, board: &Board) -> u32 {
        self.pattern_for(board) >> BITS_PER_CELL
    }

    /// Returns a copy of `key` in which tile `tile_nr` (which must be important and not blank) is moved to `new_position`.
    #[inline(always)]
    pub fn key_with_position(&self, key: u32, tile_nr: u8, new_position: u8) -> u32 {
        let index = self.index_of_tile_in_pattern[tile_nr as usize] - BITS_PER_CELL;
        (key & !(BITS_PER_CELL_MASK32 << index)) | ((new_position as u32) << index)
    }

    /// Same as `set_important_tile_position(pattern, 0, new_blank_position)`, but faster.
    #[inline(always)]
    pub fn set_blank_position(pattern: &mut u32, new_blank_position: u8) {
        *pattern &= !BITS_PER_CELL_MASK32;
        *pattern |= new_blank_position as u32;
    }

    /// Returns position of blank in given `pattern`.
    #[inline(always)]
    pub fn blank_position(pattern: u32) -> u8 {
        (pattern & BITS_PER_CELL_MASK32) as u8
    }

    /// Sets position of important tile with given number `important_tile_nr` in `pattern` to `new_position`.
    #[inline(always)]
    pub fn set_important_tile_position(pattern: &mut u32, important_tile_nr: u8, new_position: u8) {
        let index = important_tile_nr * BITS_PER_CELL;
        *pattern &= !(BITS_PER_CELL_MASK32 << index);
        *pattern |= (new_position as u32) << index;
    }

    /// Returns a copy of `pattern` with blank swapped with the tile that occupies `new_blank_position`,
    /// and whether this tile is important (so the key has changed).
    pub fn moved_blank(&self, pattern: u32, new_blank_position: u8) -> (u32, bool) {
        let old_blank_pos = Self::blank_position(pattern);
        let mut result = pattern;
        Self::set_blank_position(&mut result, new_blank_position);
        let mut to_process = pattern;
        for tile_nr in 1..self.pattern_len {
            to_process >>= BITS_PER_CELL;
            if (to_process & BITS_PER_CELL_MASK32) as u8 == new_blank_position {
                Self::set_important_tile_position(&mut result, tile_nr, old_blank_pos);
                return (result, true);
            }
        }
        (result, false)
    }

    /// Returns all patterns that can be obtained from `pattern` by swapping blank with a neighbor tile,
    /// each with the flag that indicates whether an important tile has moved.
    pub fn neighbors(&self, pattern: u32, neighbors: &Neighbors) -> ArrayVec::<(u32, bool), 4> {
        let blank = Self::blank_position(pattern) as usize;
        neighbors[blank].iter()
            .filter(|n| **n != DENIED)
            .map(|n| self.moved_blank(pattern, *n))
            .collect()
    }
}

/// Builds additive pattern database for the given `group` of tiles (without blank).
///
/// Only moves of the group tiles are counted, moves of other tiles are free.
/// The database is built by 0-1 BFS from the goal over the (blank, group tiles) positions.
/// It is returned as a vector whose `i`-th element lists (in increasing order) all keys
/// whose distance to the goal equals `i`.
pub fn build_additive_pattern_db(group: &[u8], neighbors: &Neighbors) -> (Vec<Vec<u32>>, PatternManipulator) {
    let (pattern_manipulator, goal) = PatternManipulator::new(group.iter().copied());
    let key_bits = pattern_manipulator.key_bits() as usize;
    let mut settled = Box::<[u64]>::with_zeroed_bits(1usize << (key_bits + BITS_PER_CELL as usize));
    let mut key_seen = Box::<[u64]>::with_zeroed_bits(1usize << key_bits);
    let mut pattern_db = Vec::<Vec<u32>>::new();
    let mut current = vec![goal];
    while !current.is_empty() {
        let mut keys = Vec::new();
        let mut next = Vec::new();
        while let Some(pattern) = current.pop() {
            if settled.get_bit(pattern as usize) { continue; }
            settled.set_bit(pattern as usize);
            let key = pattern >> BITS_PER_CELL;
            if !key_seen.get_bit(key as usize) {
                key_seen.set_bit(key as usize);
                keys.push(key);
            }
            for (n, key_changed) in pattern_manipulator.neighbors(pattern, neighbors) {
                if settled.get_bit(n as usize) { continue; }
                if key_changed { next.push(n); } else { current.push(n); }
            }
        }
        keys.sort_unstable();
        pattern_db.push(keys);
        current = next;
    }
    while pattern_db.last().map_or(false, |keys| keys.is_empty()) { pattern_db.pop(); }
    (pattern_db, pattern_manipulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle_sliding16::neighbors::{construct_neighbors, Direction};

    #[test]
    fn pattern_manipulator_33() {
        let (pm, goal) = PatternManipulator::new([2, 3, 5]);
        assert_eq!(pm.pattern_len(), 4);
        assert_eq!(pm.key_bits(), 12);
        assert_eq!(pm.index_of_tile_in_pattern[0..6], [0, DENIED, 1*4, 2*4, DENIED, 3*4]);
        assert_eq!(PatternManipulator::blank_position(goal), 0);
        assert_eq!(pm.position_of(goal, 1), DENIED);
        assert_eq!(pm.position_of(goal, 2), 2);
        assert_eq!(pm.position_of(goal, 3), 3);
        assert_eq!(pm.position_of(goal, 5), 5);
        assert_eq!(pm.pattern_for(&Board::goal(3)), goal);
        assert_eq!(pm.key_for(&Board::goal(3)), goal >> 4);

        // blank moves to 1, tile 1 is not important
        let (p, changed) = pm.moved_blank(goal, 1);
        assert!(!changed);
        assert_eq!(PatternManipulator::blank_position(p), 1);
        assert_eq!(p >> 4, goal >> 4);
        // blank moves to 2 and tile 2 goes to 1
        let (p, changed) = pm.moved_blank(p, 2);
        assert!(changed);
        assert_eq!(pm.position_of(p, 0), 2);
        assert_eq!(pm.position_of(p, 2), 1);
        assert_eq!(pm.position_of(p, 3), 3);
        let board = Board::goal(3).apply(&[Direction::Right, Direction::Right]).unwrap();
        assert_eq!(pm.pattern_for(&board), p);
        assert_eq!(pm.key_with_position(goal >> 4, 2, 1), p >> 4);

        let n = pm.neighbors(p, &construct_neighbors(3, 3));
        assert_eq!(n.len(), 2);
        assert!(n.contains(&(pm.moved_blank(goal, 1).0, true)));
        assert!(n.iter().all(|(_, changed)| *changed));
    }

    #[test]
    fn additive_db_22_single_tile() {
        // tile 3 is in the bottom-right corner of the goal
        let (db, _) = build_additive_pattern_db(&[3], &construct_neighbors(2, 2));
        assert_eq!(db.len(), 3);
        assert_eq!(db[0], [3]);
        assert_eq!(db[1], [1, 2]);
        assert_eq!(db[2], [0]);
    }

    #[test]
    fn additive_db_33_counts_all_placements() {
        let (db, pm) = build_additive_pattern_db(&[1, 2], &construct_neighbors(3, 3));
        assert_eq!(pm.key_bits(), 8);
        assert_eq!(db[0], [(2 << 4) | 1]);
        assert_eq!(db.iter().map(|keys| keys.len()).sum::<usize>(), 9 * 8);
        for keys in &db { assert!(keys.windows(2).all(|w| w[0] < w[1])); }
    }
}
