use crate::config::SolverConfig;
use crate::puzzle_sliding16::board::Board;
use crate::puzzle_sliding16::heuristic::{Heuristic, HeuristicKind, TileMove};
use crate::puzzle_sliding16::neighbors::cell_nr;
use crate::puzzle_sliding16::utils::{MAX_BOARD_SIZE, MAX_SIDE};
use arrayvec::ArrayVec;

/// Distances between all pair of cells.
pub type CellMetric = [[u8; MAX_BOARD_SIZE]; MAX_BOARD_SIZE];

/// Returns Manhattan metric for the board of given size.
pub fn manhattan_metric(cols: u8, rows: u8) -> CellMetric {
    let mut cell_distances = [[0u8; MAX_BOARD_SIZE]; MAX_BOARD_SIZE];
    for first_r in 0..rows {
        for first_c in 0..cols {
            let first_cell = cell_nr(cols, first_c, first_r) as usize;
            for second_r in 0..rows {
                let row_dist = first_r.abs_diff(second_r);
                for second_c in first_c..cols {
                    let second_cell = cell_nr(cols, second_c, second_r) as usize;
                    let distance = row_dist + second_c - first_c;
                    cell_distances[first_cell][second_cell] = distance;
                    cell_distances[second_cell][first_cell] = distance;
                }
            }
        }
    }
    cell_distances
}

/// Returns the number of tiles that must leave the line (and come back) so that the rest,
/// given by their `goal_positions` within the line, are in order.
fn tiles_out_of_order(goal_positions: &[u8]) -> u8 {
    let mut longest = [1u8; MAX_SIDE];
    for i in 1..goal_positions.len() {
        for j in 0..i {
            if goal_positions[j] < goal_positions[i] {
                longest[i] = longest[i].max(longest[j] + 1);
            }
        }
    }
    let in_order = longest[..goal_positions.len()].iter().copied().max().unwrap_or(0);
    goal_positions.len() as u8 - in_order
}

/// Value of [`ManhattanDistance`] heuristic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ManhattanValue {
    /// Sum of Manhattan distances of tiles to their goal cells.
    pub distance: u8,
    /// Linear conflict penalty of each row.
    row_conflicts: [u8; MAX_SIDE],
    /// Linear conflict penalty of each column.
    col_conflicts: [u8; MAX_SIDE]
}

impl ManhattanValue {
    /// Returns the total linear conflict penalty.
    pub fn conflicts(&self) -> u8 {
        self.row_conflicts.iter().sum::<u8>() + self.col_conflicts.iter().sum::<u8>()
    }
}

/// Manhattan distance, optionally refined by linear conflicts.
#[derive(Clone)]
pub struct ManhattanDistance {
    metric: CellMetric,
    side: u8,
    linear_conflict: bool
}

impl ManhattanDistance {
    pub fn with_linear_conflict(side: u8, linear_conflict: bool) -> Self {
        Self { metric: manhattan_metric(side, side), side, linear_conflict }
    }

    /// Returns Manhattan distance refined by linear conflicts.
    pub fn new(side: u8) -> Self { Self::with_linear_conflict(side, true) }

    /// Returns plain Manhattan distance.
    pub fn without_linear_conflict(side: u8) -> Self { Self::with_linear_conflict(side, false) }

    /// Returns Manhattan distance refined by linear conflicts if `config` enables them.
    pub fn from_config(side: u8, config: &SolverConfig) -> Self {
        Self::with_linear_conflict(side, config.linear_conflict)
    }

    #[inline] pub fn metric(&self) -> &CellMetric { &self.metric }

    #[inline] pub fn uses_linear_conflict(&self) -> bool { self.linear_conflict }

    /// Returns the sum of Manhattan distances of all tiles of `board`.
    pub fn distance(&self, board: &Board) -> u8 {
        board.tiles().enumerate()
            .map(|(cell, t)| if t == 0 { 0 } else { self.metric[cell][t as usize] })
            .sum()
    }

    fn row_conflict(&self, board: &Board, r: u8) -> u8 {
        let goal_cols: ArrayVec<u8, MAX_SIDE> = (0..self.side)
            .map(|c| board.tile_at(cell_nr(self.side, c, r)))
            .filter(|t| *t != 0 && t / self.side == r)
            .map(|t| t % self.side)
            .collect();
        2 * tiles_out_of_order(&goal_cols)
    }

    fn col_conflict(&self, board: &Board, c: u8) -> u8 {
        let goal_rows: ArrayVec<u8, MAX_SIDE> = (0..self.side)
            .map(|r| board.tile_at(cell_nr(self.side, c, r)))
            .filter(|t| *t != 0 && t % self.side == c)
            .map(|t| t / self.side)
            .collect();
        2 * tiles_out_of_order(&goal_rows)
    }
}

impl Heuristic for ManhattanDistance {
    type Value = ManhattanValue;

    fn kind(&self) -> HeuristicKind {
        if self.linear_conflict { HeuristicKind::LinearConflict } else { HeuristicKind::Manhattan }
    }

    #[inline] fn side(&self) -> u8 { self.side }

    fn value_for_board(&self, board: &Board) -> Self::Value {
        let mut result = ManhattanValue { distance: self.distance(board), ..Default::default() };
        if self.linear_conflict {
            for line in 0..self.side {
                result.row_conflicts[line as usize] = self.row_conflict(board, line);
                result.col_conflicts[line as usize] = self.col_conflict(board, line);
            }
        }
        result
    }

    fn update_value(&self, old_value: &Self::Value, board_after: &Board, mv: TileMove) -> Self::Value {
        let mut result = *old_value;
        result.distance = old_value.distance
            - self.metric[mv.tile as usize][mv.from as usize]
            + self.metric[mv.tile as usize][mv.to as usize];
        if self.linear_conflict {
            let (from_r, from_c) = (mv.from / self.side, mv.from % self.side);
            let (to_r, to_c) = (mv.to / self.side, mv.to % self.side);
            if from_r == to_r {
                // order of tiles in rows is unchanged
                result.col_conflicts[from_c as usize] = self.col_conflict(board_after, from_c);
                result.col_conflicts[to_c as usize] = self.col_conflict(board_after, to_c);
            } else {
                result.row_conflicts[from_r as usize] = self.row_conflict(board_after, from_r);
                result.row_conflicts[to_r as usize] = self.row_conflict(board_after, to_r);
            }
        }
        result
    }

    #[inline] fn estimate_of(&self, value: &Self::Value) -> u8 {
        value.distance + value.conflicts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_manhattan_32() {
        // 0, 1, 2
        // 3, 4, 5
        let metric = manhattan_metric(3, 2);
        assert_eq!(metric[0][0], 0);
        assert_eq!(metric[0][2], 2);    assert_eq!(metric[2][0], 2);
        assert_eq!(metric[0][5], 3);    assert_eq!(metric[5][0], 3);
        assert_eq!(metric[1][3], 2);    assert_eq!(metric[3][1], 2);
        assert_eq!(metric[2][3], 3);    assert_eq!(metric[3][2], 3);
        assert_eq!(metric[4][5], 1);    assert_eq!(metric[5][4], 1);
    }

    #[test]
    fn test_tiles_out_of_order() {
        assert_eq!(tiles_out_of_order(&[]), 0);
        assert_eq!(tiles_out_of_order(&[2]), 0);
        assert_eq!(tiles_out_of_order(&[0, 1, 3]), 0);
        assert_eq!(tiles_out_of_order(&[1, 0]), 1);
        assert_eq!(tiles_out_of_order(&[3, 2, 1, 0]), 3);
        assert_eq!(tiles_out_of_order(&[1, 3, 0, 2]), 2);
    }

    #[test]
    fn test_linear_conflict_33() {
        let h = ManhattanDistance::new(3);
        let plain = ManhattanDistance::without_linear_conflict(3);
        assert_eq!(h.estimate(&Board::goal(3)), 0);
        let b = Board::new(&[0, 2, 1,   3, 4, 5,   6, 7, 8]).unwrap();
        assert_eq!(plain.estimate(&b), 2);
        assert_eq!(h.estimate(&b), 4);
        // 3 and 6 swapped in column 0
        let b = Board::new(&[0, 1, 2,   6, 4, 5,   3, 7, 8]).unwrap();
        assert_eq!(plain.estimate(&b), 2);
        assert_eq!(h.estimate(&b), 4);
        assert_eq!(h.kind(), HeuristicKind::LinearConflict);
        assert_eq!(plain.kind(), HeuristicKind::Manhattan);
    }

    #[test]
    fn test_from_config() {
        assert_eq!(ManhattanDistance::from_config(3, &SolverConfig::default()).kind(), HeuristicKind::LinearConflict);
        let config = SolverConfig::from_pairs([("linear_conflict", "off")]);
        let h = ManhattanDistance::from_config(4, &config);
        assert!(!h.uses_linear_conflict());
        assert_eq!(h.kind(), HeuristicKind::Manhattan);
        let b = Board::new(&[0, 2, 1,   3, 4, 5,   6, 7, 8]).unwrap();
        assert_eq!(ManhattanDistance::from_config(3, &config).estimate(&b), 2);
    }

    #[test]
    fn test_manhattan_44() {
        let b = Board::new(&[14, 7, 1, 9, 12, 3, 6, 15, 8, 11, 2, 5, 10, 0, 4, 13]).unwrap();
        let h = ManhattanDistance::new(4);
        let v = h.value_for_board(&b);
        assert!(h.estimate_of(&v) >= v.distance);
        assert_eq!(h.estimate_of(&v) % 2, v.distance % 2);
        assert!(h.estimate_of(&v) <= 52);
    }

    #[test]
    fn test_incremental_update() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for side in 2..=4 {
            for lc in [false, true] {
                let h = ManhattanDistance::with_linear_conflict(side, lc);
                let mut board = Board::random(side, &mut rng);
                let mut value = h.value_for_board(&board);
                for _ in 0..300 {
                    let d = *board.valid_moves().choose(&mut rng).unwrap();
                    let (next, mv) = board.step(d).unwrap();
                    value = h.update_value(&value, &next, mv);
                    board = next;
                    assert_eq!(value, h.value_for_board(&board));
                }
            }
        }
    }
}
