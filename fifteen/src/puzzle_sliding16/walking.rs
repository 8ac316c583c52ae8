use crate::puzzle_sliding16::board::Board;
use crate::puzzle_sliding16::heuristic::{Heuristic, HeuristicKind, TileMove};
use crate::puzzle_sliding16::utils::MAX_SIDE;
use std::collections::HashMap;
use std::time::Instant;
use log::info;

/// Number of bits used to store a single count of a distribution.
const BITS_PER_COUNT: u8 = 3;
const COUNT_MASK: u64 = (1 << BITS_PER_COUNT) - 1;

/// Marks a missing link or a distribution which is not in the table.
const NO_INDEX: u32 = u32::MAX;

/// Distribution of tiles among lines (rows or columns).
///
/// Entry (`line`, `class`) stores the number of tiles placed in `line` whose goal line is `class`.
/// The blank is not counted, so the line of the blank is the only one with less than `side` tiles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct Distribution(u64);

impl Distribution {
    #[inline(always)] fn shift(side: u8, line: u8, class: u8) -> u8 {
        (line * side + class) * BITS_PER_COUNT
    }

    #[inline] fn count(self, side: u8, line: u8, class: u8) -> u8 {
        ((self.0 >> Self::shift(side, line, class)) & COUNT_MASK) as u8
    }

    #[inline] fn add(&mut self, side: u8, line: u8, class: u8) {
        self.0 += 1 << Self::shift(side, line, class);
    }

    #[inline] fn remove(&mut self, side: u8, line: u8, class: u8) {
        self.0 -= 1 << Self::shift(side, line, class);
    }

    fn goal(side: u8) -> Self {
        let mut result = Self(0);
        for line in 0..side {
            let first = if line == 0 { 1 } else { 0 };   // blank
            for _ in first..side { result.add(side, line, line); }
        }
        result
    }

    fn blank_line(self, side: u8) -> u8 {
        (0..side)
            .find(|line| (0..side).map(|class| self.count(side, *line, class)).sum::<u8>() < side)
            .unwrap_or(0)
    }

    /// Returns the distribution of `board` tiles among rows (if `rows` is `true`) or columns.
    fn of_board(board: &Board, rows: bool) -> Self {
        let side = board.side();
        let mut result = Self(0);
        for (cell, tile) in board.tiles().enumerate() {
            if tile == 0 { continue; }
            let cell = cell as u8;
            if rows {
                result.add(side, cell / side, tile / side);
            } else {
                result.add(side, cell % side, tile % side);
            }
        }
        result
    }
}

/// Value of [`WalkingDistance`] heuristic: indices of the row and column distributions in the table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WalkingValue {
    rows: u32,
    cols: u32
}

/// Walking distance heuristic.
///
/// The table gives, for each distribution, the minimal number of moves of blank between lines
/// needed to reach the goal distribution. The same table serves rows and columns
/// since the goal is symmetric in the main diagonal.
/// The estimate is the sum of the row (vertical moves) and column (horizontal moves) distances.
pub struct WalkingDistance {
    side: u8,
    index: HashMap<Distribution, u32>,
    distances: Vec<u8>,
    /// For each distribution and `dir*side + class`, index of the distribution obtained by moving the tile
    /// of given `class` from the line above (`dir == 0`) or below (`dir == 1`) the blank line.
    links: Vec<[u32; 2*MAX_SIDE]>
}

impl WalkingDistance {
    /// Builds the table for the board with given `side`, using BFS from the goal distribution.
    pub fn new(side: u8) -> Self {
        let start_moment = Instant::now();
        let goal = Distribution::goal(side);
        let mut keys = vec![goal];
        let mut distances = vec![0u8];
        let mut links = vec![[NO_INDEX; 2*MAX_SIDE]];
        let mut index = HashMap::new();
        index.insert(goal, 0u32);
        let mut i = 0;
        while i < keys.len() {
            let key = keys[i];
            let next_distance = distances[i] + 1;
            let blank = key.blank_line(side);
            for (dir, other) in [(0, blank.checked_sub(1)), (1, Some(blank + 1).filter(|l| *l < side))] {
                let Some(other) = other else { continue };
                for class in 0..side {
                    if key.count(side, other, class) == 0 { continue; }
                    let mut neighbor = key;
                    neighbor.remove(side, other, class);
                    neighbor.add(side, blank, class);
                    let j = *index.entry(neighbor).or_insert_with(|| {
                        keys.push(neighbor);
                        distances.push(next_distance);
                        links.push([NO_INDEX; 2*MAX_SIDE]);
                        (keys.len() - 1) as u32
                    });
                    links[i][dir * side as usize + class as usize] = j;
                }
            }
            i += 1;
        }
        info!("walking distance table for side {}: {} distributions up to distance {}, built in {:.3?}",
              side, keys.len(), distances.last().copied().unwrap_or(0), start_moment.elapsed());
        Self { side, index, distances, links }
    }

    /// Returns the number of distributions in the table.
    pub fn len(&self) -> usize { self.distances.len() }

    pub fn is_empty(&self) -> bool { self.distances.is_empty() }

    /// Returns the largest distance stored in the table.
    pub fn max_distance(&self) -> u8 { self.distances.iter().copied().max().unwrap_or(0) }

    #[inline] fn index_of(&self, board: &Board, rows: bool) -> u32 {
        self.index.get(&Distribution::of_board(board, rows)).copied().unwrap_or(NO_INDEX)
    }

    #[inline] fn distance(&self, index: u32) -> u8 {
        self.distances.get(index as usize).copied().unwrap_or(0)
    }

    #[inline] fn follow(&self, index: u32, board_after: &Board, rows: bool, dir: usize, class: u8) -> u32 {
        match self.links.get(index as usize) {
            Some(links) => links[dir * self.side as usize + class as usize],
            None => self.index_of(board_after, rows)
        }
    }
}

impl Heuristic for WalkingDistance {
    type Value = WalkingValue;

    #[inline] fn kind(&self) -> HeuristicKind { HeuristicKind::WalkingDistance }

    #[inline] fn side(&self) -> u8 { self.side }

    fn value_for_board(&self, board: &Board) -> Self::Value {
        WalkingValue { rows: self.index_of(board, true), cols: self.index_of(board, false) }
    }

    fn update_value(&self, old_value: &Self::Value, board_after: &Board, mv: TileMove) -> Self::Value {
        let (from_r, from_c) = (mv.from / self.side, mv.from % self.side);
        let (to_r, to_c) = (mv.to / self.side, mv.to % self.side);
        let mut result = *old_value;
        if from_r != to_r {
            // blank goes up (dir 0) when the tile comes from the row above
            let dir = if from_r < to_r { 0 } else { 1 };
            result.rows = self.follow(old_value.rows, board_after, true, dir, mv.tile / self.side);
        } else {
            let dir = if from_c < to_c { 0 } else { 1 };
            result.cols = self.follow(old_value.cols, board_after, false, dir, mv.tile % self.side);
        }
        result
    }

    #[inline] fn estimate_of(&self, value: &Self::Value) -> u8 {
        self.distance(value.rows) + self.distance(value.cols)
    }
}
