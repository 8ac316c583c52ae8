use crate::puzzle_sliding16::board::Board;
use crate::puzzle_sliding16::manhattan::{manhattan_metric, CellMetric};
use crate::puzzle_sliding16::neighbors::Direction;
use crate::puzzle_sliding16::utils::MAX_BOARD_SIZE;

/// The board to reach, with the data needed to estimate the distance to it.
struct Target {
    board: Board,
    metric: CellMetric,
    /// Cell occupied by each tile in `board`.
    cell_of: [u8; MAX_BOARD_SIZE]
}

impl Target {
    fn new(board: &Board) -> Self {
        let mut cell_of = [0; MAX_BOARD_SIZE];
        for (cell, tile) in board.tiles().enumerate() { cell_of[tile as usize] = cell as u8; }
        Self { board: *board, metric: manhattan_metric(board.side(), board.side()), cell_of }
    }

    /// Returns the sum of Manhattan distances between tile positions in `board` and in the target.
    fn distance(&self, board: &Board) -> u8 {
        board.tiles().enumerate()
            .filter(|(_, tile)| *tile != 0)
            .map(|(cell, tile)| self.metric[cell][self.cell_of[tile as usize] as usize])
            .sum()
    }

    fn search_rec(&self, board: &Board, estimate: u8, last: Direction, depth: u8, depth_limit: u8) -> bool {
        if *board == self.board { return true; }
        if depth + estimate > depth_limit { return false; }
        for d in Direction::ALL {
            if d == last.opposite() { continue; }
            let Some((next, mv)) = board.step(d) else { continue };
            let target_cell = self.cell_of[mv.tile as usize] as usize;
            let next_estimate = estimate - self.metric[mv.from as usize][target_cell] + self.metric[mv.to as usize][target_cell];
            if self.search_rec(&next, next_estimate, d, depth + 1, depth_limit) { return true; }
        }
        false
    }
}

/// Returns the minimal number of moves that transform `from` into `to`,
/// or `None` if it exceeds `max_moves` (or `to` cannot be reached at all).
pub fn moves_between(from: &Board, to: &Board, max_moves: u8) -> Option<u8> {
    if from.side() != to.side() { return None; }
    let target = Target::new(to);
    let estimate = target.distance(from);
    // every move changes the estimate by one, so only every second limit can succeed
    (estimate..=max_moves).step_by(2)
        .find(|depth_limit| target.search_rec(from, estimate, Direction::None, 0, *depth_limit))
}
