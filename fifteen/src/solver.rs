use crate::config::SolverConfig;
use crate::error::BoardError;
use crate::puzzle_sliding16::board::Board;
use crate::puzzle_sliding16::heuristic::{EstimateMemo, Heuristic, HeuristicKind};
use crate::puzzle_sliding16::neighbors::{construct_neighbors, Direction, Neighbors};
use crate::puzzle_sliding16::utils::{max_moves, DENIED};
use crate::reference::{ReferenceMoves, ReferenceVerifier, SolverContext};
use crate::reference::service::ReferenceConnection;
use crate::stats::{Limited, SearchStats, SearchStatsCollector};
use arrayvec::ArrayVec;
use std::fmt;
use std::time::{Duration, Instant};
use log::{debug, info, warn};

/// Number of visits after which probing a first move is stopped.
pub const PROBE_SATURATION: u64 = 10_000;

/// Final state of a solve.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolveStatus {
    Solved,
    /// The time limit has passed before the solution was found.
    Timeout,
    /// The goal cannot be reached from the board.
    Unsolvable,
    /// All bounds up to the longest possible solution have been searched in vain.
    Exhausted,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Solved => "solved",
            SolveStatus::Timeout => "timeout",
            SolveStatus::Unsolvable => "unsolvable",
            SolveStatus::Exhausted => "exhausted",
        })
    }
}

/// Where the solution comes from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolutionSource {
    Search,
    /// Complete solution stored in the reference cache.
    ReferenceCache,
    /// Solution prefix stored in the reference cache, completed by search.
    ReferencePrefix,
}

/// Statistics of a single IDA* iteration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IterationStats {
    pub bound: u8,
    pub nodes: u64,
    /// Whether the iteration has been finished (not interrupted by timeout).
    pub completed: bool
}

/// Result of [`Solver::solve`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Initial estimate of the board, `-1` for unsolvable boards.
    pub estimate: i8,
    /// Optimal solution, empty unless solved.
    pub moves: Vec<Direction>,
    /// Bound of the last iteration.
    pub depth: u8,
    /// Total number of visited nodes.
    pub nodes: u64,
    pub iterations: Vec<IterationStats>,
    pub elapsed: Duration,
    pub source: SolutionSource
}

impl SolveReport {
    fn new(status: SolveStatus, estimate: i8) -> Self {
        Self {
            status, estimate,
            moves: Vec::new(),
            depth: 0,
            nodes: 0,
            iterations: Vec::new(),
            elapsed: Duration::ZERO,
            source: SolutionSource::Search
        }
    }

    #[inline] pub fn is_solved(&self) -> bool { self.status == SolveStatus::Solved }

    /// Returns the number of moves of the optimal solution, if it has been found.
    pub fn steps(&self) -> Option<u8> {
        self.is_solved().then(|| self.moves.len() as u8)
    }

    /// Returns the largest bound whose iteration has been finished.
    pub fn last_completed_bound(&self) -> Option<u8> {
        self.iterations.iter().rev().find(|i| i.completed).map(|i| i.bound)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Outcome {
    Found,
    /// No solution within the bound.
    Exhausted,
    Cancelled
}

/// Result of using the cache record of the board being solved.
enum CachedStart {
    Solved(Vec<Direction>, SolutionSource),
    TimedOut,
    /// Only the number of moves is known.
    Bound(u8),
    Invalid
}

#[derive(Clone, Copy)]
struct Node<V: Copy> {
    board: Board,
    value: V,
    estimate: u8,
    /// Move that led to `board`.
    last: Direction
}

/// Returns the smallest number not less than `estimate` that has the parity of the solution length of `board`.
#[inline] fn with_parity(estimate: u8, board: &Board) -> u8 {
    let side = board.side();
    let parity = (board.blank() / side + board.blank() % side) & 1;
    estimate + ((estimate ^ parity) & 1)
}

/// IDA* solver that uses heuristic `H`.
///
/// In advanced mode, the solver also uses the reference cache: it returns cached solutions,
/// completes cached solution prefixes and starts from estimates boosted by nearby cached boards.
pub struct Solver<H: Heuristic> {
    heuristic: H,
    neighbors: Neighbors,
    goal: Board,
    timeout: Option<Duration>,
    first_move_ordering: bool,
    auto_update_reference: bool,
    reference: ReferenceConnection,
    advanced: bool,
    memo: EstimateMemo
}

impl<H: Heuristic> Solver<H> {
    /// Returns solver with default settings, not connected to any reference cache.
    pub fn new(heuristic: H) -> Self {
        Self::with_config(heuristic, &SolverConfig::default())
    }

    pub fn with_config(heuristic: H, config: &SolverConfig) -> Self {
        let side = heuristic.side();
        Self {
            neighbors: construct_neighbors(side, side),
            goal: Board::goal(side),
            heuristic,
            timeout: config.timeout,
            first_move_ordering: config.first_move_ordering,
            auto_update_reference: config.auto_update_reference,
            reference: ReferenceConnection::disabled(),
            advanced: false,
            memo: EstimateMemo::new()
        }
    }

    #[inline] pub fn heuristic(&self) -> &H { &self.heuristic }

    #[inline] pub fn side(&self) -> u8 { self.goal.side() }

    #[inline] pub fn kind(&self) -> HeuristicKind { self.heuristic.kind() }

    #[inline] pub fn timeout(&self) -> Option<Duration> { self.timeout }

    /// Sets the time limit of a single solve (`None` disables it).
    pub fn set_timeout(&mut self, timeout: Option<Duration>) { self.timeout = timeout; }

    pub fn set_first_move_ordering(&mut self, enabled: bool) { self.first_move_ordering = enabled; }

    /// Sets whether hard solutions found by the solver are added to the reference cache.
    pub fn set_auto_update_reference(&mut self, enabled: bool) { self.auto_update_reference = enabled; }

    pub fn set_reference(&mut self, reference: ReferenceConnection) {
        self.reference = reference;
        self.memo.invalidate();
    }

    #[inline] pub fn reference(&self) -> &ReferenceConnection { &self.reference }

    #[inline] pub fn reference_mut(&mut self) -> &mut ReferenceConnection { &mut self.reference }

    #[inline] pub fn is_advanced(&self) -> bool { self.advanced }

    /// Switches between standard and advanced mode. Returns the previous mode.
    pub fn set_advanced(&mut self, advanced: bool) -> bool {
        if advanced != self.advanced { self.memo.invalidate(); }
        std::mem::replace(&mut self.advanced, advanced)
    }

    fn check_side(&self, board: &Board) -> Result<(), BoardError> {
        if board.side() == self.side() {
            Ok(())
        } else {
            Err(BoardError::SideMismatch { board: board.side(), solver: self.side() })
        }
    }

    fn context(&self, boosted: bool) -> SolverContext {
        SolverContext { kind: self.kind(), side: self.side(), boosted }
    }

    /// Returns the estimate of `board` given by the heuristic, or `-1` if `board` is not solvable.
    pub fn heuristic_standard(&mut self, board: &Board) -> Result<i8, BoardError> {
        self.check_side(board)?;
        if !board.is_solvable() { return Ok(-1); }
        if let Some(estimate) = self.memo.standard(board) { return Ok(estimate as i8); }
        let estimate = self.heuristic.estimate(board);
        self.memo.store_standard(board, estimate);
        Ok(estimate as i8)
    }

    /// Returns the estimate of `board` improved by the reference cache, or `-1` if `board` is not solvable.
    pub fn heuristic_advanced(&mut self, board: &Board) -> Result<i8, BoardError> {
        self.check_side(board)?;
        if !board.is_solvable() { return Ok(-1); }
        if let Some(estimate) = self.memo.advanced(board) { return Ok(estimate as i8); }
        let standard = match self.memo.standard(board) {
            Some(estimate) => estimate,
            None => self.heuristic.estimate(board)
        };
        let advanced = match self.reference.call(|s| s.lookup_exact(board)).flatten() {
            Some(record) => record.moves.max(standard),
            None => self.boosted_estimate(board, standard)
        };
        self.memo.store_advanced(board, standard, advanced);
        Ok(advanced as i8)
    }

    /// Returns `standard` estimate of `board` boosted by the reference cache,
    /// if it reaches the cutoff limit (95% of the cutoff) of the cache.
    fn boosted_estimate(&mut self, board: &Board, standard: u8) -> u8 {
        match self.reference.call(|s| s.cutoff_limit()) {
            Some(limit) if standard >= limit => {
                let boosted = self.reference.call(|s| s.boost_estimate(board, standard)).unwrap_or(standard);
                with_parity(boosted.max(standard), board)
            }
            _ => standard
        }
    }

    fn root(&self, board: &Board) -> Node<H::Value> {
        let value = self.heuristic.value_for_board(board);
        Node { board: *board, value, estimate: self.heuristic.estimate_of(&value), last: Direction::None }
    }

    #[inline] fn child(&self, node: &Node<H::Value>, d: Direction) -> Option<Node<H::Value>> {
        let cell = self.neighbors[node.board.blank() as usize][d.index()];
        if cell == DENIED { return None; }
        let (board, mv) = node.board.moved_blank(cell);
        let value = self.heuristic.update_value(&node.value, &board, mv);
        Some(Node { board, value, estimate: self.heuristic.estimate_of(&value), last: d })
    }

    /// Returns the children of `node` (without the one that undoes the last move), sorted by estimates.
    #[inline] fn children(&self, node: &Node<H::Value>) -> ArrayVec<Node<H::Value>, 4> {
        let back = node.last.opposite();
        let mut result: ArrayVec<Node<H::Value>, 4> = Direction::ALL.iter()
            .filter(|d| **d != back)
            .filter_map(|d| self.child(node, *d))
            .collect();
        result.sort_by_key(|child| child.estimate);
        result
    }

    /// Depth-first search limited by `bound`, a part of IDA*.
    ///
    /// `depth` is the number of moves from the root to `node`, and `path` lists them.
    /// If the goal is found, `path` leads to it.
    fn search_rec(&self, node: &Node<H::Value>, depth: u8, bound: u8, path: &mut Vec<Direction>, stats: &mut impl SearchStatsCollector) -> Outcome {
        if node.board == self.goal {
            stats.leaf();
            return Outcome::Found;
        }
        if depth + node.estimate > bound {
            return if stats.leaf() { Outcome::Exhausted } else { Outcome::Cancelled };
        }
        if !stats.internal() { return Outcome::Cancelled; }
        for child in self.children(node) {
            path.push(child.last);
            match self.search_rec(&child, depth + 1, bound, path, stats) {
                Outcome::Exhausted => { path.pop(); }
                outcome => return outcome
            }
        }
        Outcome::Exhausted
    }

    /// Same as `search_rec` for the root, but tries first moves in the given `order`.
    fn search_root(&self, root: &Node<H::Value>, order: &[Direction], bound: u8, path: &mut Vec<Direction>, stats: &mut SearchStats) -> Outcome {
        if root.estimate > bound {
            return if stats.leaf() { Outcome::Exhausted } else { Outcome::Cancelled };
        }
        if !stats.internal() { return Outcome::Cancelled; }
        for d in order {
            let Some(child) = self.child(root, *d) else { continue };
            path.push(*d);
            match self.search_rec(&child, 1, bound, path, stats) {
                Outcome::Exhausted => { path.pop(); }
                outcome => return outcome
            }
        }
        Outcome::Exhausted
    }

    /// Returns the order of the first moves and the number of nodes visited to find it.
    ///
    /// Without probing, moves are ordered by the estimates of their boards. Probing runs
    /// cheap limited searches for the bounds below `start_bound` and counts the nodes of each first move.
    /// Moves with more nodes within the bound go first. Probing stops once any move reaches
    /// [`PROBE_SATURATION`] nodes, and such saturated moves go last.
    fn first_moves(&self, root: &Node<H::Value>, start_bound: u8) -> (ArrayVec<Direction, 4>, u64) {
        let children = self.children(root);
        let mut order: ArrayVec<Direction, 4> = children.iter().map(|c| c.last).collect();
        if !self.first_move_ordering || order.len() < 2 { return (order, 0); }
        let mut visits = [0u64; 4];
        let mut saturated = [false; 4];
        let mut bound = with_parity(root.estimate, &root.board);
        let mut path = Vec::with_capacity(start_bound as usize);
        while bound < start_bound {
            for child in &children {
                let mut limited = Limited::with_limit(PROBE_SATURATION);
                path.clear();
                self.search_rec(child, 1, bound, &mut path, &mut limited);
                visits[child.last.index()] += limited.visits;
                saturated[child.last.index()] |= limited.saturated();
            }
            debug!("probing bound {}: {:?} nodes per first move", bound, visits);
            if saturated.iter().any(|s| *s) { break; }
            bound += 2;
        }
        order.sort_by_key(|d| (saturated[d.index()], std::cmp::Reverse(visits[d.index()])));
        (order, visits.iter().sum())
    }

    /// Uses the cached `record` of `board`: returns the cached solution,
    /// or completes the cached prefix by searching the exact remaining number of moves.
    fn solve_from_record(&self, board: &Board, record: &ReferenceMoves, stats: &mut SearchStats) -> CachedStart {
        let standard = self.heuristic.estimate(board);
        if record.moves < standard || with_parity(record.moves, board) != record.moves { return CachedStart::Invalid; }
        let Some(after_prefix) = board.apply(&record.partial) else { return CachedStart::Invalid };
        if record.is_complete() {
            return if after_prefix == self.goal {
                CachedStart::Solved(record.partial.clone(), SolutionSource::ReferenceCache)
            } else {
                CachedStart::Invalid
            };
        }
        let Some(&last) = record.partial.last() else { return CachedStart::Bound(record.moves) };
        let mut node = self.root(&after_prefix);
        node.last = last;
        let mut path = record.partial.clone();
        match self.search_rec(&node, record.partial.len() as u8, record.moves, &mut path, stats) {
            Outcome::Found if path.len() == record.moves as usize => CachedStart::Solved(path, SolutionSource::ReferencePrefix),
            Outcome::Cancelled => CachedStart::TimedOut,
            _ => CachedStart::Invalid
        }
    }

    /// Solves solvable `board`. Returns the report and whether the search started from an estimate given by the cache.
    fn search(&mut self, board: &Board, start_moment: Instant, advanced: bool) -> (SolveReport, bool) {
        let mut stats = SearchStats::with_deadline(self.timeout.map(|t| start_moment + t));
        let root = self.root(board);
        let mut report = SolveReport::new(SolveStatus::Solved, root.estimate as i8);
        if *board == self.goal {
            report.elapsed = start_moment.elapsed();
            return (report, false);
        }
        let mut start_bound = with_parity(root.estimate, board);
        let mut boosted = false;
        if advanced && self.reference.is_enabled() {
            match self.reference.call(|s| s.lookup_exact(board)).flatten() {
                Some(record) => match self.solve_from_record(board, &record, &mut stats) {
                    CachedStart::Solved(moves, source) => {
                        report.estimate = record.moves as i8;
                        report.depth = record.moves;
                        report.moves = moves;
                        report.source = source;
                        report.nodes = stats.visits();
                        report.elapsed = start_moment.elapsed();
                        return (report, true);
                    }
                    CachedStart::TimedOut => {
                        report.status = SolveStatus::Timeout;
                        report.depth = record.moves;
                        report.nodes = stats.visits();
                        report.elapsed = start_moment.elapsed();
                        return (report, true);
                    }
                    CachedStart::Bound(moves) => {
                        start_bound = moves;
                        boosted = true;
                    }
                    CachedStart::Invalid => {
                        warn!("cached record {:?} of {:?} is invalid and has been discarded", record, board);
                        self.reference.call(|s| s.invalidate(board));
                    }
                },
                None => {
                    let estimate = self.boosted_estimate(board, root.estimate);
                    if estimate > start_bound {
                        start_bound = estimate;
                        boosted = true;
                    }
                }
            }
            report.estimate = start_bound as i8;
        }

        let (order, probe_nodes) = self.first_moves(&root, start_bound);
        let max_bound = max_moves(self.side());
        let mut bound = start_bound;
        let mut path = Vec::with_capacity(max_bound as usize);
        loop {
            let visits_before = stats.visits();
            path.clear();
            let outcome = self.search_root(&root, &order, bound, &mut path, &mut stats);
            let nodes = stats.visits() - visits_before;
            report.iterations.push(IterationStats { bound, nodes, completed: outcome != Outcome::Cancelled });
            debug!("bound {}: {} nodes, {:?}", bound, nodes, outcome);
            match outcome {
                Outcome::Found => {
                    report.moves = path;
                    break;
                }
                Outcome::Cancelled => {
                    report.status = SolveStatus::Timeout;
                    break;
                }
                Outcome::Exhausted if bound + 2 > max_bound => {
                    report.status = SolveStatus::Exhausted;
                    break;
                }
                Outcome::Exhausted => bound += 2
            }
        }
        report.depth = bound;
        report.nodes = stats.visits() + probe_nodes;
        report.elapsed = start_moment.elapsed();
        (report, boosted)
    }

    /// Adds the solution of `board` to the reference cache, if the solver is allowed to do so.
    fn write_back(&mut self, board: &Board, moves: &[Direction], boosted: bool) -> bool {
        if !self.auto_update_reference || boosted || !self.kind().is_authoritative() { return false; }
        let context = self.context(boosted);
        let steps = moves.len() as u8;
        self.reference.call(|s| s.add_board(board, steps, moves, &context)).unwrap_or(false)
    }

    /// Finds an optimal solution of `board`.
    ///
    /// Unsolvable boards and timeouts are reported by the status of the returned report,
    /// and a board of a different size than the solver's is an error.
    pub fn solve(&mut self, board: &Board) -> Result<SolveReport, BoardError> {
        self.check_side(board)?;
        let start_moment = Instant::now();
        if !board.is_solvable() {
            let mut report = SolveReport::new(SolveStatus::Unsolvable, -1);
            report.elapsed = start_moment.elapsed();
            return Ok(report);
        }
        self.memo.begin_search();
        let (report, boosted) = self.search(board, start_moment, self.advanced);
        self.memo.end_search();
        if report.is_solved() && report.source == SolutionSource::Search && self.write_back(board, &report.moves, boosted) {
            info!("{:?} added to the reference cache", board);
        }
        info!("{} {}: {:?} moves at depth {}, {} nodes, {:.3?}",
              self.kind(), report.status, report.steps(), report.depth, report.nodes, report.elapsed);
        Ok(report)
    }

    /// Verifies all unverified records of the reference cache with `self`. Returns the number of updated records.
    pub fn update_pending(&mut self) -> usize {
        let mut reference = std::mem::take(&mut self.reference);
        let result = reference.call(|s| s.update_pending(Some(&mut *self))).unwrap_or(0);
        self.reference = reference;
        result
    }

    /// Reports `board` as the last searched one and lets the reference cache verify it with `self`.
    pub fn update_last_search(&mut self, board: &Board) -> bool {
        let mut reference = std::mem::take(&mut self.reference);
        let result = reference.call(|s| s.update_last_search(board, Some(&mut *self))).unwrap_or(false);
        self.reference = reference;
        result
    }
}

/// Solver verifies cache records with standard search.
impl<H: Heuristic> ReferenceVerifier for Solver<H> {
    fn kind(&self) -> HeuristicKind { self.heuristic.kind() }

    fn verify(&mut self, board: &Board) -> Option<Vec<Direction>> {
        if board.side() != self.side() || !board.is_solvable() { return None; }
        self.memo.begin_search();
        let (report, _) = self.search(board, Instant::now(), false);
        self.memo.end_search();
        report.is_solved().then_some(report.moves)
    }
}
