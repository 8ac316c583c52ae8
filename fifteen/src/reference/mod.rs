//! Cache of exactly solved hard boards, shared by solvers.
//!
//! The cache stores the optimal number of moves (and the first moves of an optimal solution)
//! of each board whose solution is at least the cutoff long.
//! A board and its mirror image in the main diagonal share one entry.

pub mod probe;
pub mod service;

use crate::config::SolverConfig;
use crate::puzzle_sliding16::board::Board;
use crate::puzzle_sliding16::heuristic::HeuristicKind;
use crate::puzzle_sliding16::neighbors::Direction;
use crate::puzzle_sliding16::state::State;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use log::{debug, info, warn};

/// Canonical key of a board: the smaller (as packed state) of the board and its mirror image.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ReferenceBoard {
    state: State,
    side: u8
}

impl ReferenceBoard {
    /// Returns the key of `board` and whether the key represents the mirror image of `board`.
    pub fn canonical(board: &Board) -> (Self, bool) {
        let mirror = board.symmetric();
        if mirror.state() < board.state() {
            (Self { state: mirror.state(), side: board.side() }, true)
        } else {
            (Self { state: board.state(), side: board.side() }, false)
        }
    }

    /// Returns the board represented by `self`.
    pub fn board(&self) -> Board { Board::with_state(self.state, self.side) }

    #[inline] pub fn side(&self) -> u8 { self.side }
}

/// Cached record of a reference board.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReferenceMoves {
    /// Number of moves of an optimal solution.
    pub moves: u8,
    /// First moves of an optimal solution (all of them if the solution is short).
    pub partial: Vec<Direction>,
    /// Whether `moves` has been found by a solver using pattern databases.
    pub verified: bool
}

impl ReferenceMoves {
    /// Whether `partial` is the whole optimal solution.
    #[inline] pub fn is_complete(&self) -> bool { self.partial.len() == self.moves as usize }

    /// Returns the record of the mirror image.
    fn transposed(mut self) -> Self {
        for d in self.partial.iter_mut() { *d = d.transposed(); }
        self
    }
}

/// Description of a solver that reports a solution to the cache.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SolverContext {
    pub kind: HeuristicKind,
    pub side: u8,
    /// Whether the search started from an estimate boosted by the cache.
    pub boosted: bool
}

impl SolverContext {
    /// Whether records reported by the solver can be marked as verified.
    #[inline] pub fn is_authoritative(&self) -> bool { self.kind.is_authoritative() && !self.boosted }
}

/// Solver able to (re)compute the records of the cache.
pub trait ReferenceVerifier {
    fn kind(&self) -> HeuristicKind;

    /// Returns an optimal solution of `board`, or `None` if it has not been found (e.g. because of timeout).
    fn verify(&mut self, board: &Board) -> Option<Vec<Direction>>;
}

/// Process-wide cache of reference boards. All methods can be called concurrently.
pub struct ReferenceAccumulator {
    entries: RwLock<HashMap<ReferenceBoard, ReferenceMoves>>,
    cutoff: u8,
    num_partial_moves: usize,
    probe_depth: u8,
    last_search: Mutex<Option<Board>>,
    verifier: Mutex<Option<Box<dyn ReferenceVerifier + Send>>>
}

impl ReferenceAccumulator {
    /// Returns empty cache for boards that need at least `cutoff` moves.
    /// Each record keeps `num_partial_moves` first moves of the solution,
    /// and estimates are boosted by boards that are at most `probe_depth` moves away.
    pub fn new(cutoff: u8, num_partial_moves: usize, probe_depth: u8) -> Self {
        Self {
            entries: Default::default(),
            cutoff, num_partial_moves, probe_depth,
            last_search: Mutex::new(None),
            verifier: Mutex::new(None)
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.reference_cutoff, config.num_partial_moves, config.reference_probe_depth)
    }

    /// Installs the solver used by [`Self::update_pending`] and [`Self::update_last_search`] when the caller gives none.
    pub fn set_verifier(&self, verifier: Box<dyn ReferenceVerifier + Send>) {
        *self.verifier.lock().unwrap_or_else(PoisonError::into_inner) = Some(verifier);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ReferenceBoard, ReferenceMoves>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ReferenceBoard, ReferenceMoves>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the minimal number of moves of boards worth caching.
    #[inline] pub fn cutoff_setting(&self) -> u8 { self.cutoff }

    /// Returns 95% of the cutoff. Only estimates that reach this limit are boosted.
    #[inline] pub fn cutoff_limit(&self) -> u8 { (self.cutoff as u16 * 95 / 100) as u8 }

    pub fn len(&self) -> usize { self.read().len() }

    pub fn is_empty(&self) -> bool { self.read().is_empty() }

    /// Returns a snapshot of all records, ordered by keys.
    pub fn active_map(&self) -> Vec<(ReferenceBoard, ReferenceMoves)> {
        let mut result: Vec<_> = self.read().iter().map(|(k, v)| (*k, v.clone())).collect();
        result.sort_unstable_by_key(|(k, _)| *k);
        result
    }

    /// Returns the record of `board` (with solution moves given for `board`, not for its canonical form).
    pub fn lookup_exact(&self, board: &Board) -> Option<ReferenceMoves> {
        let (key, mirrored) = ReferenceBoard::canonical(board);
        let record = self.read().get(&key).cloned()?;
        Some(if mirrored { record.transposed() } else { record })
    }

    /// Returns `estimate` of moves needed to solve `board`, raised if `board` is close to a cached board.
    ///
    /// If `board` is `k` moves away from a board that needs `m` moves, then it needs at least `m - k` moves.
    /// Only boards at most the probe depth away are found.
    ///
    /// Estimates below [`Self::cutoff_limit`] are returned unchanged. The gate is 95% of the cutoff,
    /// not the cutoff itself, so a board whose estimate is just below the cutoff can still be boosted
    /// by a nearby cached board.
    pub fn boost_estimate(&self, board: &Board, estimate: u8) -> u8 {
        if estimate < self.cutoff_limit() { return estimate; }
        let candidates: Vec<(Board, u8)> = self.read().iter()
            .filter(|(key, record)| key.side == board.side() && record.moves > estimate)
            .map(|(key, record)| (key.board(), record.moves))
            .collect();
        let mut result = estimate;
        for (reference, moves) in candidates {
            if moves <= result { continue; }
            let max_distance = self.probe_depth.min(moves - result - 1);
            let mirror = reference.symmetric();
            let orientations = if mirror == reference { vec![reference] } else { vec![reference, mirror] };
            for r in orientations {
                if let Some(distance) = probe::moves_between(board, &r, max_distance) {
                    result = result.max(moves - distance);
                }
            }
        }
        if result > estimate { debug!("estimate of {:?} boosted from {} to {}", board, estimate, result); }
        result
    }

    /// Inserts or updates the record of `board` that needs `moves` moves, solved by `solution` (or its prefix).
    ///
    /// Boards below the cutoff are ignored, and verified records are never replaced by unverified ones.
    /// Returns whether the cache has changed.
    pub fn add_board(&self, board: &Board, moves: u8, solution: &[Direction], context: &SolverContext) -> bool {
        if moves < self.cutoff || board.side() != context.side { return false; }
        let mut partial: Vec<Direction> = solution.iter().take(self.num_partial_moves.min(moves as usize)).copied().collect();
        if board.apply(&partial).is_none() {
            warn!("illegal solution prefix {:?} reported for {:?}, storing the number of moves only", partial, board);
            partial.clear();
        }
        let (key, mirrored) = ReferenceBoard::canonical(board);
        let mut record = ReferenceMoves { moves, partial, verified: context.is_authoritative() };
        if mirrored { record = record.transposed(); }
        let mut entries = self.write();
        let unchanged = entries.get(&key)
            .map_or(false, |old| *old == record || (old.verified && !record.verified));
        if unchanged { return false; }
        entries.insert(key, record);
        true
    }

    /// Removes the record of `board`. Returns whether it was present.
    pub fn invalidate(&self, board: &Board) -> bool {
        self.write().remove(&ReferenceBoard::canonical(board).0).is_some()
    }

    fn with_verifier<R>(&self, verifier: Option<&mut dyn ReferenceVerifier>, f: impl FnOnce(&mut dyn ReferenceVerifier) -> R) -> Option<R> {
        match verifier {
            Some(v) => Some(f(v)),
            None => {
                let mut installed = self.verifier.lock().unwrap_or_else(PoisonError::into_inner);
                installed.as_mut().map(|v| f(&mut **v))
            }
        }
    }

    /// Solves `key` by `verifier` and stores the verified record (or removes the entry if the board is below the cutoff).
    fn verify_entry(&self, key: ReferenceBoard, verifier: &mut dyn ReferenceVerifier) -> bool {
        let Some(solution) = verifier.verify(&key.board()) else { return false };
        let moves = solution.len() as u8;
        let mut entries = self.write();
        if let Some(old) = entries.get(&key) {
            if old.moves != moves {
                warn!("cached number of moves {} of {:?} corrected to {}", old.moves, key.board(), moves);
            }
        }
        if moves < self.cutoff {
            entries.remove(&key);
        } else {
            let partial = solution.into_iter().take(self.num_partial_moves).collect();
            entries.insert(key, ReferenceMoves { moves, partial, verified: true });
        }
        true
    }

    /// Verifies all unverified records with `verifier` (or the installed one).
    /// Returns the number of updated records.
    pub fn update_pending(&self, verifier: Option<&mut dyn ReferenceVerifier>) -> usize {
        self.with_verifier(verifier, |verifier| {
            if !verifier.kind().is_authoritative() { return 0; }
            let pending: Vec<ReferenceBoard> = self.read().iter()
                .filter(|(_, record)| !record.verified)
                .map(|(key, _)| *key)
                .collect();
            let updated = pending.into_iter().filter(|key| self.verify_entry(*key, verifier)).count();
            if updated != 0 { info!("{} reference boards verified", updated); }
            updated
        }).unwrap_or(0)
    }

    /// Remembers `board` as the last searched one and, if it is not verified yet,
    /// solves it with `verifier` (or the installed one) and caches the result.
    /// Returns whether the cache has changed.
    pub fn update_last_search(&self, board: &Board, verifier: Option<&mut dyn ReferenceVerifier>) -> bool {
        *self.last_search.lock().unwrap_or_else(PoisonError::into_inner) = Some(*board);
        if self.lookup_exact(board).map_or(false, |r| r.verified) { return false; }
        let (key, _) = ReferenceBoard::canonical(board);
        self.with_verifier(verifier, |verifier| {
            if !verifier.kind().is_authoritative() { return false; }
            let before = self.read().get(&key).cloned();
            self.verify_entry(key, verifier) && self.read().get(&key) != before.as_ref()
        }).unwrap_or(false)
    }

    /// Returns the board given to the most recent [`Self::update_last_search`] call.
    pub fn last_search(&self) -> Option<Board> {
        *self.last_search.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
