use crate::puzzle_sliding16::board::Board;
use std::fmt;
use std::sync::Arc;

/// Description of a single move: `tile` slides from cell `from` to cell `to` (the previous position of blank).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileMove {
    pub tile: u8,
    pub from: u8,
    pub to: u8
}

/// Family of a heuristic, ordered from the weakest to the strongest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum HeuristicKind {
    Manhattan,
    LinearConflict,
    WalkingDistance,
    PatternDatabase,
}

impl HeuristicKind {
    /// Returns the kind of the maximum of heuristics of kinds `self` and `other`.
    #[inline] pub fn combined_with(self, other: Self) -> Self { self.max(other) }

    /// Whether the solver using the heuristic of this kind can verify records of reference cache.
    #[inline] pub fn is_authoritative(self) -> bool { self == HeuristicKind::PatternDatabase }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeuristicKind::Manhattan => "MD",
            HeuristicKind::LinearConflict => "MD+LC",
            HeuristicKind::WalkingDistance => "WD",
            HeuristicKind::PatternDatabase => "PDB",
        })
    }
}

/// Admissible estimation of the number of moves needed to solve a board.
///
/// Heuristic keeps its precomputed tables only and is read-only after construction.
/// The per-node data needed for fast (incremental) evaluation are kept in [`Heuristic::Value`].
pub trait Heuristic {
    /// Data kept for each board during search, which allows to calculate the estimation for neighbor boards quickly.
    type Value: Copy;

    fn kind(&self) -> HeuristicKind;

    /// Side of the boards supported by `self`.
    fn side(&self) -> u8;

    /// Calculates value for `board` from scratch.
    fn value_for_board(&self, board: &Board) -> Self::Value;

    /// Returns value for `board_after` which is obtained by the move `mv` from the board with value `old_value`.
    fn update_value(&self, old_value: &Self::Value, board_after: &Board, mv: TileMove) -> Self::Value;

    /// Returns the estimation stored in `value`.
    fn estimate_of(&self, value: &Self::Value) -> u8;

    /// Returns the estimation for `board`.
    #[inline] fn estimate(&self, board: &Board) -> u8 {
        self.estimate_of(&self.value_for_board(board))
    }
}

/// Maximum of two heuristics.
impl<A: Heuristic, B: Heuristic> Heuristic for (A, B) {
    type Value = (A::Value, B::Value);

    #[inline] fn kind(&self) -> HeuristicKind { self.0.kind().combined_with(self.1.kind()) }

    #[inline] fn side(&self) -> u8 { self.0.side() }

    #[inline] fn value_for_board(&self, board: &Board) -> Self::Value {
        (self.0.value_for_board(board), self.1.value_for_board(board))
    }

    #[inline] fn update_value(&self, old_value: &Self::Value, board_after: &Board, mv: TileMove) -> Self::Value {
        (self.0.update_value(&old_value.0, board_after, mv), self.1.update_value(&old_value.1, board_after, mv))
    }

    #[inline] fn estimate_of(&self, value: &Self::Value) -> u8 {
        self.0.estimate_of(&value.0).max(self.1.estimate_of(&value.1))
    }
}

/// Shared heuristic, so its tables can be built once and used by many solvers.
impl<H: Heuristic + ?Sized> Heuristic for Arc<H> {
    type Value = H::Value;

    #[inline(always)] fn kind(&self) -> HeuristicKind { (**self).kind() }
    #[inline(always)] fn side(&self) -> u8 { (**self).side() }
    #[inline(always)] fn value_for_board(&self, board: &Board) -> Self::Value { (**self).value_for_board(board) }
    #[inline(always)] fn update_value(&self, old_value: &Self::Value, board_after: &Board, mv: TileMove) -> Self::Value {
        (**self).update_value(old_value, board_after, mv)
    }
    #[inline(always)] fn estimate_of(&self, value: &Self::Value) -> u8 { (**self).estimate_of(value) }
}

#[derive(Clone, Copy, Debug)]
struct MemoEntry {
    board: Board,
    standard: u8,
    advanced: Option<u8>
}

/// Remembers the estimations of the most recently queried board.
///
/// Both estimations are forgotten when a search begins, so a new search root is never evaluated
/// with values stored for a previous one.
#[derive(Clone, Debug, Default)]
pub struct EstimateMemo {
    last: Option<MemoEntry>,
    searching: bool
}

impl EstimateMemo {
    pub fn new() -> Self { Default::default() }

    fn entry(&self, board: &Board) -> Option<&MemoEntry> {
        if self.searching { return None; }
        self.last.as_ref().filter(|e| e.board == *board)
    }

    /// Returns the remembered structural estimation of `board`.
    pub fn standard(&self, board: &Board) -> Option<u8> {
        self.entry(board).map(|e| e.standard)
    }

    /// Returns the remembered estimation of `board` boosted by the reference cache.
    pub fn advanced(&self, board: &Board) -> Option<u8> {
        self.entry(board).and_then(|e| e.advanced)
    }

    pub fn store_standard(&mut self, board: &Board, standard: u8) {
        if self.searching { return; }
        match &mut self.last {
            Some(e) if e.board == *board => e.standard = standard,
            _ => self.last = Some(MemoEntry { board: *board, standard, advanced: None }),
        }
    }

    pub fn store_advanced(&mut self, board: &Board, standard: u8, advanced: u8) {
        if self.searching { return; }
        self.last = Some(MemoEntry { board: *board, standard, advanced: Some(advanced) });
    }

    /// Marks the beginning of a search and forgets everything.
    pub fn begin_search(&mut self) {
        self.searching = true;
        self.last = None;
    }

    pub fn end_search(&mut self) { self.searching = false; }

    #[inline] pub fn is_searching(&self) -> bool { self.searching }

    pub fn invalidate(&mut self) { self.last = None; }
}
