//! Sliding puzzle on square boards with up to 16 cells, and admissible heuristics for it.

pub mod utils;
pub mod neighbors;
pub mod state;
pub mod board;
pub mod heuristic;
pub mod manhattan;
pub mod walking;
pub mod pattern;
pub mod additive;
