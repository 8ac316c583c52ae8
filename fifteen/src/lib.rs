#![doc = include_str!("../README.md")]

pub mod error;
pub mod config;
pub mod pattern_db;
pub mod stats;
pub mod solver;
pub mod reference;
pub mod puzzle_sliding16;

pub use error::{BoardError, ConfigError, ConnectivityError, PartitionError};
pub use config::SolverConfig;
pub use puzzle_sliding16::board::Board;
pub use puzzle_sliding16::neighbors::Direction;
pub use solver::{SolveReport, SolveStatus, Solver};
