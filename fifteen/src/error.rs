use thiserror::Error;

/// Malformed board given by a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Number of cells is not a square of a supported side (2, 3 or 4).
    #[error("board has {0} cells, expected 4, 9 or 16")]
    WrongLength(usize),

    #[error("tile {tile} is out of range for a board of {size} cells")]
    TileOutOfRange { tile: u8, size: usize },

    #[error("tile {0} occurs more than once")]
    DuplicateTile(u8),

    /// Board is valid, but has a different side than the one the solver (or heuristic) was built for.
    #[error("board side {board} does not match solver side {solver}")]
    SideMismatch { board: u8, solver: u8 },
}

/// Invalid grouping of tiles into patterns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("tile {0} belongs to more than one group")]
    Overlapping(u8),

    #[error("tile {0} does not belong to any group")]
    Missing(u8),

    #[error("tile {tile} is out of range for a board with side {side}")]
    TileOutOfRange { tile: u8, side: u8 },

    #[error("group {index} has {len} tiles, at most {max} are supported")]
    GroupTooLarge { index: usize, len: usize, max: usize },

    #[error("partition has {0} groups, too many for the board")]
    TooManyGroups(usize),

    #[error("unsupported board side {0}")]
    UnsupportedSide(u8),
}

/// Failure of a call to a (remote) reference cache service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("reference service is unreachable: {0}")]
    Unreachable(String),

    #[error("reference service did not answer within {0} ms")]
    TimedOut(u64),

    #[error("connection to reference service was lost")]
    Disconnected,
}

/// Rejected configuration setting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),

    #[error("cannot parse `{value}` as value of `{key}`")]
    Unparsable { key: String, value: String },

    #[error("value {value} of `{key}` is out of range {min}..={max}")]
    OutOfRange { key: String, value: i64, min: i64, max: i64 },
}
