use crate::error::{ConfigError, PartitionError};
use crate::puzzle_sliding16::additive::{PatternPartition, PatternPreset};
use std::time::Duration;
use log::warn;

/// Settings of solvers and of the reference cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Partition of tiles used by pattern databases of 4x4 boards.
    pub pattern_preset: PatternPreset,
    /// Boards solved in at least that many moves are cached.
    pub reference_cutoff: u8,
    /// Number of the first solution moves stored with each cached board.
    pub num_partial_moves: usize,
    /// Time limit of a single solve, `None` for no limit.
    pub timeout: Option<Duration>,
    pub linear_conflict: bool,
    pub first_move_ordering: bool,
    /// Maximal distance to a cached board taken into account when estimates are boosted.
    pub reference_probe_depth: u8,
    /// Whether pattern database solvers add their hard solutions to the cache.
    pub auto_update_reference: bool
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pattern_preset: PatternPreset::Fives,
            reference_cutoff: 46,
            num_partial_moves: 8,
            timeout: Some(Duration::from_secs(10)),
            linear_conflict: true,
            first_move_ordering: true,
            reference_probe_depth: 8,
            auto_update_reference: false
        }
    }
}

fn unparsable(key: &str, value: &str) -> ConfigError {
    ConfigError::Unparsable { key: key.to_owned(), value: value.to_owned() }
}

fn parse_in_range(key: &str, value: &str, min: i64, max: i64) -> Result<i64, ConfigError> {
    let v: i64 = value.parse().map_err(|_| unparsable(key, value))?;
    if (min..=max).contains(&v) {
        Ok(v)
    } else {
        Err(ConfigError::OutOfRange { key: key.to_owned(), value: v, min, max })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(unparsable(key, value))
    }
}

impl SolverConfig {
    /// Sets the setting `key` to `value`.
    /// On error, `self` is left unchanged.
    ///
    /// Keys: `pattern` (`555` or `663`), `reference_cutoff`, `num_partial_moves`, `timeout` (seconds, 0 disables),
    /// `linear_conflict`, `first_move_ordering`, `reference_probe_depth`, `auto_update_reference`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key.trim() {
            "pattern" => self.pattern_preset = match value {
                "555" => PatternPreset::Fives,
                "663" => PatternPreset::SixSixThree,
                _ => return Err(unparsable(key, value))
            },
            "reference_cutoff" => self.reference_cutoff = parse_in_range(key, value, 10, 80)? as u8,
            "num_partial_moves" => self.num_partial_moves = parse_in_range(key, value, 1, 40)? as usize,
            "timeout" => {
                let seconds = parse_in_range(key, value, 0, 24 * 3600)?;
                self.timeout = if seconds == 0 { None } else { Some(Duration::from_secs(seconds as u64)) };
            }
            "linear_conflict" => self.linear_conflict = parse_bool(key, value)?,
            "first_move_ordering" => self.first_move_ordering = parse_bool(key, value)?,
            "reference_probe_depth" => self.reference_probe_depth = parse_in_range(key, value, 0, 16)? as u8,
            "auto_update_reference" => self.auto_update_reference = parse_bool(key, value)?,
            _ => return Err(ConfigError::UnknownKey(key.to_owned()))
        }
        Ok(())
    }

    /// Returns the default configuration with the given settings applied.
    /// Settings that cannot be applied are reported by a warning and the defaults are kept.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item=(&'a str, &'a str)>) -> Self {
        let mut result = Self::default();
        for (key, value) in pairs {
            if let Err(e) = result.set(key, value) {
                warn!("{}, the default is kept", e);
            }
        }
        result
    }

    /// Returns the pattern partition for boards with given `side`: the configured preset for 4x4 boards,
    /// the default partition otherwise.
    pub fn partition(&self, side: u8) -> Result<PatternPartition, PartitionError> {
        if side == 4 {
            Ok(PatternPartition::preset(self.pattern_preset))
        } else {
            PatternPartition::default_for_side(side)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set() {
        let mut c = SolverConfig::default();
        assert_eq!(c.set("pattern", "663"), Ok(()));
        assert_eq!(c.pattern_preset, PatternPreset::SixSixThree);
        assert_eq!(c.set("timeout", " 0"), Ok(()));
        assert_eq!(c.timeout, None);
        assert_eq!(c.set("timeout", "3"), Ok(()));
        assert_eq!(c.timeout, Some(Duration::from_secs(3)));
        assert_eq!(c.set("linear_conflict", "Off"), Ok(()));
        assert!(!c.linear_conflict);
        assert_eq!(c.set("reference_cutoff", "5"),
                   Err(ConfigError::OutOfRange { key: "reference_cutoff".to_owned(), value: 5, min: 10, max: 80 }));
        assert_eq!(c.reference_cutoff, 46);
        assert_eq!(c.set("num_partial_moves", "eight"),
                   Err(ConfigError::Unparsable { key: "num_partial_moves".to_owned(), value: "eight".to_owned() }));
        assert_eq!(c.set("colour", "red"), Err(ConfigError::UnknownKey("colour".to_owned())));
    }

    #[test]
    fn test_from_pairs_keeps_defaults() {
        let c = SolverConfig::from_pairs([
            ("reference_cutoff", "50"),
            ("num_partial_moves", "-3"),
            ("pattern", "78"),
            ("first_move_ordering", "no"),
            ("auto_update_reference", "maybe"),
        ]);
        assert_eq!(c, SolverConfig { reference_cutoff: 50, first_move_ordering: false, ..Default::default() });
    }

    #[test]
    fn test_partition() {
        let mut c = SolverConfig::default();
        assert_eq!(c.partition(4).unwrap().groups().len(), 3);
        c.pattern_preset = PatternPreset::SixSixThree;
        assert_eq!(c.partition(4).unwrap(), PatternPartition::preset(PatternPreset::SixSixThree));
        assert_eq!(c.partition(3).unwrap().side(), 3);
        assert_eq!(c.partition(5), Err(PartitionError::UnsupportedSide(5)));
    }
}
