use crate::error::PartitionError;
use crate::pattern_db::{PatternStore, UseDense};
use crate::puzzle_sliding16::board::{Board, transposed_cell};
use crate::puzzle_sliding16::heuristic::{Heuristic, HeuristicKind, TileMove};
use crate::puzzle_sliding16::neighbors::construct_neighbors;
use crate::puzzle_sliding16::pattern::{PatternManipulator, build_additive_pattern_db};
use crate::puzzle_sliding16::utils::{DENIED, MAX_BOARD_SIZE, MAX_SIDE};
use std::fmt;
use std::time::Instant;
use log::{debug, info};

/// Maximum number of groups in a partition.
pub const MAX_GROUPS: usize = 8;

/// Maximum number of tiles in a single group.
pub const MAX_GROUP_LEN: usize = 6;

/// Predefined partitions of the 4x4 board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PatternPreset {
    /// Three groups of 5 tiles.
    #[default]
    Fives,
    /// Two groups of 6 tiles and one of 3 tiles.
    SixSixThree,
}

impl fmt::Display for PatternPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatternPreset::Fives => "555",
            PatternPreset::SixSixThree => "663",
        })
    }
}

/// Disjoint groups of tiles that cover all non-blank tiles of the board.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PatternPartition {
    side: u8,
    groups: Vec<Vec<u8>>
}

impl PatternPartition {
    /// Returns partition of the tiles of the board with given `side` into `groups`.
    pub fn new(side: u8, groups: Vec<Vec<u8>>) -> Result<Self, PartitionError> {
        if !(2..=MAX_SIDE as u8).contains(&side) { return Err(PartitionError::UnsupportedSide(side)); }
        if groups.len() > MAX_GROUPS { return Err(PartitionError::TooManyGroups(groups.len())); }
        let size = side * side;
        let mut owner = [DENIED; MAX_BOARD_SIZE];
        for (index, group) in groups.iter().enumerate() {
            if group.len() > MAX_GROUP_LEN {
                return Err(PartitionError::GroupTooLarge { index, len: group.len(), max: MAX_GROUP_LEN });
            }
            for &tile in group {
                if tile == 0 || tile >= size { return Err(PartitionError::TileOutOfRange { tile, side }); }
                if owner[tile as usize] != DENIED { return Err(PartitionError::Overlapping(tile)); }
                owner[tile as usize] = index as u8;
            }
        }
        if let Some(missing) = (1..size).find(|t| owner[*t as usize] == DENIED) {
            return Err(PartitionError::Missing(missing));
        }
        Ok(Self { side, groups })
    }

    /// Returns the predefined partition of the 4x4 board.
    pub fn preset(preset: PatternPreset) -> Self {
        let groups = match preset {
            PatternPreset::Fives => vec![vec![1, 2, 3, 6, 7], vec![4, 5, 8, 9, 12], vec![10, 11, 13, 14, 15]],
            PatternPreset::SixSixThree => vec![vec![1, 2, 3, 5, 6, 7], vec![4, 8, 9, 12, 13, 14], vec![10, 11, 15]],
        };
        Self { side: 4, groups }
    }

    /// Returns the default partition for the board with given `side`.
    pub fn default_for_side(side: u8) -> Result<Self, PartitionError> {
        match side {
            2 => Self::new(2, vec![vec![1, 2], vec![3]]),
            3 => Self::new(3, vec![vec![1, 2, 4, 5], vec![3, 6, 7, 8]]),
            4 => Ok(Self::preset(PatternPreset::Fives)),
            _ => Err(PartitionError::UnsupportedSide(side))
        }
    }

    #[inline] pub fn side(&self) -> u8 { self.side }

    #[inline] pub fn groups(&self) -> &[Vec<u8>] { &self.groups }
}

/// Value of [`PatternDatabase`] heuristic, for the board and its mirror.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PatternValue {
    keys: [u32; MAX_GROUPS],
    values: [u8; MAX_GROUPS],
    sum: u8,
    mirror_keys: [u32; MAX_GROUPS],
    mirror_values: [u8; MAX_GROUPS],
    mirror_sum: u8
}

impl PatternValue {
    /// Returns the sum of group distances of the board.
    #[inline] pub fn regular(&self) -> u8 { self.sum }

    /// Returns the sum of group distances of the board mirrored in the main diagonal.
    #[inline] pub fn mirrored(&self) -> u8 { self.mirror_sum }
}

/// Additive pattern databases of disjoint groups of tiles.
///
/// The estimation is the maximum of the sum of group distances of the board and
/// the same sum calculated for the board mirrored in the main diagonal.
pub struct PatternDatabase<PS: PatternStore = UseDense> {
    partition: PatternPartition,
    /// Index of the group of each tile, or DENIED for blank.
    group_of: [u8; MAX_BOARD_SIZE],
    manipulators: Vec<PatternManipulator>,
    tables: Vec<PS::Table>
}

impl PatternDatabase {
    /// Builds dense pattern databases for the given `partition`.
    pub fn new(partition: PatternPartition) -> Self {
        Self::with_store(partition, UseDense)
    }
}

impl<PS: PatternStore + Clone> PatternDatabase<PS> {
    /// Builds pattern databases for the given `partition`, and stores them using `store`.
    pub fn with_store(partition: PatternPartition, store: PS) -> Self {
        let side = partition.side;
        let neighbors = construct_neighbors(side, side);
        let mut group_of = [DENIED; MAX_BOARD_SIZE];
        let mut manipulators = Vec::with_capacity(partition.groups.len());
        let mut tables = Vec::with_capacity(partition.groups.len());
        for (index, group) in partition.groups.iter().enumerate() {
            let start_moment = Instant::now();
            for &tile in group { group_of[tile as usize] = index as u8; }
            let (data, manipulator) = build_additive_pattern_db(group, &neighbors);
            debug!("group {:?}: {} keys up to distance {}", group,
                   data.iter().map(|keys| keys.len()).sum::<usize>(), data.len().saturating_sub(1));
            let table = store.clone().construct(data, manipulator.key_bits());
            info!("pattern database for tiles {:?} of {}x{} board: {} bytes, built in {:.3?}",
                  group, side, side, PS::size_bytes(&table), start_moment.elapsed());
            manipulators.push(manipulator);
            tables.push(table);
        }
        Self { partition, group_of, manipulators, tables }
    }
}

impl<PS: PatternStore> PatternDatabase<PS> {
    #[inline] pub fn partition(&self) -> &PatternPartition { &self.partition }

    /// Returns the total size of the tables in bytes.
    pub fn size_bytes(&self) -> usize {
        self.tables.iter().map(PS::size_bytes).sum()
    }

    #[inline(always)] fn lookup(&self, group: usize, key: u32) -> u8 {
        PS::heuristic_value(&self.tables[group], key)
    }

    fn fill(&self, board: &Board, keys: &mut [u32; MAX_GROUPS], values: &mut [u8; MAX_GROUPS]) -> u8 {
        let mut sum = 0;
        for (g, manipulator) in self.manipulators.iter().enumerate() {
            keys[g] = manipulator.key_for(board);
            values[g] = self.lookup(g, keys[g]);
            sum += values[g];
        }
        sum
    }

    /// Updates the key and value of the group of `tile`, which has been moved to `to`. Returns the new sum.
    #[inline] fn moved(&self, tile: u8, to: u8, keys: &mut [u32; MAX_GROUPS], values: &mut [u8; MAX_GROUPS], sum: u8) -> u8 {
        let g = self.group_of[tile as usize];
        if g == DENIED { return sum; }
        let g = g as usize;
        keys[g] = self.manipulators[g].key_with_position(keys[g], tile, to);
        let new_value = self.lookup(g, keys[g]);
        let result = sum - values[g] + new_value;
        values[g] = new_value;
        result
    }
}

impl<PS: PatternStore> Heuristic for PatternDatabase<PS> {
    type Value = PatternValue;

    #[inline] fn kind(&self) -> HeuristicKind { HeuristicKind::PatternDatabase }

    #[inline] fn side(&self) -> u8 { self.partition.side }

    fn value_for_board(&self, board: &Board) -> Self::Value {
        let mut result = PatternValue {
            keys: [0; MAX_GROUPS], values: [0; MAX_GROUPS], sum: 0,
            mirror_keys: [0; MAX_GROUPS], mirror_values: [0; MAX_GROUPS], mirror_sum: 0
        };
        result.sum = self.fill(board, &mut result.keys, &mut result.values);
        result.mirror_sum = self.fill(&board.symmetric(), &mut result.mirror_keys, &mut result.mirror_values);
        result
    }

    fn update_value(&self, old_value: &Self::Value, _board_after: &Board, mv: TileMove) -> Self::Value {
        let side = self.partition.side;
        let mut result = *old_value;
        result.sum = self.moved(mv.tile, mv.to, &mut result.keys, &mut result.values, old_value.sum);
        result.mirror_sum = self.moved(transposed_cell(mv.tile, side), transposed_cell(mv.to, side),
                                       &mut result.mirror_keys, &mut result.mirror_values, old_value.mirror_sum);
        result
    }

    #[inline] fn estimate_of(&self, value: &Self::Value) -> u8 {
        value.sum.max(value.mirror_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_db::UseHashMap;
    use crate::puzzle_sliding16::manhattan::ManhattanDistance;
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_partition_validation() {
        assert_eq!(PatternPartition::new(5, vec![]), Err(PartitionError::UnsupportedSide(5)));
        assert_eq!(PatternPartition::new(2, vec![vec![1, 2], vec![2, 3]]), Err(PartitionError::Overlapping(2)));
        assert_eq!(PatternPartition::new(2, vec![vec![1, 2]]), Err(PartitionError::Missing(3)));
        assert_eq!(PatternPartition::new(2, vec![vec![0, 1, 2, 3]]), Err(PartitionError::TileOutOfRange { tile: 0, side: 2 }));
        assert_eq!(PatternPartition::new(2, vec![vec![1, 2, 4]]), Err(PartitionError::TileOutOfRange { tile: 4, side: 2 }));
        assert_eq!(PatternPartition::new(4, vec![(1..8).collect(), (8..16).collect()]),
                   Err(PartitionError::GroupTooLarge { index: 0, len: 7, max: MAX_GROUP_LEN }));
        assert_eq!(PatternPartition::new(4, (1..16).map(|t| vec![t]).collect()), Err(PartitionError::TooManyGroups(15)));
        assert!(PatternPartition::new(3, (1..9).map(|t| vec![t]).collect()).is_ok());
        assert!(PatternPartition::default_for_side(3).is_ok());
        for preset in [PatternPreset::Fives, PatternPreset::SixSixThree] {
            let p = PatternPartition::preset(preset);
            assert_eq!(PatternPartition::new(4, p.groups().to_vec()), Ok(p));
        }
        assert_eq!(PatternPreset::SixSixThree.to_string(), "663");
    }

    #[test]
    fn test_goal_and_one_move() {
        for side in 2..=3 {
            let pdb = PatternDatabase::new(PatternPartition::default_for_side(side).unwrap());
            let goal = Board::goal(side);
            assert_eq!(pdb.estimate(&goal), 0);
            for d in goal.valid_moves() {
                assert_eq!(pdb.estimate(&goal.shift(d).unwrap()), 1);
            }
        }
    }

    #[test]
    fn test_incremental_update_44() {
        let partition = PatternPartition::new(4,
            vec![vec![1, 2, 3], vec![4, 8, 12], vec![5, 6, 7], vec![9, 13, 10], vec![11, 14, 15]]).unwrap();
        let pdb = PatternDatabase::with_store(partition, UseHashMap);
        let md = ManhattanDistance::without_linear_conflict(4);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut board = Board::random(4, &mut rng);
        let mut value = pdb.value_for_board(&board);
        for _ in 0..1000 {
            let d = *board.valid_moves().choose(&mut rng).unwrap();
            let (next, mv) = board.step(d).unwrap();
            value = pdb.update_value(&value, &next, mv);
            board = next;
            assert_eq!(value, pdb.value_for_board(&board));
            // additive databases dominate Manhattan distance
            assert!(value.regular() >= md.estimate(&board));
            assert!(value.mirrored() >= md.estimate(&board));
        }
    }

    #[test]
    fn test_mirror() {
        let pdb = PatternDatabase::new(PatternPartition::default_for_side(3).unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..100 {
            let b = Board::random(3, &mut rng);
            let v = pdb.value_for_board(&b);
            let s = pdb.value_for_board(&b.symmetric());
            assert_eq!(v.regular(), s.mirrored());
            assert_eq!(v.mirrored(), s.regular());
            assert_eq!(pdb.estimate(&b), pdb.estimate(&b.symmetric()));
        }
    }
}
