use std::collections::HashMap;
use csf::{fp, GetSize, bits_to_store};
use csf::fp::{CollisionSolverBuilder, LoMemAcceptEquals};
use ph::{BuildSeededHasher, BuildDefaultSeededHasher};
use bitm::{BitAccess, BitVec};

/// Representation of key -> distance to goal map of a single pattern group.
pub trait PatternStore {

    type Table;

    /// Gets from `table` and returns heuristic value for given `key`, or `0` if `key` is not in `table`.
    fn heuristic_value(table: &Self::Table, key: u32) -> u8;

    /// Constructs table with given distances to goal (`data`) of keys that occupy (at most) `key_bits` lowest bits.
    /// i-th vector in `data` contains all keys with distance to goal equal i.
    fn construct(self, data: Vec::<Vec::<u32>>, key_bits: u8) -> Self::Table;

    /// Returns the size of `table` in bytes.
    fn size_bytes(table: &Self::Table) -> usize;
}

/// Array indexed by keys, which stores distances using minimal number of bits per value.
#[derive(Default, Copy, Clone)]
pub struct UseDense;

pub struct DenseTable {
    values: Box<[u64]>,
    bits_per_value: u8
}

impl PatternStore for UseDense {
    type Table = DenseTable;

    #[inline(always)] fn heuristic_value(table: &Self::Table, key: u32) -> u8 {
        table.values.get_fragment(key as usize, table.bits_per_value) as u8
    }

    fn construct(self, data: Vec<Vec<u32>>, key_bits: u8) -> Self::Table {
        let bits_per_value = bits_to_store(data.len().saturating_sub(1) as u64).max(1);
        let mut values = Box::<[u64]>::with_zeroed_bits((1usize << key_bits) * bits_per_value as usize);
        for (distance, keys) in data.into_iter().enumerate() {
            for key in keys { values.set_fragment(key as usize, distance as u64, bits_per_value); }
        }
        DenseTable { values, bits_per_value }
    }

    fn size_bytes(table: &Self::Table) -> usize { table.values.len() * 8 }
}

#[derive(Default, Copy, Clone)]
pub struct UseHashMap;

impl PatternStore for UseHashMap {
    type Table = HashMap<u32, u8>;

    #[inline(always)] fn heuristic_value(table: &Self::Table, key: u32) -> u8 {
        *table.get(&key).unwrap_or(&0)
    }

    fn construct(self, data: Vec<Vec<u32>>, _key_bits: u8) -> Self::Table {
        let mut result = HashMap::with_capacity(data.iter().map(|v|v.len()).sum());
        for (distance, keys) in data.into_iter().enumerate() {
            result.extend(keys.into_iter().map(|k| (k, distance as u8)));
        }
        result
    }

    fn size_bytes(table: &Self::Table) -> usize { 5*table.len() }
}

/// Compressed static function (fingerprint-based) that maps each key to its distance.
#[derive(Clone)]
pub struct UseFPMap<
    LSC = fp::OptimalLevelSize,
    CSB: CollisionSolverBuilder = LoMemAcceptEquals,
    S: BuildSeededHasher = BuildDefaultSeededHasher
> {
    pub conf: fp::MapConf<LSC, CSB, S>
}

impl Default for UseFPMap<fp::OptimalLevelSize, LoMemAcceptEquals, BuildDefaultSeededHasher> {
    fn default() -> Self {
        Self {conf: Default::default()}
    }
}

impl<LSC, CSB, S> From<fp::MapConf<LSC, CSB, S>> for UseFPMap<LSC, CSB, S>
    where CSB: CollisionSolverBuilder, S: BuildSeededHasher
{
    fn from(conf: fp::MapConf<LSC, CSB, S>) -> Self {
        Self { conf }
    }
}

impl<LSC: fp::SimpleLevelSizeChooser, CS: CollisionSolverBuilder, S: BuildSeededHasher> PatternStore for UseFPMap<LSC, CS, S> {
    type Table = fp::Map<S>;

    #[inline(always)] fn heuristic_value(table: &Self::Table, key: u32) -> u8 {
        table.get(&key).unwrap_or(0) as u8
    }

    fn construct(self, data: Vec<Vec<u32>>, key_bits: u8) -> Self::Table {
        Self::Table::with_map_conf(&UseHashMap.construct(data, key_bits), self.conf, &mut ())
    }

    fn size_bytes(table: &Self::Table) -> usize { table.size_bytes() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Vec<u32>> {
        vec![vec![3], vec![1, 2, 7], vec![0, 4], vec![], vec![9]]
    }

    fn check<PS: PatternStore>(store: PS) {
        let table = store.construct(sample(), 4);
        assert_eq!(PS::heuristic_value(&table, 3), 0);
        assert_eq!(PS::heuristic_value(&table, 1), 1);
        assert_eq!(PS::heuristic_value(&table, 2), 1);
        assert_eq!(PS::heuristic_value(&table, 7), 1);
        assert_eq!(PS::heuristic_value(&table, 0), 2);
        assert_eq!(PS::heuristic_value(&table, 4), 2);
        assert_eq!(PS::heuristic_value(&table, 9), 4);
        assert!(PS::size_bytes(&table) > 0);
    }

    #[test]
    fn dense() {
        check(UseDense);
        let table = UseDense.construct(sample(), 4);
        assert_eq!(table.bits_per_value, 3);
        assert_eq!(UseDense::heuristic_value(&table, 5), 0);
    }

    #[test]
    fn hash_map() { check(UseHashMap); }

    #[test]
    fn fp_map() { check(UseFPMap::default()); }
}
