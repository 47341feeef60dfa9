//! Sample aggregation keyed by raw database address.
//!
//! # Algorithm
//!
//! For every `(raw, count)` entry:
//!
//! 1. Resolve `raw` (with the database's `is_kernel` flag) to a symbol and a
//!    normalized address. Without a resolver the sample is unresolved and
//!    keeps the raw address.
//! 2. Look up **`raw`**, not the normalized address, in the sample map.
//!    - Absent: insert a new [`Sample`]; if resolved, file it under its
//!      symbol and add `count` to the symbol total.
//!    - Present: add `count` to the sample, and to its symbol's entry and
//!      total when resolved.
//!
//! Counts never decrease. A zero-count entry still creates a sample.

use log::debug;
use std::collections::HashMap;

use super::Sample;
use crate::symbols::{Resolution, SymbolResolver};

/// One aggregation pass: raw address → [`Sample`]
#[derive(Debug, Default)]
pub struct SampleAggregator {
    samples: HashMap<u64, Sample>,
}

impl SampleAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one database entry into the map and the symbol model
    pub fn record<R: SymbolResolver + ?Sized>(
        &mut self,
        resolver: Option<&mut R>,
        is_kernel: bool,
        raw: u64,
        count: u32,
    ) {
        let count = u64::from(count);

        if let Some(sample) = self.samples.get_mut(&raw) {
            let previous = sample.as_symbol_sample();
            sample.count += count;

            if let (Some(id), Some(resolver)) = (sample.symbol, resolver) {
                if let Some(symbol) = resolver.symbol_mut(id) {
                    symbol.increment_sample(previous, count);
                }
            }
            return;
        }

        let Resolution { symbol, address } = match resolver {
            Some(resolver) => {
                let resolution = resolver.resolve(raw, is_kernel);
                let owner = resolution.symbol.and_then(|id| resolver.symbol_mut(id));
                let sample = Sample { raw, address: resolution.address, symbol: resolution.symbol, count };
                match owner {
                    Some(owner) => owner.add_sample(sample.as_symbol_sample()),
                    None => debug!("Unresolved sample at 0x{raw:x} ({count} hits)"),
                }
                resolution
            }
            None => Resolution::unresolved(raw),
        };

        self.samples.insert(raw, Sample { raw, address, symbol, count });
    }

    #[must_use]
    pub fn get(&self, raw: u64) -> Option<&Sample> {
        self.samples.get(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw address → sample, in no particular order
    #[must_use]
    pub fn samples(&self) -> &HashMap<u64, Sample> {
        &self.samples
    }

    /// Samples sorted by count (highest first), ties broken by raw address
    #[must_use]
    pub fn sorted_by_count(&self) -> Vec<&Sample> {
        let mut sorted: Vec<&Sample> = self.samples.values().collect();
        sorted.sort_by(|a, b| b.count.cmp(&a.count).then(a.raw.cmp(&b.raw)));
        sorted
    }

    /// Samples no symbol claimed
    pub fn unresolved(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values().filter(|sample| !sample.is_resolved())
    }

    #[must_use]
    pub fn unresolved_count(&self) -> u64 {
        self.unresolved().map(|sample| sample.count).sum()
    }

    /// Sum of every sample's count
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.samples.values().map(|sample| sample.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymbolId;
    use crate::symbols::{Symbol, SymbolTable};

    fn record_all(agg: &mut SampleAggregator, table: Option<&mut SymbolTable>, entries: &[(u64, u32)]) {
        let mut table = table;
        for &(raw, count) in entries {
            agg.record(table.as_deref_mut(), false, raw, count);
        }
    }

    fn table() -> SymbolTable {
        let mut table = SymbolTable::new().with_image_end(0x1100);
        table.push(Symbol::new("hot", 0x1000));
        table.push(Symbol::new("cold", 0x1010));
        table.finalize();
        table
    }

    #[test]
    fn test_duplicate_raw_keys_merge() {
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, None, &[(0x1000, 5), (0x2000, 3), (0x1000, 2)]);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get(0x1000).unwrap().count, 7);
        assert_eq!(agg.get(0x2000).unwrap().count, 3);
        assert_eq!(agg.total_count(), 10);
    }

    #[test]
    fn test_without_resolver_samples_are_unresolved() {
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, None, &[(0x1004, 1)]);

        let sample = agg.get(0x1004).unwrap();
        assert_eq!(sample.address, 0x1004);
        assert!(!sample.is_resolved());
        assert_eq!(agg.unresolved_count(), 1);
    }

    #[test]
    fn test_resolved_samples_update_symbol() {
        let mut table = table();
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, Some(&mut table), &[(0x1004, 7), (0x1008, 1)]);

        let hot = table.get(SymbolId(0)).unwrap();
        assert_eq!(hot.count(), 8);
        let counts: Vec<u64> = hot.samples().map(|s| s.count).collect();
        assert_eq!(counts, vec![7, 1]);
        assert_eq!(agg.get(0x1004).unwrap().symbol, Some(SymbolId(0)));
    }

    #[test]
    fn test_merge_updates_symbol_entry_and_total() {
        let mut table = table();
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, Some(&mut table), &[(0x1004, 1), (0x1008, 3), (0x1004, 5)]);

        let hot = table.get(SymbolId(0)).unwrap();
        assert_eq!(hot.count(), 9);
        assert_eq!(hot.sample_count(), 2);
        let first = hot.samples().next().unwrap();
        assert_eq!((first.address, first.count), (0x1004, 6));
    }

    #[test]
    fn test_unresolved_sample_counts_but_is_not_filed() {
        let mut table = table();
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, Some(&mut table), &[(0x5000, 4), (0x1012, 2)]);

        assert_eq!(agg.total_count(), 6);
        assert_eq!(agg.unresolved_count(), 4);
        let filed: usize = table.iter().map(|(_, s)| s.sample_count()).sum();
        assert_eq!(filed, 1);

        let symbol_total: u64 = table.iter().map(|(_, s)| s.count()).sum();
        assert_eq!(symbol_total + agg.unresolved_count(), agg.total_count());
    }

    #[test]
    fn test_zero_count_entry_still_recorded() {
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, None, &[(0x3000, 0)]);

        assert_eq!(agg.len(), 1);
        assert_eq!(agg.get(0x3000).unwrap().count, 0);
    }

    #[test]
    fn test_sorted_by_count() {
        let mut agg = SampleAggregator::new();
        record_all(&mut agg, None, &[(0x3000, 2), (0x1000, 9), (0x2000, 2)]);

        let order: Vec<u64> = agg.sorted_by_count().iter().map(|s| s.raw).collect();
        assert_eq!(order, vec![0x1000, 0x2000, 0x3000]);
    }
}
