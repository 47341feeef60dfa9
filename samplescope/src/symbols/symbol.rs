use rustc_demangle::demangle;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{SymbolError, Vma};

/// A sample as seen from its owning symbol
///
/// Ordered by count (highest first), then by normalized address, then by raw
/// key. The trailing keys make the order total, so two samples with the same
/// count never collapse into one set entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolSample {
    pub count: u64,
    pub address: u64,
    pub raw: u64,
}

impl Ord for SymbolSample {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.address.cmp(&other.address))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for SymbolSample {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A named address range `[start, end)` and the samples that landed in it
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    start: u64,
    /// Unset until every symbol of the image is known
    end: Option<u64>,
    demangled: OnceCell<String>,
    source_file: Option<String>,
    samples: BTreeSet<SymbolSample>,
    count: u64,
}

impl Symbol {
    #[must_use]
    pub fn new(name: impl Into<String>, start: u64) -> Self {
        Self {
            name: name.into(),
            start,
            end: None,
            demangled: OnceCell::new(),
            source_file: None,
            samples: BTreeSet::new(),
            count: 0,
        }
    }

    /// Attach the source file this symbol was compiled from
    #[must_use]
    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Demangled form of [`name`](Self::name), computed once
    ///
    /// Names that are not mangled come back unchanged.
    pub fn demangled_name(&self) -> &str {
        self.demangled.get_or_init(|| format!("{:#}", demangle(&self.name)))
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// End address, or `None` while unset
    #[must_use]
    pub fn end(&self) -> Option<u64> {
        self.end
    }

    /// Set the end address
    ///
    /// # Errors
    /// Returns [`SymbolError::InvalidRange`] if `end` lies before the start
    pub fn set_end(&mut self, end: u64) -> Result<(), SymbolError> {
        if end < self.start {
            return Err(SymbolError::InvalidRange { name: self.name.clone(), start: self.start, end });
        }
        self.end = Some(end);
        Ok(())
    }

    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Does `[start, end)` contain `addr`? Always false while the end is unset.
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        self.end.is_some_and(|end| addr >= self.start && addr < end)
    }

    /// File a new sample under this symbol and add its count to the total
    ///
    /// An entry already in the set is left alone and not counted twice.
    pub fn add_sample(&mut self, sample: SymbolSample) {
        if self.samples.insert(sample) {
            self.count += sample.count;
        }
    }

    /// Drop every filed sample and zero the total
    pub fn clear_samples(&mut self) {
        self.samples.clear();
        self.count = 0;
    }

    /// Grow an already filed sample by `added` hits
    ///
    /// The set entry is re-keyed so the ordering stays correct.
    pub fn increment_sample(&mut self, sample: SymbolSample, added: u64) {
        self.samples.remove(&sample);
        self.samples.insert(SymbolSample { count: sample.count + added, ..sample });
        self.count += added;
    }

    /// Samples in reporting order: highest count first
    pub fn samples(&self) -> impl Iterator<Item = &SymbolSample> {
        self.samples.iter()
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Total hits across every sample filed under this symbol
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Vma(self.start), self.demangled_name())?;
        if let Some(file) = &self.source_file {
            write!(f, " ({file})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(address: u64, count: u64) -> SymbolSample {
        SymbolSample { count, address, raw: address }
    }

    #[test]
    fn test_contains_is_half_open() {
        let mut sym = Symbol::new("main", 0x1000);
        assert!(!sym.contains(0x1000), "unset end contains nothing");

        sym.set_end(0x1010).unwrap();
        assert!(sym.contains(0x1000));
        assert!(sym.contains(0x100f));
        assert!(!sym.contains(0x1010));
        assert!(!sym.contains(0x0fff));
    }

    #[test]
    fn test_set_end_before_start_rejected() {
        let mut sym = Symbol::new("main", 0x1000);
        assert!(sym.set_end(0x0fff).is_err());
        assert_eq!(sym.end(), None);
        assert!(sym.set_end(0x1000).is_ok());
    }

    #[test]
    fn test_samples_ordered_by_count_descending() {
        let mut sym = Symbol::new("hot", 0x1000);
        sym.set_end(0x1010).unwrap();
        sym.add_sample(sample(0x1008, 1));
        sym.add_sample(sample(0x1004, 7));

        assert_eq!(sym.count(), 8);
        let order: Vec<u64> = sym.samples().map(|s| s.count).collect();
        assert_eq!(order, vec![7, 1]);
    }

    #[test]
    fn test_equal_counts_are_kept_apart() {
        let mut sym = Symbol::new("tied", 0x1000);
        sym.add_sample(sample(0x1008, 3));
        sym.add_sample(sample(0x1004, 3));

        assert_eq!(sym.sample_count(), 2);
        let addrs: Vec<u64> = sym.samples().map(|s| s.address).collect();
        assert_eq!(addrs, vec![0x1004, 0x1008]);
    }

    #[test]
    fn test_increment_reorders_sample() {
        let mut sym = Symbol::new("f", 0x1000);
        sym.add_sample(sample(0x1004, 2));
        sym.add_sample(sample(0x1008, 5));

        sym.increment_sample(sample(0x1004, 2), 4);

        assert_eq!(sym.sample_count(), 2);
        assert_eq!(sym.count(), 11);
        let first = sym.samples().next().unwrap();
        assert_eq!((first.address, first.count), (0x1004, 6));
    }

    #[test]
    fn test_add_same_sample_twice_counts_once() {
        let mut sym = Symbol::new("f", 0x1000);
        sym.add_sample(sample(0x1004, 7));
        sym.add_sample(sample(0x1004, 7));

        assert_eq!(sym.sample_count(), 1);
        assert_eq!(sym.count(), 7);
    }

    #[test]
    fn test_clear_samples_resets_total() {
        let mut sym = Symbol::new("f", 0x1000);
        sym.add_sample(sample(0x1004, 7));
        sym.clear_samples();

        assert_eq!(sym.sample_count(), 0);
        assert_eq!(sym.count(), 0);
    }

    #[test]
    fn test_demangled_name_cached() {
        let sym = Symbol::new("_ZN4core3fmt5write17h0123456789abcdefE", 0);
        assert_eq!(sym.demangled_name(), "core::fmt::write");
        // Second call hits the cache and returns the same string
        assert!(std::ptr::eq(sym.demangled_name(), sym.demangled_name()));

        let plain = Symbol::new("main", 0);
        assert_eq!(plain.demangled_name(), "main");
    }
}
