//! Sorted symbol table for one executable image
//!
//! Symbols are collected first, then [`SymbolTable::finalize`] sorts them and
//! assigns every end address. Lookups are only answered after that step.

use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{Resolution, Symbol, SymbolResolver};
use crate::domain::{SymbolError, SymbolId};

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// Size hint per symbol, parallel to `symbols`
    sizes: Vec<Option<u64>>,
    /// Added to user-space sample keys to get addresses in the image's space
    load_base: u64,
    /// End of the last symbol when no size is known for it
    image_end: Option<u64>,
    finalized: bool,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base address user-space sample keys are relative to
    #[must_use]
    pub fn with_load_base(mut self, load_base: u64) -> Self {
        self.load_base = load_base;
        self
    }

    #[must_use]
    pub fn with_image_end(mut self, image_end: u64) -> Self {
        self.image_end = Some(image_end);
        self.finalized = false;
        self
    }

    /// Add a symbol; its end is assigned by [`finalize`](Self::finalize)
    pub fn push(&mut self, symbol: Symbol) {
        self.push_sized(symbol, None);
    }

    /// Add a symbol whose size is known
    pub fn push_sized(&mut self, symbol: Symbol, size: Option<u64>) {
        self.symbols.push(symbol);
        self.sizes.push(size);
        self.finalized = false;
    }

    /// Sort the symbols and assign end addresses
    ///
    /// A symbol with a known size ends at `start + size`. Otherwise it ends
    /// where the next symbol with a higher start begins, so aliases sharing a
    /// start get the same range; the last one ends at the image end, or
    /// stays unset when that is unknown. [`SymbolId`]s handed out before this
    /// call are invalidated.
    pub fn finalize(&mut self) {
        let mut entries: Vec<(Symbol, Option<u64>)> =
            self.symbols.drain(..).zip(self.sizes.drain(..)).collect();
        entries.sort_by_key(|(symbol, _)| symbol.start());

        let starts: Vec<u64> = entries.iter().map(|(symbol, _)| symbol.start()).collect();
        for (idx, (symbol, size)) in entries.iter_mut().enumerate() {
            let end = match size {
                Some(size) => Some(symbol.start().saturating_add(*size)),
                None => starts[idx + 1..]
                    .iter()
                    .copied()
                    .find(|&next| next > symbol.start())
                    .or(self.image_end),
            };
            if let Some(end) = end {
                if let Err(e) = symbol.set_end(end) {
                    debug!("{e}");
                }
            }
        }

        let (symbols, sizes): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        self.symbols = symbols;
        self.sizes = sizes;
        self.finalized = true;
        info!("Symbol table finalized: {} symbols", self.symbols.len());
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(idx, symbol)| (SymbolId(idx), symbol))
    }

    /// Find the symbol containing an address in the image's space
    ///
    /// Among symbols sharing the nearest start at or below `addr`, the one
    /// listed last that contains `addr` wins.
    #[must_use]
    pub fn lookup(&self, addr: u64) -> Option<SymbolId> {
        if !self.finalized {
            return None;
        }
        let upper = self.symbols.partition_point(|s| s.start() <= addr);
        let nearest = self.symbols[..upper].last()?.start();
        self.symbols[..upper]
            .iter()
            .enumerate()
            .rev()
            .take_while(|(_, symbol)| symbol.start() == nearest)
            .find(|(_, symbol)| symbol.contains(addr))
            .map(|(idx, _)| SymbolId(idx))
    }

    /// Symbols that received at least one hit, highest aggregate count first
    #[must_use]
    pub fn hot_symbols(&self) -> Vec<(SymbolId, &Symbol)> {
        let mut hot: Vec<_> = self.iter().filter(|(_, symbol)| symbol.sample_count() > 0).collect();
        hot.sort_by(|(a_id, a), (b_id, b)| b.count().cmp(&a.count()).then(a_id.cmp(b_id)));
        hot
    }

    /// Build a finalized table from an `nm`-style listing
    ///
    /// Accepts `ADDR TYPE NAME` and `ADDR SIZE TYPE NAME` (`nm -S`) lines.
    /// Only text symbols (`T`, `t`, `W`, `w`) are kept; undefined symbols
    /// without an address are skipped.
    ///
    /// # Errors
    /// Returns an error on unreadable input or an unparsable address/size
    pub fn from_nm_listing<R: BufRead>(reader: R) -> Result<Self, SymbolError> {
        let mut table = Self::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                continue;
            }

            let malformed = |reason: String| SymbolError::MalformedListing { line: idx + 1, reason };
            let start = u64::from_str_radix(parts[0], 16)
                .map_err(|e| malformed(format!("bad address {:?}: {e}", parts[0])))?;

            let (size, kind, name_at) = if parts[1].len() == 1 {
                (None, parts[1], 2)
            } else if parts.len() >= 4 {
                let size = u64::from_str_radix(parts[1], 16)
                    .map_err(|e| malformed(format!("bad size {:?}: {e}", parts[1])))?;
                (Some(size), parts[2], 3)
            } else {
                return Err(malformed(format!("expected symbol type, found {:?}", parts[1])));
            };

            if !matches!(kind, "T" | "t" | "W" | "w") {
                continue;
            }
            table.push_sized(Symbol::new(parts[name_at..].join(" "), start), size);
        }

        table.finalize();
        Ok(table)
    }

    /// Read an `nm`-style listing from a file
    ///
    /// # Errors
    /// See [`from_nm_listing`](Self::from_nm_listing)
    pub fn from_nm_file<P: AsRef<Path>>(path: P) -> Result<Self, SymbolError> {
        let file = File::open(path.as_ref())?;
        Self::from_nm_listing(BufReader::new(file))
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, raw: u64, is_kernel: bool) -> Resolution {
        // Kernel samples are already absolute; user samples are image offsets
        let address = if is_kernel { raw } else { raw.wrapping_add(self.load_base) };
        Resolution { symbol: self.lookup(address), address }
    }

    fn symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0)
    }

    fn clear_samples(&mut self) {
        for symbol in &mut self.symbols {
            symbol.clear_samples();
        }
    }
}
