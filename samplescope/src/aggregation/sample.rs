use std::fmt;

use crate::domain::{SymbolId, Vma};
use crate::symbols::SymbolSample;

/// Accumulated hits for one raw database address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Key as stored in the database; the deduplication key
    pub raw: u64,
    /// Address after resolver translation
    pub address: u64,
    /// Owning symbol, `None` for unresolved samples
    pub symbol: Option<SymbolId>,
    pub count: u64,
}

impl Sample {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.symbol.is_some()
    }

    /// This sample's entry in its symbol's ordered set
    #[must_use]
    pub fn as_symbol_sample(&self) -> SymbolSample {
        SymbolSample { count: self.count, address: self.address, raw: self.raw }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}  {}", self.count, Vma(self.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_display() {
        let sample = Sample { raw: 0x4, address: 0x1004, symbol: None, count: 7 };
        assert_eq!(sample.to_string(), "         7  0x0000000000001004");
        assert!(!sample.is_resolved());
    }
}
