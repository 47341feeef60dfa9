//! Domain types providing compile-time safety and self-documentation

use std::fmt;

/// Index of a symbol inside its owning [`SymbolTable`](crate::symbols::SymbolTable)
///
/// Samples refer back to their symbol through this handle instead of a
/// pointer, so dropping the table never leaves a sample dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol#{}", self.0)
    }
}

/// Virtual memory address, printed as hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vma(pub u64);

impl fmt::Display for Vma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vma_display_is_zero_padded_hex() {
        assert_eq!(Vma(0x1000).to_string(), "0x0000000000001000");
    }

    #[test]
    fn test_symbol_id_display() {
        assert_eq!(SymbolId(3).to_string(), "Symbol#3");
    }
}
