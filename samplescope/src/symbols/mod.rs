//! # Symbols and Address Resolution
//!
//! A [`Symbol`] is a named address range `[start, end)` taken from an
//! executable's symbol information. During aggregation every resolved sample
//! is filed under the symbol that contains it, and the symbol keeps a running
//! total plus an ordered set of its samples (hottest first).
//!
//! ## Resolution
//!
//! The [`SymbolResolver`] trait is the seam between the sample database and
//! whatever produced the symbols. It maps a raw address from the database to
//! the owning symbol (if any) and to the address in the symbol's space:
//!
//! ```text
//! raw key 0x4f0 ──resolve(is_kernel = false)──▶ (Some(main), 0x4004f0)
//!                                                     │        │
//!                                        owning symbol ┘        └ normalized address
//! ```
//!
//! [`SymbolTable`] is the in-tree resolver: a sorted list of symbols built
//! programmatically or from an `nm`-style listing.
//!
//! Symbols are owned by the resolver. Samples refer back to them by
//! [`SymbolId`] only.

pub mod symbol;
pub mod table;

pub use symbol::{Symbol, SymbolSample};
pub use table::SymbolTable;

use crate::domain::SymbolId;

/// Outcome of resolving one raw address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Owning symbol, or `None` for an unresolved address
    pub symbol: Option<SymbolId>,
    /// Address translated into the symbol table's address space
    pub address: u64,
}

impl Resolution {
    /// An address no symbol claims; the raw address is kept as-is
    #[must_use]
    pub fn unresolved(address: u64) -> Self {
        Self { symbol: None, address }
    }
}

/// Maps raw sample addresses to symbols
///
/// Implementations must be deterministic for a fixed set of symbols.
pub trait SymbolResolver {
    /// Resolve a raw database key
    ///
    /// `is_kernel` comes from the sample database header and tells the
    /// resolver whether the address is already a kernel virtual address.
    fn resolve(&self, raw: u64, is_kernel: bool) -> Resolution;

    /// Mutable access to a symbol previously returned by [`resolve`](Self::resolve)
    fn symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol>;

    /// Forget the samples filed by a previous aggregation pass
    fn clear_samples(&mut self);
}
