//! Structured error types for samplescope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

/// Reasons a sample database could not be opened
///
/// None of these escape the query API: they are logged and the query
/// proceeds as if the database were empty.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to read sample database: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sample database truncated: need {needed} bytes, file has {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Not a sample database (bad magic {0:02x?})")]
    BadMagic([u8; 4]),

    #[error("Corrupt hash table descriptor: {current_size} nodes in use, capacity {size}")]
    CorruptDescriptor { size: u32, current_size: u32 },
}

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Symbol {name} cannot end at 0x{end:x}, before its start 0x{start:x}")]
    InvalidRange { name: String, start: u64, end: u64 },

    #[error("Malformed symbol listing at line {line}: {reason}")]
    MalformedListing { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_error_display() {
        let err = DatabaseError::Truncated { needed: 120, actual: 64 };
        assert_eq!(err.to_string(), "Sample database truncated: need 120 bytes, file has 64");
    }

    #[test]
    fn test_invalid_range_error() {
        let err = SymbolError::InvalidRange { name: "main".to_string(), start: 0x2000, end: 0x1000 };
        assert!(err.to_string().contains("main"));
        assert!(err.to_string().contains("0x1000"));
    }
}
