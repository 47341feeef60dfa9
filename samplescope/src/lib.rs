//! # Samplescope - Profiler Sample Database Reader
//!
//! Samplescope reads the per-image sample files a system-wide profiler
//! leaves on disk and folds their raw address-level hit counts into
//! symbol-level statistics ready for reporting.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐
//! │  sample database     │  header (is_kernel, event config)
//! │  (on-disk hash table)│  + slots: vma → hit count
//! └──────────┬───────────┘
//!            │ entries(), one pass per query
//!            ▼
//! ┌──────────────────────┐      resolve(raw, is_kernel)     ┌──────────────┐
//! │  SampleAggregator    │ ───────────────────────────────▶ │ SymbolTable  │
//! │  raw vma → Sample    │ ◀─────────────────────────────── │ (resolver)   │
//! └──────────┬───────────┘   (symbol, normalized address)   └──────┬───────┘
//!            │                                                     │
//!            ▼                                                     ▼
//!   per-address samples                         per-symbol totals + ordered samples
//! ```
//!
//! ## Module Structure
//!
//! - [`database`]: open/close lifecycle and iteration over the sample file
//! - [`aggregation`]: deduplication of entries into one sample per raw address
//! - [`symbols`]: symbol model, resolver trait and the sorted symbol table
//! - [`domain`]: newtypes and error enums
//! - [`cli`]: command-line arguments for the `samplescope` binary
//!
//! ## Queries
//!
//! Each query opens the file, scans it once and closes it again:
//!
//! | Query                          | Result                                 |
//! |--------------------------------|----------------------------------------|
//! | [`SampleDatabase::samples`]    | raw address → [`Sample`] map           |
//! | [`SampleDatabase::has_samples`]| any slot with a positive count         |
//! | [`SampleDatabase::count`]      | sum of all stored counts               |
//!
//! A missing or unreadable file is logged and treated as an empty database.
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! let mut symbols = SymbolTable::from_nm_file("app.nm")?.with_load_base(0x40_0000);
//! let mut db = SampleDatabase::new("samples/current/.../CPU_CLK_UNHALTED.100000.0.all.all.all");
//!
//! let samples = db.samples(Some(&mut symbols));
//! for (_, symbol) in symbols.hot_symbols() {
//!     println!("{:>8} {}", symbol.count(), symbol.demangled_name());
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod database;
pub mod domain;
pub mod symbols;

pub use aggregation::{Sample, SampleAggregator};
pub use database::SampleDatabase;
pub use symbols::{Symbol, SymbolResolver, SymbolTable};
