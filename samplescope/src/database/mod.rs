//! # Sample Database Access
//!
//! A sample database is the file a profiling daemon writes per sampled image
//! and event: a fixed header followed by an on-disk hash table mapping
//! virtual addresses to hit counts (layout in [`samplescope_common`]).
//!
//! ## Lifecycle
//!
//! ```text
//! SampleDatabase::new(path)      handle absent
//!        │
//!        ▼  query (samples / has_samples / count)
//!      open()  ── failure ──▶ warn!, handle stays absent, query sees 0 entries
//!        │
//!        ▼
//!   entries()  one pass over every occupied slot, storage order
//!        │
//!        ▼
//!     close()  handle absent again
//! ```
//!
//! Every query reopens and recloses the file, so no handle outlives the
//! query that needed it. The handle is either fully open (bytes loaded,
//! header decoded, `is_kernel` known) or absent.
//!
//! Slot order is whatever the writer's hash table produced. Callers that need
//! a stable order must sort.

pub mod sample_database;

pub use sample_database::{Entries, SampleDatabase};
