//! Address-level aggregation of sample database entries
//!
//! This module contains the fold that turns raw `(address, count)` entries
//! into one [`Sample`] per distinct raw address, filing resolved samples under
//! their [`Symbol`](crate::symbols::Symbol) as it goes.

pub mod aggregator;
pub mod sample;

pub use aggregator::SampleAggregator;
pub use sample::Sample;
