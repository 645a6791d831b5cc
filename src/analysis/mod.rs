//! Analysis modules.
//!
//! The aggregator is the only piece of logic the rest of the
//! application depends on; everything else just feeds or renders it.

pub mod aggregator;
pub mod error;

pub use aggregator::*;
pub use error::AggregateError;
