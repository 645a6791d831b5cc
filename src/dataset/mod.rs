//! Dataset loading.
//!
//! This module turns CSV files into in-memory [`crate::models::Dataset`]s.

pub mod loader;

pub use loader::{load_csv, load_csv_auto_detect};
