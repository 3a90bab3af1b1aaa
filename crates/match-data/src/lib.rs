//! Dataset layer for the Dota 2 match collector.
//!
//! Responsible for loading and merging persisted match arrays, filtering and
//! aggregating match records, and composing the statistics report.

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod reader;

pub use match_core as core;
