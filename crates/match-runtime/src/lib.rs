//! Collector runtime for dota-matches.
//!
//! Talks to the match-details endpoint, paces requests, and streams valid
//! matches into the on-disk dataset.

pub mod backoff;
pub mod client;
pub mod collector;
pub mod writer;

pub use match_core as core;
pub use match_data as data;
