//! Shared domain layer for the Dota 2 match collector.
//!
//! Holds the match record model, the error taxonomy, CLI settings and the
//! small pure calculations and lookup tables used by both the collector and
//! the analyzer crates.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod game_modes;
pub mod heroes;
pub mod models;
pub mod settings;
