//! Storage layer for punchclock.
//!
//! This module provides SQLite-based persistence for:
//! - Users, keyed by their messaging identity
//! - Time entries

mod database;
mod migrations;

pub use database::Database;
