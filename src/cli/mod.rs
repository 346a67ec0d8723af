//! Command-line interface for punchclock.

pub mod args;
pub mod commands;
