//! Feature implementations for punchclock.
//!
//! - Time tracking: sessions, projects, time entries, period statistics

pub mod tracking;
