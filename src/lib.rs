//! punchclock - a conversational per-project time tracker
//!
//! Users chat with the tracker to pick a project, run a timer, stop it and
//! describe what they did. Each finished interval is stored in `SQLite` and
//! can be summed per day, week or month.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod logging;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::PunchError;
