//! Core abstractions for punchclock.
//!
//! This module provides the time source, date helpers, and the storage seam
//! shared by the conversation core and the CLI.

mod clock;
mod datetime;
mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use datetime::{format_hhmm, start_of_month, start_of_next_month, start_of_week};
#[cfg(test)]
pub use traits::MockPersistenceGateway;
pub use traits::{PersistenceGateway, UserId};
