//! The conversation layer.
//!
//! Messages arrive through a transport, are queued per user by the
//! [`Dispatcher`], interpreted by the [`EventRouter`] against the state kept
//! in the [`SessionDirectory`], and answered with a [`Reply`].

pub mod directory;
pub mod dispatcher;
pub mod reply;
pub mod router;
pub mod tokens;
pub mod transport;

pub use directory::{SessionDirectory, UserSlot};
pub use dispatcher::Dispatcher;
pub use reply::{InboundEvent, Reply};
pub use router::{classify, EventRouter, Route};
pub use transport::{parse_line, ConsoleSink, ReplySink};
