//! Console transport.
//!
//! Inbound messages are text lines; replies go to any [`ReplySink`]. The
//! console sink writes them to stdout in the selected output format.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::bot::reply::{InboundEvent, Reply};
use crate::cli::args::OutputFormat;
use crate::error::PunchError;
use crate::output::format_reply;

static ADDRESSED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^:\s][^:]*?)\s*:\s?(.*)$")
        .unwrap_or_else(|e| panic!("Invalid line regex: {e}"))
});

/// Turn one input line into an event.
///
/// With `fixed_user` the whole line is the message. Otherwise the line must
/// be `user: text`. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns `PunchError::Parse` for a line without a user prefix.
pub fn parse_line(line: &str, fixed_user: Option<&str>) -> Result<Option<InboundEvent>, PunchError> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.trim().is_empty() {
        return Ok(None);
    }

    if let Some(user) = fixed_user {
        return Ok(Some(InboundEvent::new(user, line)));
    }

    let caps = ADDRESSED_LINE
        .captures(line)
        .ok_or_else(|| PunchError::Parse(format!("expected \"user: text\", got {line:?}")))?;
    let user = caps.get(1).map_or("", |m| m.as_str());
    let text = caps.get(2).map_or("", |m| m.as_str());

    Ok(Some(InboundEvent::new(user, text)))
}

/// Destination for outbound replies.
#[async_trait]
pub trait ReplySink: Send {
    async fn deliver(&mut self, reply: &Reply) -> Result<(), PunchError>;
}

/// Writes replies to an async writer, one rendered reply per write.
pub struct ConsoleSink<W> {
    writer: W,
    format: OutputFormat,
}

impl<W> ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub const fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ReplySink for ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&mut self, reply: &Reply) -> Result<(), PunchError> {
        let mut rendered = format_reply(reply, self.format)?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        self.writer.write_all(rendered.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
