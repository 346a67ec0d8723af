//! Serve command implementation.
//!
//! Runs the conversation over stdin/stdout until input ends.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::bot::{parse_line, ConsoleSink, Dispatcher, EventRouter, ReplySink, SessionDirectory};
use crate::cli::args::ServeArgs;
use crate::core::{Clock, SystemClock};
use crate::error::PunchError;

use super::Context;

/// Chat on stdin/stdout.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or stdout fails.
pub async fn serve(ctx: &Context, args: &ServeArgs) -> Result<String, PunchError> {
    let gateway = ctx.open_gateway()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let directory = Arc::new(SessionDirectory::new(
        Arc::clone(&clock),
        ctx.config.session.idle_timeout(),
    ));
    let router = Arc::new(EventRouter::new(directory, gateway, clock));

    let input = BufReader::new(tokio::io::stdin());
    let mut sink = ConsoleSink::new(tokio::io::stdout(), ctx.format);

    info!(user = args.user.as_deref().unwrap_or("*"), "listening on stdin");
    let delivered = run_console(
        input,
        &mut sink,
        router,
        args.user.as_deref(),
        ctx.config.session.reap_interval(),
    )
    .await?;
    info!(replies = delivered, "input closed");

    Ok(String::new())
}

/// Feed `input` lines through the dispatcher and deliver every reply.
///
/// Returns once input is exhausted and every queued event has been answered.
///
/// # Errors
///
/// Returns an error if reading input or delivering a reply fails.
pub async fn run_console<R, S>(
    input: R,
    sink: &mut S,
    router: Arc<EventRouter>,
    fixed_user: Option<&str>,
    reap_interval: Duration,
) -> Result<usize, PunchError>
where
    R: AsyncBufRead + Unpin,
    S: ReplySink,
{
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(Arc::clone(&router), reply_tx);
    let mut lines = input.lines();
    let mut delivered = 0;

    let mut reaper = tokio::time::interval(reap_interval);
    reaper.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    reaper.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => match parse_line(&line, fixed_user) {
                    Ok(Some(event)) => dispatcher.submit(event),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "skipping input line"),
                },
                None => break,
            },
            Some(reply) = reply_rx.recv() => {
                sink.deliver(&reply).await?;
                delivered += 1;
            }
            _ = reaper.tick() => {
                let evicted = router.directory().reap_idle();
                if !evicted.is_empty() {
                    debug!(users = ?evicted, "dropping idle queues");
                }
                dispatcher.forget(&evicted);
            }
        }
    }

    dispatcher.shutdown().await;
    while let Some(reply) = reply_rx.recv().await {
        sink.deliver(&reply).await?;
        delivered += 1;
    }

    Ok(delivered)
}
