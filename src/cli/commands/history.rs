//! History command implementation.

use crate::cli::args::HistoryArgs;
use crate::core::PersistenceGateway;
use crate::error::PunchError;
use crate::output::format_entries;

use super::Context;

/// Print the user's most recent entries.
///
/// # Errors
///
/// Returns an error if the database cannot be read or output formatting fails.
pub async fn history(ctx: &Context, args: &HistoryArgs) -> Result<String, PunchError> {
    let gateway = ctx.open_gateway()?;
    let entries = gateway.recent_entries(&args.user, args.limit).await?;
    format_entries(&entries, &args.user, ctx.format)
}
