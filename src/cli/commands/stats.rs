//! Statistics command implementation.

use crate::cli::args::StatsArgs;
use crate::core::{Clock, PersistenceGateway, SystemClock};
use crate::error::PunchError;
use crate::features::tracking::{PeriodReport, StatsPeriod};
use crate::output::format_report;

use super::Context;

/// Print per-project totals for the period containing today.
///
/// # Errors
///
/// Returns an error if the database cannot be read or output formatting fails.
pub async fn stats(ctx: &Context, args: &StatsArgs) -> Result<String, PunchError> {
    let gateway = ctx.open_gateway()?;
    let period = StatsPeriod::from(args.period);
    let report = period_report(gateway.as_ref(), &SystemClock, &args.user, period).await?;
    format_report(&report, ctx.format)
}

/// Build the report for `period` as seen from `clock`'s today.
///
/// # Errors
///
/// Returns `PunchError::Persist` if the query fails.
pub async fn period_report(
    gateway: &dyn PersistenceGateway,
    clock: &dyn Clock,
    user: &str,
    period: StatsPeriod,
) -> Result<PeriodReport, PunchError> {
    let range = period.range_for(clock.today());
    let totals = gateway.query_by_period(user, range).await?;
    Ok(PeriodReport::from_totals(period, range, &totals))
}
