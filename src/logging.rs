//! Diagnostic logging.
//!
//! Events go to stderr so they never mix with replies on stdout. The filter
//! comes from `RUST_LOG`, then the config file, then `info`; `--verbose`
//! turns on debug events for this crate.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::PunchError;

const DEFAULT_FILTER: &str = "info";

/// Build the filter without installing it.
///
/// # Errors
///
/// Returns `PunchError::Config` if the configured directive is invalid.
pub fn filter(configured: Option<&str>, verbose: bool) -> Result<EnvFilter, PunchError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER))
            .map_err(|e| PunchError::Config(format!("Invalid logging filter: {e}")))?,
    };

    if verbose {
        let directive = "punchclock=debug"
            .parse()
            .map_err(|e| PunchError::Config(format!("Invalid logging filter: {e}")))?;
        return Ok(filter.add_directive(directive));
    }
    Ok(filter)
}

/// Install the global subscriber. A second call is a no-op.
///
/// # Errors
///
/// Returns `PunchError::Config` if the configured directive is invalid.
pub fn init(configured: Option<&str>, verbose: bool) -> Result<(), PunchError> {
    let filter = filter(configured, verbose)?;

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = filter(Some("punchclock=warn"), false).unwrap();
        assert_eq!(filter.to_string(), "punchclock=warn");
    }

    #[test]
    fn test_verbose_adds_debug() {
        let filter = filter(None, true).unwrap();
        assert!(filter.to_string().contains("punchclock=debug"));
    }

    #[test]
    fn test_invalid_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            filter(Some("[[["), false),
            Err(PunchError::Config(_))
        ));
    }
}
