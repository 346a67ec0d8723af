use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::features::tracking::StatsPeriod;

#[derive(Parser)]
#[command(name = "punchclock")]
#[command(about = "A conversational per-project time tracker")]
#[command(long_about = "punchclock - track time per project by chatting with it

Pick a project, work, send \"stop\", then say what you did. Each finished
interval is saved with your comment and can be summed per day, week or month.

QUICK START:
  punchclock serve --user alice     Chat as alice on stdin/stdout
  punchclock serve                  Read \"user: text\" lines from many users
  punchclock stats --user alice     Time per project today
  punchclock history --user alice   Most recent entries

CHAT COMMANDS:
  start, stop, cancel (or \"start over\"), stats day|week|month, retry, help

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  punchclock <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output, or 'json' for
    /// machine-readable output. Defaults to `general.default_output` from
    /// the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Data directory holding config.yaml and the database
    #[arg(long, global = true, env = "PUNCHCLOCK_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the tracker on stdin/stdout
    ///
    /// Each input line is one message. Without --user, lines must look like
    /// "alice: stop" so several users can share one stream. Replies are
    /// printed as they are produced; with --output json each reply is one
    /// JSON object per line.
    ///
    /// # Examples
    ///
    ///   punchclock serve --user alice
    ///   printf 'alice: Design\nbob: Ops\n' | punchclock serve -o json
    Serve(ServeArgs),

    /// Show time per project for a period
    ///
    /// Periods are calendar-aligned on the local date: the day, the week
    /// starting Monday, or the month starting on the 1st.
    ///
    /// # Examples
    ///
    ///   punchclock stats --user alice
    ///   punchclock stats --user alice --period week -o json
    Stats(StatsArgs),

    /// Show a user's most recent entries
    ///
    /// # Examples
    ///
    ///   punchclock history --user alice --limit 5
    History(HistoryArgs),

    /// Generate shell completions
    ///
    /// # Examples
    ///
    ///   punchclock completions bash > /etc/bash_completion.d/punchclock
    ///   punchclock completions zsh > "${fpath[1]}/_punchclock"
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    /// Treat every line as a message from this user
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// User identity to report on
    #[arg(short, long)]
    pub user: String,

    /// Period to sum over
    #[arg(short, long, value_enum, default_value = "day")]
    pub period: PeriodArg,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// User identity to list entries for
    #[arg(short, long)]
    pub user: String,

    /// Maximum number of entries
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Statistics period as accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodArg {
    Day,
    Week,
    Month,
}

impl From<PeriodArg> for StatsPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Day => Self::Day,
            PeriodArg::Week => Self::Week,
            PeriodArg::Month => Self::Month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stats() {
        let cli = Cli::parse_from(["punchclock", "-o", "json", "stats", "--user", "alice", "-p", "week"]);

        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Stats(args) => {
                assert_eq!(args.user, "alice");
                assert_eq!(StatsPeriod::from(args.period), StatsPeriod::Week);
            }
            _ => panic!("expected stats"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["punchclock", "serve"]);

        assert_eq!(cli.output, None);
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Serve(ServeArgs { user: None })));
    }
}
