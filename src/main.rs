use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use punchclock::cli::args::{Cli, Commands};
use punchclock::cli::commands::{self, Context};
use punchclock::config::{Config, Paths};
use punchclock::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        print!("{}", commands::completions(shell)?);
        return Ok(());
    }

    let paths = match cli.root {
        Some(root) => Paths::with_root(root),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;
    logging::init(config.logging.filter.as_deref(), cli.verbose)?;

    let format = cli.output.unwrap_or(config.general.default_output);
    let ctx = Context::new(paths, config, format);

    let output = match cli.command {
        Commands::Serve(args) => commands::serve(&ctx, &args).await?,
        Commands::Stats(args) => commands::stats(&ctx, &args).await?,
        Commands::History(args) => commands::history(&ctx, &args).await?,
        Commands::Completions { .. } => String::new(),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
