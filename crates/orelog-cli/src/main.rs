use std::io::stdout;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use orelog_cli::commands::{history, pilots, profile, watch};
use orelog_cli::{Cli, Commands, Config, default_store_path};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = Config::load_from(cli.config.as_deref());
    tracing::debug!(?config, "loaded configuration");

    let mut out = stdout();
    match &cli.command {
        Some(Commands::Watch { all, refresh }) => {
            watch::run(&config, *all, *refresh, &default_store_path(), &mut out).await?;
        }
        Some(Commands::History {
            days,
            daily,
            pivot,
            json,
        }) => {
            let view = if *daily {
                history::View::Daily
            } else if *pivot {
                history::View::Pivot
            } else {
                history::View::Summary
            };
            history::run(&config, *days, view, *json, &mut out).await?;
        }
        Some(Commands::Pilots { json }) => {
            pilots::run(&config, *json, &mut out)?;
        }
        Some(Commands::Profile { action }) => {
            profile::run(action, &default_store_path(), &mut out)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
