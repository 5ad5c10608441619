use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use iprompt::cli::{Cli, Commands};
use iprompt::config::{self, Config};
use iprompt::{engines, translate};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load().unwrap_or_default();

    let default_level = if cli.verbose || cfg.general.verbose {
        "iprompt=debug"
    } else {
        "iprompt=warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Translate(args) => translate::run(args, &cfg).await?,
        Commands::Detect(args) => translate::detect(args)?,
        Commands::Engines(args) => engines::run(args, &cfg).await?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}
