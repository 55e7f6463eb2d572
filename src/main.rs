use anyhow::Result;
use clap::Parser;
use linear_fast::cli::{self, Cli, Commands};
use linear_fast::config::EnvConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).with_writer(std::io::stderr).with_ansi(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = EnvConfig::load();
    let validation = config.validate();
    if !validation.is_valid() {
        eprintln!("{}", validation.report());
        std::process::exit(1);
    }
    if !validation.warnings.is_empty() {
        tracing::warn!("{}", validation.report());
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Call { tool, args } => cli::run_call(&config, tool, args).await?,
        Commands::RefreshCache => cli::run_refresh_cache(&config).await?,
        Commands::Health => cli::run_health(&config).await?,
    }
    Ok(())
}
