use anyhow::Result;
use clap::{Parser, Subcommand};
use ecsrun_core::Config;
use std::path::PathBuf;

mod commands;
mod dispatch;
mod logging;

use logging::LogLevel;

#[derive(Parser)]
#[command(name = "ecsrun")]
#[command(about = "Run one-off ECS tasks and stream their logs", long_about = None)]
struct Cli {
    /// Config file (defaults to ./ecsrun.yaml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (overrides ECSRUN_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register (or pick) a task definition, run it and wait
    Run(commands::run::RunArgs),

    /// Show or initialize the config file
    Config {
        /// Print the config file path only
        #[arg(long)]
        path: bool,

        /// Write a sample config
        #[arg(long)]
        init: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level)?;

    match cli.command {
        Commands::Run(args) => {
            let config = load_config(cli.config.as_ref())?;
            commands::run::run(&config, &args).await?;
        }
        Commands::Config { path, init } => {
            commands::config::run(cli.config.as_deref(), path, init)?;
        }
    }

    Ok(())
}
