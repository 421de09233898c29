use std::path::PathBuf;

use ::tracing::error;
use clap::Parser;

mod admin_client;
mod auth;
mod cluster;
mod commands;
mod config;
mod tracing;
use tracing::setup_logging;
#[cfg(test)]
mod testing;

use config::AdminToolConfig;

#[derive(Parser)]
#[command(name = "streamvault-admin", version, about = "Operator tooling for StreamVault segment store clusters", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "config file", help = "Path to config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() {
    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => match AdminToolConfig::from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error loading config: {err:#}");
                std::process::exit(1);
            }
        },
        None => AdminToolConfig::default(),
    };

    setup_logging();

    // The runtime is sized from the thread-pool configuration record rather
    // than the tokio defaults, so clusters can bound the tool's footprint.
    let runtime = match config.thread_pool.build_runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error building runtime: {err:#}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(cli.command.run(&config)) {
        error!("command failed: {err:#}");
        std::process::exit(1);
    }
}
