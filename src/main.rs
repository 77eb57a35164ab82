use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod mirror;
mod record;
mod remote;
mod sync;

use commands::{ConfigCommand, PullCommand, PushCommand, StatusCommand, SyncCommandError};
use config::Config;

#[derive(Parser)]
#[command(name = "levelsync")]
#[command(version)]
#[command(
    about = "Mirror a remote level collection to disk and back",
    long_about = None
)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the local mirror with the remote collection
    Pull(PullCommand),

    /// Replace the remote collection with the local mirror
    Push(PushCommand),

    /// Show local and remote state
    Status(StatusCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(&e));
        }
    };

    init_tracing(cli.verbose);

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Pull(cmd)) => cmd.run(&config).await?,
        Some(Commands::Push(cmd)) => cmd.run(&config).await?,
        Some(Commands::Status(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays limited to status lines.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "levelsync=debug"
    } else {
        "levelsync=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Help and version output succeed; any other parse failure is a usage error.
fn usage_exit_code(error: &clap::Error) -> i32 {
    if error.exit_code() == 0 {
        0
    } else {
        1
    }
}

/// 0 is reserved for success; sync failures carry their own codes.
fn exit_code(error: &(dyn std::error::Error + 'static)) -> i32 {
    error
        .downcast_ref::<SyncCommandError>()
        .map_or(1, SyncCommandError::exit_code)
}
