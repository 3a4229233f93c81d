use std::path::PathBuf;

use anyhow::Result;
use autoreply_application::AppBootstrap;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "autoreply")]
#[command(about = "Manage auto-reply texts and resolve replies for incoming messages", long_about = None)]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new current reply (text or server URL)
    Set {
        /// Reply text, 1 to 500 characters
        text: String,
    },
    /// Print the current reply
    Current,
    /// Print the reply history, oldest first
    History,
    /// Show whether replies are answered locally or by a server
    Mode,
    /// Resolve the reply for an incoming message
    Resolve {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        message: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let app = AppBootstrap::initialize(cli.config)?;

    match cli.command {
        Commands::Set { text } => commands::reply::set(&app.service, &text)?,
        Commands::Current => commands::reply::current(&app.service),
        Commands::History => commands::reply::history(&app.service),
        Commands::Mode => commands::reply::mode(&app.service),
        Commands::Resolve { sender, message } => {
            commands::resolve::run(&app.service, &sender, &message).await?
        }
    }

    Ok(())
}
