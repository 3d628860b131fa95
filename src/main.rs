use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Kanban board client with optimistic drag-and-drop moves")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to board.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use an in-process task service seeded with demo cards
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the board and print every column
    Show,
    /// Drag a card onto a column and drop it
    Move {
        /// Card id
        card: String,
        /// Target column id
        column: String,
        /// Drop above this card instead of at the end of the column
        #[arg(long)]
        before: Option<String>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default board.toml
    Init,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "taskboard=debug" } else { "taskboard=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A second init (e.g. from an embedding test harness) is harmless.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose, cli.json);

    let config_path = cmd::resolve_config_path(cli.config.as_deref())?;

    match &cli.command {
        Commands::Show => cmd::cmd_show(&config_path, cli.offline).await?,
        Commands::Move {
            card,
            column,
            before,
        } => cmd::cmd_move(&config_path, cli.offline, card, column, before.as_deref()).await?,
        Commands::Config { command } => cmd::cmd_config(&config_path, command.clone())?,
    }

    Ok(())
}
