//! Tidings CLI
//!
//! Command-line interface for Tidings - notes and news headlines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tidings_core::Config;

mod commands;
mod output;

use commands::notes::Credentials;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "tidings")]
#[command(about = "Tidings - personal notes and top headlines")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List countries, optionally filtered by name
    Countries {
        /// Case-insensitive part of the country name
        query: Option<String>,
    },
    /// Show top headlines
    News {
        /// Two-letter country code (defaults to config default_country)
        #[arg(short, long, global = true)]
        country: Option<String>,

        #[command(subcommand)]
        command: Option<NewsCommands>,
    },
    /// Manage your notes
    Notes {
        #[command(flatten)]
        credentials: Credentials,

        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Create an account
    Signup {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum NewsCommands {
    /// Open an article in the browser
    Open {
        /// Article number as shown in the list
        index: usize,
    },
}

#[derive(Subcommand)]
enum NotesCommands {
    /// List notes, sorted by title
    #[command(alias = "ls")]
    List,
    /// Add a note
    Add {
        /// Note title
        title: String,
        /// Note body
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Edit a note
    Edit {
        /// Note ID (full or prefix)
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New body
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID (full or prefix)
        id: String,
    },
    /// Print the list again whenever it changes
    Watch,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (backend, news_api_key, default_country, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands must work even when the file is broken
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, &output)
            }
        };
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);
    debug!("Using {} backend", config.backend);

    match cli.command {
        Commands::Countries { query } => commands::news::countries(query, &output),
        Commands::News { country, command } => match command {
            None => commands::news::headlines(&config, country, &output).await,
            Some(NewsCommands::Open { index }) => {
                commands::news::open_article(&config, country, index, &output).await
            }
        },
        Commands::Notes {
            credentials,
            command,
        } => handle_notes_command(command, &config, &credentials, &output).await,
        Commands::Signup { credentials } => {
            commands::notes::signup(&config, &credentials, &output).await
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

async fn handle_notes_command(
    command: NotesCommands,
    config: &Config,
    credentials: &Credentials,
    output: &Output,
) -> Result<()> {
    match command {
        NotesCommands::List => commands::notes::list(config, credentials, output).await,
        NotesCommands::Add { title, content } => {
            commands::notes::add(config, credentials, title, content, output).await
        }
        NotesCommands::Edit { id, title, content } => {
            commands::notes::edit(config, credentials, id, title, content, output).await
        }
        NotesCommands::Delete { id } => {
            commands::notes::delete(config, credentials, id, output).await
        }
        NotesCommands::Watch => commands::notes::watch(config, credentials, output).await,
    }
}

/// Initialize logging to stderr
///
/// RUST_LOG wins; otherwise the configured level applies to our crates.
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tidings_core={},tidings_cli={}",
            config.log_level, config.log_level
        ))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
