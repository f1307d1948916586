//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mcpchat_core::client::Backend;
use mcpchat_core::config::Config;

mod commands;

#[derive(Parser)]
#[command(name = "mcpchat")]
#[command(version)]
#[command(about = "Chat client for an MCP-backed assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a config file (default: ~/.config/mcpchat/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Send a message and stream the assistant's reply
    Chat {
        /// The message to send
        message: String,

        /// Session to continue (a new one is created if omitted)
        #[arg(long, value_name = "ID")]
        session: Option<String>,

        /// Print the rendered HTML fragment instead of streaming text
        #[arg(long)]
        html: bool,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Record thumbs-up/down feedback on an assistant message
    Feedback {
        #[arg(value_name = "SESSION_ID")]
        session: String,
        #[arg(value_name = "MESSAGE_ID")]
        message: String,

        /// Thumbs up
        #[arg(long, conflicts_with = "down", required_unless_present = "down")]
        up: bool,

        /// Thumbs down
        #[arg(long)]
        down: bool,
    },

    /// List the tools the MCP server exposes
    Tools,

    /// Backend and MCP server health
    Health,

    /// Show the signed-in user
    Whoami,

    /// Render markdown from a file (or stdin) to an HTML fragment
    Render {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// List sessions, most recent first
    List,
    /// Create a session
    New {
        /// Session name
        #[arg(default_value = "New Chat")]
        name: String,
    },
    /// Show a session's messages
    Show {
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
    /// Rename a session
    Rename {
        #[arg(value_name = "SESSION_ID")]
        id: String,
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete a session
    Delete {
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
    /// Remove all messages from a session
    Clear {
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(dispatch(cli))
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("MCPCHAT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("mcpchat=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Render is offline; don't touch config or the network for it.
    if let Commands::Render { file } = &cli.command {
        return commands::render::run(file.as_deref());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path).context("load config")?,
        None => Config::load().context("load config")?,
    };
    let backend = Backend::new(config).context("build backend client")?;

    match cli.command {
        Commands::Chat {
            message,
            session,
            html,
        } => commands::chat::run(&backend, session.as_deref(), &message, html).await,
        Commands::Sessions { command } => match command {
            SessionCommands::List => commands::sessions::list(&backend).await,
            SessionCommands::New { name } => commands::sessions::new(&backend, &name).await,
            SessionCommands::Show { id } => commands::sessions::show(&backend, &id).await,
            SessionCommands::Rename { id, name } => {
                commands::sessions::rename(&backend, &id, &name).await
            }
            SessionCommands::Delete { id } => commands::sessions::delete(&backend, &id).await,
            SessionCommands::Clear { id } => commands::sessions::clear(&backend, &id).await,
        },
        Commands::Feedback {
            session,
            message,
            up,
            down: _,
        } => commands::feedback::run(&backend, &session, &message, up).await,
        Commands::Tools => commands::info::tools(&backend).await,
        Commands::Health => commands::info::health(&backend).await,
        Commands::Whoami => commands::info::whoami(&backend).await,
        Commands::Render { .. } => unreachable!("handled above"),
    }
}
