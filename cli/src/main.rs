use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::{FeedbackClient, SortField};
use shared::types::{ClientConfig, FeedbackType, Status};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "feedback")]
#[command(version, about = "Feedback board client")]
pub struct Cli {
    /// Client configuration file
    #[arg(short, long, global = true, default_value = "feedback.toml")]
    pub config: PathBuf,

    /// Print raw JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        username: String,
        /// Read from FEEDBACK_PASSWORD or prompted when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the persisted session
    Logout,
    /// Show the signed-in principal
    Whoami,
    /// Create an account
    Register {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Board management
    Boards {
        #[command(subcommand)]
        command: Option<BoardCommands>,
    },
    /// Show a board as status columns
    Kanban {
        /// Defaults to the first listed board
        #[arg(short, long)]
        board: Option<i64>,
        /// Keep running and redraw whenever the board changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Move an item to another column (admins only)
    Move {
        item: i64,
        to: Status,
        /// Position in the destination column; defaults to the end
        #[arg(long)]
        index: Option<usize>,
        #[arg(short, long)]
        board: Option<i64>,
    },
    /// Toggle your upvote on an item
    Upvote {
        item: i64,
        #[arg(short, long)]
        board: Option<i64>,
    },
    /// Paged, filtered and sorted list of feedback
    Table(TableArgs),
    /// Submit a new feedback item
    Submit {
        #[arg(short, long)]
        board: i64,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short = 't', long = "type", default_value = "feature")]
        feedback_type: FeedbackType,
        /// Tag names; missing tags are created
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Comments on an item
    Comments {
        item: i64,
        /// Post a comment instead of listing
        #[arg(long)]
        add: Option<String>,
    },
    /// List tags, or create one
    Tags {
        #[arg(long)]
        create: Option<String>,
    },
    /// Counts per status and type for a board
    Summary {
        #[arg(short, long)]
        board: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum BoardCommands {
    List,
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
    },
    AddMember {
        board: i64,
        username: String,
    },
    Delete {
        board: i64,
    },
}

#[derive(clap::Args)]
pub struct TableArgs {
    #[arg(long)]
    pub status: Option<Status>,
    #[arg(long = "type")]
    pub feedback_type: Option<FeedbackType>,
    #[arg(long)]
    pub board: Option<i64>,
    #[arg(long)]
    pub tag: Option<i64>,
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
    #[arg(long)]
    pub desc: bool,
    /// 1-based
    #[arg(long, default_value = "1")]
    pub page: u32,
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    CreatedAt,
    Upvotes,
    Title,
    Status,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::CreatedAt => SortField::CreatedAt,
            SortArg::Upvotes => SortField::Upvotes,
            SortArg::Title => SortField::Title,
            SortArg::Status => SortField::Status,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli.config)?;
    debug!("API root: {}", config.api.resolved_base_url());

    let client = FeedbackClient::from_config(config);
    if let Some(claims) = client.hydrate() {
        info!("Signed in as {}", claims.username);
    }

    commands::run(&client, cli.command, cli.json).await
}

/// The config file when it exists, otherwise defaults around `FEEDBACK_API_URL`.
fn resolve_config(path: &Path) -> Result<ClientConfig> {
    if path.exists() {
        return shared::config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let base_url = std::env::var("FEEDBACK_API_URL").with_context(|| {
        format!(
            "{} not found and FEEDBACK_API_URL is not set",
            path.display()
        )
    })?;
    info!("No config file, using FEEDBACK_API_URL");
    Ok(ClientConfig::with_base_url(base_url))
}
