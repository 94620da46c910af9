use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cb", about = "commitboard: a discussion board stored as versioned documents", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Load the global index, repairing it if needed, and print a summary
    Index(StoreArgs),
    /// Show or change the stored retention config
    Config(ConfigArgs),
    /// Run one retention sweep now
    Retention(RetentionArgs),
    /// List posts
    Posts(PostsArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    /// Data directory of the filesystem backend
    #[arg(long, default_value = "./data")]
    pub root: PathBuf,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// New retention period in days
    #[arg(long)]
    pub retention_days: Option<u32>,
    /// Admin name recorded for the change
    #[arg(long, default_value = "admin")]
    pub admin: String,
}

#[derive(Args)]
pub struct RetentionArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Use this many days instead of the stored config
    #[arg(long)]
    pub days: Option<u32>,
    #[arg(long, default_value_t = cb_retention::DEFAULT_BATCH_SIZE)]
    pub batch: usize,
}

#[derive(Args)]
pub struct PostsArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(long, conflicts_with = "user")]
    pub community: Option<String>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long, default_value = "new")]
    pub sort: String,
    #[arg(short = 'n', long, default_value_t = cb_repo::DEFAULT_LIMIT)]
    pub limit: usize,
}
