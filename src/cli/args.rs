use clap::Parser;
use std::env;

use crate::cli::command::Command;
use crate::trigger::OverlapPolicy;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Keep a local SQLite copy of a remote JSON posts collection in sync",
    long_about = "Periodically fetches a JSON array of posts over HTTP and inserts the ones not yet stored locally, never overwriting existing rows. Serves the stored posts and sync progress over a small REST API.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        env = "POSTSYNC_SOURCE_URL",
        default_value = "https://jsonplaceholder.typicode.com/posts",
        value_name = "URL",
        help = "Remote JSON array of posts to sync from"
    )]
    pub source_url: url::Url,

    #[arg(
        short = 'i',
        long,
        env = "POSTSYNC_INTERVAL_SECS",
        default_value_t = crate::trigger::DEFAULT_SYNC_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "SECS",
        help = "Seconds between periodic sync cycles"
    )]
    pub interval_secs: u64,

    #[arg(
        long,
        default_value_t = crate::fetcher::DEFAULT_FETCH_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "SECS",
        help = "HTTP request timeout for one fetch"
    )]
    pub timeout_secs: u64,

    #[arg(
        long,
        value_enum,
        default_value_t = OverlapPolicy::Skip,
        help = "What to do when a sync is triggered while another is still running"
    )]
    pub overlap: OverlapPolicy,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        default_value = ".postsync/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "log-file",
        env = "POSTSYNC_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "POSTSYNC_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8084",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}
