use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::trigger::OverlapPolicy;

pub const DB_FILE_NAME: &str = "posts.sqlite";

/// Runtime settings resolved from the command line and environment.
#[derive(Clone, Debug)]
pub struct Context {
    pub source_url: Url,
    pub interval: Duration,
    pub fetch_timeout: Duration,
    pub overlap: OverlapPolicy,
    pub data_dir: PathBuf,
    pub reset: bool,
    pub log_file: Option<String>,
    pub api_listen: SocketAddr,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self {
            source_url: cli.source_url.clone(),
            interval: Duration::from_secs(cli.interval_secs),
            fetch_timeout: Duration::from_secs(cli.timeout_secs),
            overlap: cli.overlap,
            data_dir: PathBuf::from(&cli.data_dir),
            reset: cli.reset,
            log_file: cli.log_file.clone(),
            api_listen: cli.api_listen,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn from_cli_converts_units_and_paths() {
        let cli = crate::cli::Cli::try_parse_from([
            "postsync",
            "--interval-secs",
            "15",
            "--timeout-secs",
            "4",
            "--data-dir",
            "/tmp/ps",
        ])
        .unwrap();
        let ctx = Context::from_cli(&cli);
        assert_eq!(ctx.interval, Duration::from_secs(15));
        assert_eq!(ctx.fetch_timeout, Duration::from_secs(4));
        assert_eq!(ctx.db_path(), PathBuf::from("/tmp/ps/posts.sqlite"));
    }
}
