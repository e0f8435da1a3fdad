use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Run one sync cycle in the foreground",
        long_about = "Fetch the remote posts once, merge new ones into the local store, print progress, and exit. Exits non-zero if the cycle fails."
    )]
    Sync,
    #[command(
        about = "Print the posts currently stored",
        long_about = "List stored posts ordered by id, one per line, as id, user id and title."
    )]
    List {
        #[arg(long, value_name = "N", help = "Print at most N posts")]
        limit: Option<usize>,
    },
}
