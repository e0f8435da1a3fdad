use crate::app::App;
use crate::cli::Command;

pub mod list;
pub mod sync;

impl Command {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        match self {
            Command::Sync => sync::run(app).await,
            Command::List { limit } => list::run(app, *limit),
        }
    }
}
