#[tokio::main]
async fn main() -> anyhow::Result<()> {
    postsync::app::run().await
}
