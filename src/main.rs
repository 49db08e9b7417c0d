use anyhow::Result;
use forge::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
