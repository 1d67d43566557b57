use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    plugflash::cli::run().await
}
