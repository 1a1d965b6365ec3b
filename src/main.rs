use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gemchat::run().await
}
