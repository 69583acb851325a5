use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    volumed::run().await
}
