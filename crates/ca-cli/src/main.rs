//! ca-admin - certificate authority administration

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ca_cli::run().await
}
