//! Signal Node - Main Entry Point

use signal_node::{init_logging, menu, SignalConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Signal Node v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config = SignalConfig::load()?;
    menu::configure(&mut config)?;

    signal_node::run(config).await
}
