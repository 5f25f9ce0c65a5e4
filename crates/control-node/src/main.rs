//! Control Node - Main Entry Point

use anyhow::Context;
use control_node::{init_logging, menu, ControlConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Control Node v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config = ControlConfig::load()?;

    let sim_port = std::env::args()
        .nth(1)
        .context("usage: control-node <simulation-port>")?;
    config.sim_port = sim_port
        .parse()
        .with_context(|| format!("invalid simulation port {:?}", sim_port))?;

    menu::configure(&mut config)?;

    control_node::run(config).await
}
