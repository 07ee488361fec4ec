use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use petri::config::Config;
use petri::game::{self, Simulation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("petri v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(Path::new("config.toml"));
    let mut sim = Simulation::new(config);
    sim.init();

    let sim = Arc::new(RwLock::new(sim));
    game::run(sim).await;

    Ok(())
}
