//! Offline index build: embed every node of the local graph and upsert the
//! records into the configured vector index.

use biograph::{qa, AppState, BioGraphConfig, DEFAULT_CONFIG_PATH};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env().add_directive("biograph=info".parse()?),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = BioGraphConfig::load(&config_path)?;
    let state = AppState::new(config);

    let indexed = qa::build_node_index(&state).await?;
    println!("Indexed {indexed} nodes");
    Ok(())
}
