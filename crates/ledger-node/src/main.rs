mod config;
mod constants;
mod logging;
mod peer_client;
mod routes;
mod state;

use anyhow::Result;
use clap::Parser;
use config::{Args, NodeConfig};
use state::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_format, &args.log_level);

    let config = NodeConfig::from_args(&args)?;
    let listen = config.listen;
    info!(
        owner = %config.owner,
        node_id = %config.node_id,
        beneficiary = %config.beneficiary,
        "starting ledger node"
    );

    let state = AppState::new(config)?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("ledger-node listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("ledger-node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
