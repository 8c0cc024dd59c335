//! Dials a cluster using a connect string, pacing retries with the provider.
//!
//! ```text
//! RUST_LOG=debug cargo run --example connect_loop -- "zk1:2181,zk2:2181,zk3:2181"
//! ```

use std::time::Duration;

use hostprovider::{ConnectString, StaticHostProvider};
use tokio::{net::TcpStream, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Pause once every server has been tried without success.
const SPIN_DELAY: Duration = Duration::from_secs(1);

/// Per-attempt dial timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let connect_string = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:2181".to_owned());
    let servers = ConnectString::parse(&connect_string)?;

    let shutdown = CancellationToken::new();
    let provider = StaticHostProvider::builder()
        .endpoints(servers.endpoints().to_vec())
        .cancellation(shutdown.clone())
        .build()
        .await?;
    tracing::info!(servers = provider.size(), chroot = ?servers.chroot(), "Resolved cluster");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    for attempt in 1..=provider.size() * 3 {
        let target = provider.next(SPIN_DELAY).await;
        if provider.is_cancelled() {
            tracing::info!(attempt, "Shutting down");
            return Ok(());
        }
        match timeout(CONNECT_TIMEOUT, TcpStream::connect(target.socket_addr())).await {
            Ok(Ok(_stream)) => {
                provider.on_connected();
                tracing::info!(%target, attempt, "Connected");
                return Ok(());
            },
            Ok(Err(error)) => tracing::warn!(%target, attempt, %error, "Connection failed"),
            Err(_) => tracing::warn!(%target, attempt, "Connection timed out"),
        }
    }

    tracing::error!("Gave up after three passes over the cluster");
    Ok(())
}
