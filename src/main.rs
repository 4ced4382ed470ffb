//! sccd daemon entry point
//!
//! Binds the listener, starts the invariant monitor thread, and runs the
//! selected dispatcher until ctrl-c.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;

use sccd::dispatch::{proactor, reactor, Strategy};
use sccd::{spawn_monitor, SharedState};

/// Concurrent SCC graph server
#[derive(Parser, Debug)]
#[command(name = "sccd")]
#[command(about = "Strongly-connected-components graph server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "9034", env = "SCCD_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "SCCD_HOST")]
    host: String,

    /// Concurrency strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Proactor)]
    mode: Strategy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sccd=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let shared = Arc::new(SharedState::new());
    let monitor = spawn_monitor(Arc::clone(&shared), |majority| {
        if majority {
            tracing::info!("a majority SCC appeared: one component now holds more than half of the vertices");
        } else {
            tracing::info!("the majority SCC dissolved: no component holds more than half of the vertices");
        }
    });

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        mode = %args.mode,
        "sccd listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = match args.mode {
        Strategy::Reactor => tokio::spawn(reactor::serve(listener, Arc::clone(&shared), shutdown_rx)),
        Strategy::Proactor => {
            tokio::spawn(proactor::serve(listener, Arc::clone(&shared), shutdown_rx))
        }
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("ctrl-c received, shutting down");
    shutdown_tx.send(true)?;
    dispatcher.await??;

    shared.shutdown_monitor();
    if monitor.join().is_err() {
        tracing::warn!("monitor thread panicked during shutdown");
    }
    Ok(())
}
