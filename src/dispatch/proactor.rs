//! Proactor dispatcher: one worker task per connection
//!
//! The accept loop spawns a dedicated worker for every connection; each
//! worker blocks independently on its own socket and drives its session
//! directly. A supervisory registry maps connection ids to abort handles
//! so shutdown can forcibly terminate stuck workers.
//!
//! Forced termination is safe here: an abort only lands at an `.await`,
//! and the shared graph lock is a sync lock that is never held across
//! one, so a cancelled worker can never leave the lock held.

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio_util::codec::{FramedRead, LinesCodec};

use super::{render, MAX_LINE_LEN};
use crate::error::Result;
use crate::session::Session;
use crate::state::SharedState;

/// Maps live worker ids to their abort handles.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: DashMap<u64, AbortHandle>,
}

impl WorkerRegistry {
    fn insert(&self, id: u64, handle: AbortHandle) {
        self.workers.insert(id, handle);
    }

    fn remove(&self, id: u64) {
        self.workers.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Forcibly terminate every live worker.
    pub fn abort_all(&self) {
        for entry in self.workers.iter() {
            entry.value().abort();
        }
        self.workers.clear();
    }
}

/// Accept connections and spawn a worker per connection until `shutdown`
/// fires, then abort whatever workers are still alive.
pub async fn serve(
    listener: TcpListener,
    shared: Arc<SharedState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let registry = Arc::new(WorkerRegistry::default());
    let mut next_id: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!(workers = registry.len(), "proactor shutting down");
                registry.abort_all();
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let id = next_id;
                        next_id += 1;
                        tracing::info!(%peer, id, "proactor: new connection");
                        let worker = tokio::spawn(run_worker(
                            id,
                            stream,
                            peer,
                            Arc::clone(&shared),
                            Arc::clone(&registry),
                        ));
                        registry.insert(id, worker.abort_handle());
                    }
                    Err(e) => tracing::warn!("proactor: accept failed: {e}"),
                }
            }
        }
    }
}

/// Unregisters a worker on any exit path, panics and aborts included.
struct RegistryGuard {
    id: u64,
    registry: Arc<WorkerRegistry>,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

/// One worker: read lines, drive the session, write responses, until the
/// peer hangs up or the stream fails.
async fn run_worker(
    id: u64,
    stream: TcpStream,
    peer: SocketAddr,
    shared: Arc<SharedState>,
    registry: Arc<WorkerRegistry>,
) {
    let _guard = RegistryGuard { id, registry };
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    let mut session = Session::new(shared);

    while let Some(item) = reader.next().await {
        let line = match item {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(%peer, id, "proactor: frame error, closing: {e}");
                break;
            }
        };
        let response = render(session.handle_line(&line));
        if !response.is_empty() {
            if let Err(e) = write_half.write_all(response.as_bytes()).await {
                tracing::warn!(%peer, id, "proactor: write failed: {e}");
                break;
            }
        }
    }

    tracing::info!(%peer, id, "proactor: connection closed");
}
