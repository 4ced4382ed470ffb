//! Reactor dispatcher: one task, readiness-multiplexed
//!
//! The async analogue of a select()-loop server: a single task owns the
//! listener and every live connection, waits for any of them to become
//! ready, and services every source that was ready at the wake before
//! looping back. All session processing is serialized through this
//! one task, so a slow handler (or a stalled write) holds its turn and
//! starves the other sessions. The shared graph lock is uncontended here
//! but stays in place for interface uniformity with the proactor and for
//! the monitor thread.

use std::collections::BTreeMap;
use std::future::poll_fn;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;

use futures_util::Stream;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use super::{render, MAX_LINE_LEN};
use crate::error::Result;
use crate::session::Session;
use crate::state::SharedState;

struct Conn {
    reader: FramedRead<OwnedReadHalf, LinesCodec>,
    writer: OwnedWriteHalf,
    session: Session,
    peer: SocketAddr,
}

enum Wake {
    Accepted(std::io::Result<(TcpStream, SocketAddr)>),
    Line(u64, Option<std::result::Result<String, LinesCodecError>>),
}

/// Run the reactor until `shutdown` fires. Live connections are dropped
/// on the way out.
pub async fn serve(
    listener: TcpListener,
    shared: Arc<SharedState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut conns: BTreeMap<u64, Conn> = BTreeMap::new();
    let mut next_token: u64 = 0;

    loop {
        let batch = tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!(sessions = conns.len(), "reactor shutting down");
                return Ok(());
            }
            batch = next_ready(&listener, &mut conns) => batch,
        };

        // Service every source that was ready at the wake before going
        // back to the wait, so one busy session cannot starve the rest.
        for wake in batch {
            match wake {
                Wake::Accepted(Ok((stream, peer))) => {
                    let token = next_token;
                    next_token += 1;
                    let (read_half, write_half) = stream.into_split();
                    conns.insert(
                        token,
                        Conn {
                            reader: FramedRead::new(
                                read_half,
                                LinesCodec::new_with_max_length(MAX_LINE_LEN),
                            ),
                            writer: write_half,
                            session: Session::new(Arc::clone(&shared)),
                            peer,
                        },
                    );
                    tracing::info!(%peer, token, "reactor: new connection");
                }
                Wake::Accepted(Err(e)) => {
                    tracing::warn!("reactor: accept failed: {e}");
                }
                Wake::Line(token, Some(Ok(line))) => {
                    // The full read-and-respond cycle runs on this task;
                    // the write is the loop's only other suspension point.
                    let Some(conn) = conns.get_mut(&token) else {
                        continue;
                    };
                    let response = render(conn.session.handle_line(&line));
                    if !response.is_empty() {
                        if let Err(e) = conn.writer.write_all(response.as_bytes()).await {
                            tracing::warn!(peer = %conn.peer, "reactor: write failed: {e}");
                            drop_conn(&mut conns, token);
                        }
                    }
                }
                Wake::Line(token, Some(Err(e))) => {
                    tracing::warn!(token, "reactor: frame error, closing: {e}");
                    drop_conn(&mut conns, token);
                }
                Wake::Line(token, None) => {
                    drop_conn(&mut conns, token);
                }
            }
        }
    }
}

/// Wait until the listener or any connection's reader is ready and
/// return everything that is: pending accepts plus at most one decoded
/// line per ready connection, in token order. The whole batch gets
/// serviced before the next wait, the way a select()-loop walks the
/// entire fd set after each return.
async fn next_ready(listener: &TcpListener, conns: &mut BTreeMap<u64, Conn>) -> Vec<Wake> {
    poll_fn(|cx| {
        let mut batch = Vec::new();
        loop {
            match listener.poll_accept(cx) {
                Poll::Ready(Ok(accepted)) => batch.push(Wake::Accepted(Ok(accepted))),
                Poll::Ready(Err(e)) => {
                    batch.push(Wake::Accepted(Err(e)));
                    break;
                }
                Poll::Pending => break,
            }
        }
        for (&token, conn) in conns.iter_mut() {
            if let Poll::Ready(item) = Pin::new(&mut conn.reader).poll_next(cx) {
                batch.push(Wake::Line(token, item));
            }
        }
        if batch.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(batch)
        }
    })
    .await
}

fn drop_conn(conns: &mut BTreeMap<u64, Conn>, token: u64) {
    if let Some(conn) = conns.remove(&token) {
        tracing::info!(peer = %conn.peer, token, "reactor: connection closed");
    }
}
