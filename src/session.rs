//! Per-connection protocol state machine
//!
//! A session owns no graph state: it parses lines, applies commands to
//! the shared state, and returns response lines. It is synchronous and
//! free of I/O so both dispatchers drive it identically.
//!
//! `NEWGRAPH n m` enters a sub-protocol that stages `n` and the incoming
//! edges locally and commits the whole graph under the lock only after
//! the m-th valid edge line. Replacement is therefore atomic (a partial
//! graph is never observable) and the lock is never held while the
//! dispatcher waits on the network. A malformed or out-of-range edge
//! line is answered with `Invalid edge.` and does not count toward `m`,
//! so the stream never desynchronizes.

use std::sync::Arc;

use crate::protocol::{format_partition, parse_edge_line, responses, Command};
use crate::state::SharedState;

enum SessionState {
    AwaitingCommand,
    ReadingEdges {
        n: usize,
        remaining: usize,
        staged: Vec<(usize, usize)>,
    },
}

pub struct Session {
    shared: Arc<SharedState>,
    state: SessionState,
}

impl Session {
    pub fn new(shared: Arc<SharedState>) -> Self {
        Self {
            shared,
            state: SessionState::AwaitingCommand,
        }
    }

    /// Process one input line, returning the response lines to write.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        match self.state {
            SessionState::AwaitingCommand => self.handle_command(line),
            SessionState::ReadingEdges { .. } => self.handle_edge_line(line),
        }
    }

    fn handle_command(&mut self, line: &str) -> Vec<String> {
        let Ok(command) = Command::parse(line) else {
            return vec![responses::INVALID_COMMAND.to_string()];
        };
        match command {
            Command::NewGraph { n, m } => {
                if m == 0 {
                    // Nothing to read: commit immediately.
                    self.shared.with_graph(|g| g.reset(n));
                    vec![
                        responses::SEND_EDGES.to_string(),
                        responses::GRAPH_CREATED.to_string(),
                    ]
                } else {
                    // `m` is client-controlled (parse bounds it, but do
                    // not pre-allocate from it either way)
                    self.state = SessionState::ReadingEdges {
                        n,
                        remaining: m,
                        staged: Vec::new(),
                    };
                    vec![responses::SEND_EDGES.to_string()]
                }
            }
            Command::NewEdge { u, v } => {
                let added = self
                    .shared
                    .with_graph(|g| g.add_edge(u.wrapping_sub(1), v.wrapping_sub(1)));
                match added {
                    Ok(()) => vec![responses::EDGE_ADDED.to_string()],
                    Err(_) => vec![responses::INVALID_VERTEX.to_string()],
                }
            }
            Command::RemoveEdge { u, v } => {
                let removed = self
                    .shared
                    .with_graph(|g| g.remove_edge(u.wrapping_sub(1), v.wrapping_sub(1)));
                match removed {
                    Ok(()) => vec![responses::EDGE_REMOVED.to_string()],
                    Err(_) => vec![responses::INVALID_VERTEX.to_string()],
                }
            }
            Command::Kosaraju => {
                let partition = self.shared.compute_sccs();
                if partition.is_empty() {
                    // Zero-vertex graph: no components, but stay audible.
                    vec![String::new()]
                } else {
                    format_partition(&partition)
                }
            }
        }
    }

    fn handle_edge_line(&mut self, line: &str) -> Vec<String> {
        let SessionState::ReadingEdges {
            n,
            ref mut remaining,
            ref mut staged,
        } = self.state
        else {
            unreachable!("handle_edge_line outside the edge sub-protocol");
        };
        match parse_edge_line(line) {
            Ok((u, v)) if (1..=n).contains(&u) && (1..=n).contains(&v) => {
                staged.push((u - 1, v - 1));
                *remaining -= 1;
                if *remaining == 0 {
                    let staged = std::mem::take(staged);
                    self.shared.with_graph(|g| {
                        g.reset(n);
                        for (u, v) in staged {
                            // Staged endpoints were validated against n.
                            let _ = g.add_edge(u, v);
                        }
                    });
                    self.state = SessionState::AwaitingCommand;
                    vec![responses::GRAPH_CREATED.to_string()]
                } else {
                    Vec::new()
                }
            }
            // Skip-and-retry: the line does not count toward m.
            _ => vec![responses::INVALID_EDGE.to_string()],
        }
    }
}
