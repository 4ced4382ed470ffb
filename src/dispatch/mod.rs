//! Concurrency dispatchers
//!
//! Two interchangeable strategies sharing one contract: accept
//! connections, feed each complete line to that connection's [`Session`],
//! and write the session's response lines back. Protocol and algorithm
//! code never learn which strategy is running; swapping them changes
//! scalability and fault isolation, not observable behavior.
//!
//! - [`reactor`]: one task multiplexes readiness over every live socket,
//!   servicing every socket that was ready at each wake. A stalled
//!   handler still holds its turn and starves the other sessions, by
//!   construction.
//! - [`proactor`]: one spawned task per connection, each blocking
//!   independently on its own socket, supervised by a registry that can
//!   forcibly terminate workers at shutdown.
//!
//! [`Session`]: crate::session::Session

pub mod proactor;
pub mod reactor;

use clap::ValueEnum;

/// Dispatcher strategy selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Single-task readiness-multiplexing event loop.
    Reactor,
    /// One worker task per connection.
    Proactor,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Reactor => write!(f, "reactor"),
            Strategy::Proactor => write!(f, "proactor"),
        }
    }
}

/// Upper bound on one wire line; longer frames fail the connection.
pub(crate) const MAX_LINE_LEN: usize = 8 * 1024;

/// Join response lines into one newline-terminated write.
pub(crate) fn render(lines: Vec<String>) -> String {
    lines
        .into_iter()
        .map(|mut line| {
            line.push('\n');
            line
        })
        .collect()
}
