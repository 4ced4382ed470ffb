//! sccd: a concurrent strongly-connected-components graph server
//!
//! The server owns one mutable directed graph, answers SCC queries over
//! a line-oriented TCP protocol (Kosaraju's two-pass algorithm), and
//! tracks a derived invariant: whether any component holds a strict
//! majority of the vertices. A background monitor is woken exactly once
//! per flip.
//!
//! # Architecture
//!
//! ```text
//! client bytes ──► dispatcher (reactor | proactor)
//!                      │ complete lines
//!                      ▼
//!                  Session state machine ──► response lines
//!                      │ commands, under one lock
//!                      ▼
//!              SharedState { Graph, majority, transition queue }
//!                      │ condvar signal per flip
//!                      ▼
//!                  monitor thread ──► notification callback
//! ```
//!
//! The two dispatchers are interchangeable: the reactor multiplexes
//! every socket's readiness in a single task, the proactor dedicates a
//! worker task per connection. Both drive the same [`session::Session`],
//! so protocol behavior is identical either way.

pub mod dispatch;
pub mod error;
pub mod graph;
pub mod invariant;
pub mod monitor;
pub mod protocol;
pub mod scc;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use dispatch::Strategy;
pub use error::{Result, SccdError};
pub use graph::Graph;
pub use invariant::majority_exists;
pub use monitor::spawn_monitor;
pub use scc::compute_sccs;
pub use session::Session;
pub use state::SharedState;
