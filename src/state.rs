//! Shared server state: the single critical section
//!
//! The graph and the invariant value live behind one mutex; every
//! mutation and every SCC computation runs for its full duration under
//! that lock, so graph observation and graph mutation are mutually
//! exclusive and linearizable. The lock is a sync `parking_lot::Mutex`
//! and is never held across an `.await` or a network call.
//!
//! Invariant flips are queued, not flagged: the command path pushes each
//! transition and signals the condvar while still holding the lock, and
//! the monitor pops one entry per wake after rechecking the queue under
//! the lock. Two rapid flips therefore produce two notifications, where
//! a single dirty bool would merge them.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::graph::Graph;
use crate::invariant::majority_exists;
use crate::scc::compute_sccs;

/// Everything guarded by the one shared lock.
struct Core {
    graph: Graph,
    majority: bool,
    pending: VecDeque<bool>,
    shutdown: bool,
}

/// Handle to the shared critical section. Clone via `Arc`.
pub struct SharedState {
    core: Mutex<Core>,
    monitor_wake: Condvar,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            core: Mutex::new(Core {
                graph: Graph::new(0),
                majority: false,
                pending: VecDeque::new(),
                shutdown: false,
            }),
            monitor_wake: Condvar::new(),
        }
    }

    /// Run `f` with exclusive access to the graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        let mut core = self.core.lock();
        f(&mut core.graph)
    }

    /// Compute the SCC partition and refresh the invariant, all under the
    /// lock. On a flip the new value is queued for the monitor and the
    /// condvar is signalled before the lock is released.
    pub fn compute_sccs(&self) -> Vec<Vec<usize>> {
        let mut core = self.core.lock();
        let partition = compute_sccs(&core.graph);
        let majority = majority_exists(&partition, core.graph.vertex_count());
        if majority != core.majority {
            core.majority = majority;
            core.pending.push_back(majority);
            tracing::debug!(majority, "majority-SCC invariant flipped");
            self.monitor_wake.notify_one();
        }
        partition
    }

    /// Current invariant value (test and logging use).
    pub fn majority(&self) -> bool {
        self.core.lock().majority
    }

    /// Block until an unconsumed invariant transition exists, then pop
    /// it. Returns `None` once `shutdown_monitor` was called and the
    /// queue is drained.
    pub fn next_transition(&self) -> Option<bool> {
        let mut core = self.core.lock();
        loop {
            if let Some(value) = core.pending.pop_front() {
                return Some(value);
            }
            if core.shutdown {
                return None;
            }
            // Recheck after every wake; the condvar alone proves nothing.
            self.monitor_wake.wait(&mut core);
        }
    }

    /// Tell the monitor to finish draining and exit.
    pub fn shutdown_monitor(&self) {
        let mut core = self.core.lock();
        core.shutdown = true;
        self.monitor_wake.notify_all();
    }
}
