//! Background invariant monitor
//!
//! One long-lived OS thread that blocks on the shared condvar and emits
//! exactly one callback per invariant flip, in order. It never polls:
//! the command path wakes it directly. A dedicated thread (rather than a
//! tokio task) because the wait is a blocking condvar wait.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::state::SharedState;

/// Spawn the monitor thread. `on_change` runs outside the shared lock,
/// once per transition, with the new invariant value. The thread exits
/// after `SharedState::shutdown_monitor` once the queue is drained.
pub fn spawn_monitor(
    state: Arc<SharedState>,
    mut on_change: impl FnMut(bool) + Send + 'static,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while let Some(majority) = state.next_transition() {
            on_change(majority);
        }
        tracing::debug!("invariant monitor stopped");
    })
}
