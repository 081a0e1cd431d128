// src/storage/memory.rs
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use crate::models::server::ServerRuntimeState;

/// Runtime state for every monitored server, keyed by server name.
///
/// Entries are created lazily and never removed. Shard locks are only held
/// for the duration of a single call, never across an await point.
#[derive(Default)]
pub struct ServerStateStore {
    states: DashMap<String, ServerRuntimeState>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ServerStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> ServerRuntimeState {
        self.states
            .entry(name.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Replaces both roster and flag after a processed poll.
    pub fn update(&self, name: &str, players: Vec<String>, unreachable: bool) {
        self.states.insert(
            name.to_string(),
            ServerRuntimeState {
                last_players: players,
                unreachable,
                initialized: true,
            },
        );
    }

    /// Flags the server as unreachable and leaves the last known roster in place.
    pub fn mark_unreachable(&self, name: &str) {
        self.states
            .entry(name.to_string())
            .or_default()
            .unreachable = true;
    }

    /// Claims the poll slot for `name`. Returns `None` while an earlier poll
    /// of the same server still holds it.
    pub fn try_begin_poll(&self, name: &str) -> Option<PollGuard> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(name.to_string()) {
            return None;
        }
        Some(PollGuard {
            name: name.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

/// Releases the server's poll slot when dropped, including on panic unwind.
pub struct PollGuard {
    name: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.name);
    }
}
