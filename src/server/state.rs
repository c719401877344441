//! Shared server-run state: the shutdown signal and the live-connection
//! registry. Both are created once per server run and handed to every
//! connection at accept time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Process-wide "stopped" indicator, set exactly once during shutdown.
///
/// Every connection reads it before deciding keep-alive, so responses
/// written during drain steer clients toward closing their sockets.
#[derive(Default)]
pub struct Signal {
    stopped: AtomicBool,
}

impl Signal {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

struct Slot {
    /// True while a request is being read on the connection
    busy: AtomicBool,
    close: Notify,
}

/// Set of live connections, keyed by a monotonically increasing id.
///
/// Inserted into on accept and removed from on teardown; the server loop
/// enumerates it during shutdown to close idle connections and to poll for
/// the drain to finish.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    connections: Mutex<HashMap<u64, Arc<Slot>>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a live connection. Dropping the returned guard removes it
    /// again, so removal is reachable from every abort path.
    pub fn register(&self) -> ConnectionGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            busy: AtomicBool::new(false),
            close: Notify::new(),
        });
        self.inner
            .connections
            .lock()
            .unwrap()
            .insert(id, slot.clone());
        ConnectionGuard {
            registry: self.clone(),
            id,
            slot,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.connections.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Asks every connection with no request in flight to close.
    ///
    /// Busy connections are left alone; they finish their current cycle
    /// (with keep-alive forced off by the signal) or hit their timeout.
    /// Returns the number of connections notified.
    pub fn close_idle(&self) -> usize {
        let connections = self.inner.connections.lock().unwrap();
        let mut notified = 0;
        for slot in connections.values() {
            if !slot.busy.load(Ordering::Relaxed) {
                slot.close.notify_one();
                notified += 1;
            }
        }
        notified
    }
}

/// Registry membership handle held by a connection for its lifetime.
pub struct ConnectionGuard {
    registry: Registry,
    id: u64,
    slot: Arc<Slot>,
}

impl ConnectionGuard {
    /// Marks whether a request is currently being read. Idle connections
    /// are the ones the drain protocol closes immediately.
    pub fn set_busy(&self, busy: bool) {
        self.slot.busy.store(busy, Ordering::Relaxed);
    }

    /// Resolves once the drain protocol asks this connection to close.
    pub async fn closed(&self) {
        self.slot.close.notified().await;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry
            .inner
            .connections
            .lock()
            .unwrap()
            .remove(&self.id);
    }
}
