use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chesshook_core::{SessionId, TransportError};
use dashmap::DashMap;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::outbound::Outbound;

/// Registry-visible half of a session: what the broadcaster needs to reach it.
pub struct SessionEntry {
    pub id: SessionId,
    pub peer: SocketAddr,
    outbound: Arc<dyn Outbound>,
    subscribed: AtomicBool,
    closed: CancellationToken,
}

impl SessionEntry {
    fn new(peer: SocketAddr, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            id: SessionId::new(),
            peer,
            outbound,
            subscribed: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    /// Returns false if already subscribed.
    pub fn subscribe(&self) -> bool {
        self.subscribed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns false if not subscribed.
    pub fn unsubscribe(&self) -> bool {
        self.subscribed
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub async fn send(&self, line: &str) -> Result<(), TransportError> {
        self.outbound.send_line(line).await
    }

    /// Ask the owning connection task to shut the session down.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }

    pub(crate) async fn shutdown_transport(&self) {
        self.outbound.close().await;
    }
}

/// All live sessions, keyed by id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer: SocketAddr, outbound: Arc<dyn Outbound>) -> Arc<SessionEntry> {
        let entry = Arc::new(SessionEntry::new(peer, outbound));
        self.sessions.insert(entry.id.clone(), Arc::clone(&entry));
        entry
    }

    pub fn unregister(&self, id: &SessionId) -> Option<Arc<SessionEntry>> {
        self.sessions.remove(id).map(|(_, entry)| entry)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionEntry>> {
        self.sessions.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of subscribed sessions. No map guard outlives this call.
    pub fn subscribers(&self) -> Vec<Arc<SessionEntry>> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_subscribed())
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
