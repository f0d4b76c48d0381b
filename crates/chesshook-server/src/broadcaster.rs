use std::sync::Arc;

use tokio::sync::mpsc;

use crate::registry::SessionRegistry;

/// Fans engine output out to every subscribed session.
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Write one line to every current subscriber. A failed write drops only
    /// that session from the registry and signals it to close.
    ///
    /// Returns the number of sessions the line reached.
    pub async fn deliver(&self, line: &str) -> usize {
        let mut delivered = 0;
        for entry in self.registry.subscribers() {
            match entry.send(line).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(session_id = %entry.id, error = %e, "Broadcast write failed");
                    self.registry.unregister(&entry.id);
                    entry.close();
                }
            }
        }
        delivered
    }

    /// Spawn the broadcast loop. Ends when the engine output channel closes.
    pub fn start(self, mut rx: mpsc::UnboundedReceiver<String>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let delivered = self.deliver(&line).await;
                tracing::trace!(delivered = delivered, "Broadcast engine output");
            }
            tracing::info!("Engine output channel closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::testing::ChannelOutbound;
    use std::net::SocketAddr;
    use std::time::Duration;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn delivers_only_to_subscribers() {
        let registry = Arc::new(SessionRegistry::new());
        let (out1, mut rx1) = ChannelOutbound::new();
        let (out2, mut rx2) = ChannelOutbound::new();
        let (out3, mut rx3) = ChannelOutbound::new();
        registry.register(peer(), Arc::new(out1)).subscribe();
        registry.register(peer(), Arc::new(out2)).subscribe();
        registry.register(peer(), Arc::new(out3));

        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        assert_eq!(broadcaster.deliver("bestmove e2e4").await, 2);

        assert_eq!(rx1.try_recv().unwrap(), "bestmove e2e4");
        assert_eq!(rx2.try_recv().unwrap(), "bestmove e2e4");
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_subscriber_is_dropped_without_affecting_others() {
        let registry = Arc::new(SessionRegistry::new());
        let (dead_out, dead_rx) = ChannelOutbound::new();
        let (live_out, mut live_rx) = ChannelOutbound::new();
        let dead = registry.register(peer(), Arc::new(dead_out));
        let live = registry.register(peer(), Arc::new(live_out));
        dead.subscribe();
        live.subscribe();
        drop(dead_rx);

        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        assert_eq!(broadcaster.deliver("info depth 5").await, 1);
        assert_eq!(live_rx.try_recv().unwrap(), "info depth 5");

        assert!(dead.is_closed());
        assert!(registry.get(&dead.id).is_none());
        assert!(registry.get(&live.id).is_some());
        assert!(!live.is_closed());
    }

    #[tokio::test]
    async fn loop_preserves_engine_order() {
        let registry = Arc::new(SessionRegistry::new());
        let (out, mut rx) = ChannelOutbound::new();
        registry.register(peer(), Arc::new(out)).subscribe();

        let (tx, engine_rx) = mpsc::unbounded_channel();
        let handle = Broadcaster::new(Arc::clone(&registry)).start(engine_rx);

        for depth in 1..=5 {
            tx.send(format!("info depth {depth}")).unwrap();
        }
        tx.send("bestmove d2d4".to_string()).unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        for depth in 1..=5 {
            assert_eq!(rx.recv().await.unwrap(), format!("info depth {depth}"));
        }
        assert_eq!(rx.recv().await.unwrap(), "bestmove d2d4");
    }
}
