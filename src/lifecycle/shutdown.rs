//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// What asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Triggered programmatically.
    Requested,
}

/// Coordinator for shutdown.
///
/// Provides a broadcast channel that the serving loop subscribes to. Subscribe
/// before anything can trigger it; a trigger with no subscriber is lost.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self, reason: ShutdownReason) {
        let _ = self.tx.send(reason);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// First shutdown reason seen on `rx`. A closed channel never resolves.
pub async fn wait_for_shutdown(rx: &mut broadcast::Receiver<ShutdownReason>) -> ShutdownReason {
    loop {
        match rx.recv().await {
            Ok(reason) => return reason,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscriber() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger(ShutdownReason::Terminate);
        assert_eq!(rx.recv().await.unwrap(), ShutdownReason::Terminate);
    }

    #[tokio::test]
    async fn test_closed_channel_never_resolves() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        drop(shutdown);

        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            wait_for_shutdown(&mut rx),
        )
        .await;
        assert!(waited.is_err());
    }
}
