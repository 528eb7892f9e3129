use std::sync::Arc;

use tokio::sync::watch;
use tracing::error;

/// Lets any request ask the server to shut down gracefully.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Shutdown {
    pub fn new() -> (Self, watch::Receiver<Option<String>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Records `reason` and wakes the receiver. Only the first reason is kept.
    pub fn signal(&self, reason: impl Into<String>) {
        let reason = reason.into();
        error!(reason = %reason, "shutdown requested");
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_reason_wins() {
        let (shutdown, mut rx) = Shutdown::new();
        assert!(!shutdown.is_triggered());

        shutdown.signal("integrity");
        shutdown.signal("later");
        rx.changed().await.unwrap();

        assert!(shutdown.is_triggered());
        assert_eq!(rx.borrow().as_deref(), Some("integrity"));
    }
}
