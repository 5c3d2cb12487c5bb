//! Shutdown signalling between the facade, the event loop and in-flight
//! commands.

use tokio::sync::watch;

/// Create a linked trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

/// Owning side. Dropping it also cancels every signal.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    /// Request shutdown.
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Observing side, cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// True once shutdown was requested or the trigger dropped.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow() || self.0.has_changed().is_err()
    }

    /// Resolves when shutdown is requested or the trigger is dropped.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        // Err means the trigger is gone, which counts as shutdown.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let (trigger, signal) = shutdown_channel();
        assert!(!signal.is_cancelled());

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.cancelled().await })
        };
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(signal.is_cancelled());
        // Already-cancelled signals resolve immediately
        signal.cancelled().await;
    }

    #[tokio::test]
    async fn test_dropped_trigger_cancels() {
        let (trigger, signal) = shutdown_channel();
        drop(trigger);
        assert!(signal.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .unwrap();
    }

    #[test]
    fn test_pending_until_triggered() {
        let (trigger, signal) = shutdown_channel();
        let mut cancelled = tokio_test::task::spawn(signal.cancelled());
        tokio_test::assert_pending!(cancelled.poll());

        trigger.trigger();
        assert!(cancelled.is_woken());
        tokio_test::assert_ready!(cancelled.poll());
    }
}
