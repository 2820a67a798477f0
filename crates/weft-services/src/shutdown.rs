//! Process shutdown signal

use tokio::sync::watch;

/// Fires once. Endpoint channels and the shell's event loop watch it.
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn trigger(&self) {
        if !*self.tx.borrow() {
            tracing::info!("Shutdown requested");
        }
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Resolves once the signal has fired.
    pub async fn wait(mut rx: watch::Receiver<bool>) {
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_observed() {
        let signal = ShutdownSignal::new();
        let rx = signal.subscribe();
        assert!(!signal.is_triggered());

        signal.trigger();
        assert!(signal.is_triggered());
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_wait_returns_after_trigger() {
        let signal = ShutdownSignal::new();
        let rx = signal.subscribe();
        let waiter = tokio::spawn(ShutdownSignal::wait(rx));

        signal.trigger();
        waiter.await.unwrap();
    }
}
