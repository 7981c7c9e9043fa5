//! Ctrl-C handling.
//!
//! Once tokio installs a SIGINT handler the default "terminate the process"
//! behavior is gone for good, so every press has to be observed somewhere.
//! A background task counts presses into a watch channel: the reply retriever
//! awaits [`Interrupt::triggered`] while it is fetching pages, and the sampling
//! driver checks [`Interrupt::take_pending`] between lines.

use log::{debug, error};
use tokio::sync::watch;

/// Receiving side of the Ctrl-C counter.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<u64>,
}

impl Interrupt {
    /// Spawns the Ctrl-C listener task on the current runtime.
    pub fn listen() -> Self {
        let (tx, interrupt) = Self::channel();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                debug!("Ctrl-C received");
                tx.send_modify(|presses| *presses += 1);
            }
        });
        interrupt
    }

    /// Builds an interrupt driven by the returned sender instead of a signal.
    ///
    /// Each `send_modify(|n| *n += 1)` on the sender counts as one press.
    pub fn channel() -> (watch::Sender<u64>, Self) {
        let (tx, rx) = watch::channel(0);
        (tx, Self { rx })
    }

    /// Resolves on the next press. Never resolves once the sender is gone.
    pub async fn triggered(&mut self) {
        if self.rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Returns `true` (and marks it seen) if a press arrived that nobody awaited.
    pub fn take_pending(&mut self) -> bool {
        match self.rx.has_changed() {
            Ok(true) => {
                let _ = self.rx.borrow_and_update();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn pending_press_is_reported_once() {
        let (tx, mut interrupt) = Interrupt::channel();
        assert!(!interrupt.take_pending());

        tx.send_modify(|n| *n += 1);
        assert!(interrupt.take_pending());
        assert!(!interrupt.take_pending());
    }

    #[tokio::test]
    async fn triggered_consumes_the_press() {
        let (tx, mut interrupt) = Interrupt::channel();
        tx.send_modify(|n| *n += 1);

        tokio::time::timeout(Duration::from_secs(1), interrupt.triggered())
            .await
            .expect("press should resolve triggered()");
        assert!(!interrupt.take_pending());
    }

    #[tokio::test]
    async fn dropped_sender_never_triggers() {
        let (tx, mut interrupt) = Interrupt::channel();
        drop(tx);

        let waited =
            tokio::time::timeout(Duration::from_millis(20), interrupt.triggered()).await;
        assert!(waited.is_err());
        assert!(!interrupt.take_pending());
    }
}
