//! Cancellation of a running checkout.

use std::sync::Arc;

use tokio::sync::watch;

/// Cancels the running checkout from anywhere, e.g. the gateway widget's
/// dismiss callback.
///
/// Cancelling takes effect at the next await point before payment proof is
/// received; once the proof is in hand the checkout runs to verification.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(false)),
        }
    }
}

impl CancelHandle {
    /// Requests cancellation of the running checkout.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true if cancellation was requested since the checkout started.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn reset(&self) {
        self.tx.send_replace(false);
    }

    /// Resolves once cancellation is requested.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
