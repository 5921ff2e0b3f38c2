//! External interrupt signal.
//!
//! The binary triggers it from Ctrl-C; tests trigger it directly. It is a
//! level, not an edge: once triggered, every later wait completes at once.

use std::future::Future;

use tokio::sync::watch;

/// Create a connected interrupt handle and receiver.
pub fn interrupt_channel() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx }, Interrupt { rx })
}

/// Triggering side of the interrupt.
#[derive(Debug)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    /// Fire the interrupt.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving side of the interrupt.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Wait until the interrupt fires.
    ///
    /// Never completes if the handle is dropped without triggering. Cancel
    /// safe.
    pub async fn fired(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Whether the interrupt has fired.
    pub fn is_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Drive `fut` unless the interrupt fires first.
    ///
    /// Returns `None` if interrupted, dropping `fut` unfinished. An interrupt
    /// that has already fired wins even over a future that is ready.
    pub async fn guard<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;

            () = self.fired() => None,
            output = fut => Some(output),
        }
    }
}
