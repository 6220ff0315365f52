//! Batch-wide cancellation signal

use tokio::sync::watch;

/// Fires the paired [`Shutdown`] handles
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // Receivers may all be gone already
        let _ = self.tx.send(true);
    }
}

/// Cloneable handle that resolves once shutdown has been requested.
///
/// If the trigger is dropped without firing, [`Shutdown::wait`] never
/// resolves.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A handle that fires on Ctrl-C. Must be called inside a tokio runtime.
    pub fn on_ctrl_c() -> Shutdown {
        let (trigger, shutdown) = Shutdown::new();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling remaining hosts");
                trigger.trigger();
            }
        });
        shutdown
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn wait(mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
