//! Navigation epochs. Work started for one view resolves to `Cancelled` once
//! the user has navigated elsewhere.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct NavigationEpoch {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for NavigationEpoch {
    fn default() -> Self { Self::new() }
}

impl NavigationEpoch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0u64);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> u64 { *self.tx.borrow() }

    /// Invalidate every outstanding scope and return the new epoch.
    pub fn advance(&self) -> u64 {
        self.tx.send_modify(|e| *e += 1);
        self.current()
    }

    /// Scope bound to the current epoch.
    pub fn scope(&self) -> ViewScope {
        let rx = self.tx.subscribe();
        let epoch = *rx.borrow();
        ViewScope { epoch, rx }
    }
}

#[derive(Debug, Clone)]
pub struct ViewScope {
    epoch: u64,
    rx: watch::Receiver<u64>,
}

impl ViewScope {
    pub fn epoch(&self) -> u64 { self.epoch }

    pub fn is_current(&self) -> bool { *self.rx.borrow() == self.epoch }

    /// Run `fut` on behalf of this view. Resolves to `Cancelled` if the epoch
    /// moves before or while it runs, even when `fut` itself finished.
    pub async fn run<F, T>(&self, fut: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        if !self.is_current() {
            return Err(ClientError::Cancelled);
        }
        let mut rx = self.rx.clone();
        let epoch = self.epoch;
        let moved_on = async move {
            loop {
                if rx.changed().await.is_err() {
                    // sender gone: nothing can move the epoch any more
                    std::future::pending::<()>().await;
                }
                if *rx.borrow() != epoch {
                    return;
                }
            }
        };
        tokio::select! {
            biased;
            r = fut => {
                if self.is_current() { r } else { Err(ClientError::Cancelled) }
            }
            _ = moved_on => Err(ClientError::Cancelled),
        }
    }
}
