//! The per-slot scanning loop: lease a proxy, dial one target through it,
//! record the outcome, return the proxy, repeat until the target feed
//! closes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use crate::manager::ManagerHandle;
use crate::socks5::connect_via_socks5;
use crate::types::{ScanResult, Target};

/// Bounds the single dial attempt per target (SOCKS5 negotiation plus
/// the CONNECT itself). A timeout is reported the same as any other
/// dial failure: `Closed`. The spec calls for one dial per target, not
/// a retry loop against fresh leases.
const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// A target feed shared by the whole worker pool. Each worker locks it
/// only for the instant it takes to pop the next target, so contention
/// is negligible next to the seconds-scale SOCKS5 round trip that follows.
pub type SharedTargetFeed = Arc<Mutex<mpsc::Receiver<Target>>>;

pub struct ScanWorker {
    id: usize,
    manager: ManagerHandle,
}

impl ScanWorker {
    pub fn new(id: usize, manager: ManagerHandle) -> Self {
        ScanWorker { id, manager }
    }

    /// Pops targets from the shared feed until it closes, emitting exactly
    /// one `ScanResult` per target into `results`. A proxy is always
    /// returned to the manager after use, whether the dial succeeded or not.
    pub async fn run(self, targets: SharedTargetFeed, results: mpsc::Sender<ScanResult>) {
        loop {
            let target = {
                let mut targets = targets.lock().await;
                targets.recv().await
            };
            let Some(target) = target else {
                break;
            };
            let result = self.probe(target).await;
            trace!(worker = self.id, %target, ?result, "probe complete");
            if results.send(result).await.is_err() {
                break;
            }
        }
    }

    async fn probe(&self, target: Target) -> ScanResult {
        let dial = target.to_string();
        let proxy = self.manager.lease().await;
        let outcome = tokio::time::timeout(DIAL_TIMEOUT, connect_via_socks5(&proxy, &dial)).await;
        // Returned unconditionally: the proxy was validated immediately
        // before this lease, so a failed target dial says nothing about
        // the proxy's own honesty.
        self.manager.return_proxy(proxy).await;

        match outcome {
            Ok(Ok(stream)) => {
                drop(stream);
                ScanResult::Open(target)
            }
            Ok(Err(_)) | Err(_) => ScanResult::Closed(target),
        }
    }
}
