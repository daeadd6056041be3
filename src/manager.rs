//! Owns the `ProxyQueue` and mediates all proxy traffic through three
//! logical channels: lease-request, lease-delivery, and return. The queue
//! is mutated from exactly one task (the loop spawned by `spawn`), so no
//! lock is needed — `tokio::select!` interleaves lease-requests,
//! returns, and the starvation-retry timer without ever sharing the
//! queue across tasks.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{info, warn};

use crate::queue::ProxyQueue;
use crate::types::{ProxyAddress, ProxyVerdict, ReferenceEndpoints};
use crate::validator::validate;

const STARVATION_POLL: Duration = Duration::from_secs(1);
const CHANNEL_CAPACITY: usize = 1024;

type LeaseReply = oneshot::Sender<ProxyAddress>;

/// Cheap, `Clone`-able entry point into a running `ProxyManager`. Passed
/// to every `ScanWorker` at construction time rather than reached through
/// a module-level global, so a test can spin up an isolated manager
/// without touching process-wide state.
#[derive(Clone)]
pub struct ManagerHandle {
    lease_tx: mpsc::Sender<LeaseReply>,
    return_tx: mpsc::Sender<ProxyAddress>,
}

impl ManagerHandle {
    /// Sends a lease-request and awaits the single lease-delivery it
    /// produces. Blocks indefinitely if the pool never yields a proxy —
    /// per spec this is correct: the Manager's "waiting…" notices are the
    /// operator-visible starvation signal, not an error for the worker
    /// to recover from.
    pub async fn lease(&self) -> ProxyAddress {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.lease_tx.send(reply_tx).await.is_err() {
            std::future::pending::<()>().await;
        }
        reply_rx
            .await
            .expect("manager always delivers exactly one proxy per request")
    }

    /// Surrenders a proxy back to the pool, re-enqueued at the tail.
    pub async fn return_proxy(&self, proxy: ProxyAddress) {
        let _ = self.return_tx.send(proxy).await;
    }
}

pub struct ProxyManager {
    queue: ProxyQueue,
    lease_rx: mpsc::Receiver<LeaseReply>,
    return_rx: mpsc::Receiver<ProxyAddress>,
    lease_tx: mpsc::Sender<LeaseReply>,
    return_tx: mpsc::Sender<ProxyAddress>,
}

impl ProxyManager {
    pub fn new(candidates: Vec<ProxyAddress>) -> (Self, ManagerHandle) {
        let (lease_tx, lease_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (return_tx, return_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = ManagerHandle {
            lease_tx: lease_tx.clone(),
            return_tx: return_tx.clone(),
        };
        let manager = ProxyManager {
            queue: ProxyQueue::from_candidates(candidates),
            lease_rx,
            return_rx,
            lease_tx,
            return_tx,
        };
        (manager, handle)
    }

    /// Runs the serve + return-drain loop until `shutdown` fires. The
    /// Coordinator signals `shutdown` only after every worker has exited,
    /// so no worker is ever left awaiting a lease-delivery that will
    /// never arrive.
    pub fn spawn(mut self, refs: ReferenceEndpoints, mut shutdown: oneshot::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut pending: VecDeque<LeaseReply> = VecDeque::new();
            let mut retry = interval(STARVATION_POLL);
            retry.tick().await; // first tick is immediate; consume it

            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("proxy manager received shutdown signal");
                        break;
                    }
                    maybe_reply = self.lease_rx.recv() => {
                        match maybe_reply {
                            Some(reply) => pending.push_back(reply),
                            None => break,
                        }
                    }
                    maybe_returned = self.return_rx.recv() => {
                        match maybe_returned {
                            Some(proxy) => self.queue.push_back(proxy),
                            None => break,
                        }
                    }
                    _ = retry.tick() => {
                        if !pending.is_empty() && self.queue.is_empty() {
                            warn!("no proxies available, waiting…");
                        }
                    }
                }

                while !pending.is_empty() {
                    let Some(proxy) = self.queue.pop_front() else {
                        break;
                    };
                    let reply = pending.pop_front().expect("just checked non-empty");
                    let refs = refs.clone();
                    let lease_tx = self.lease_tx.clone();
                    let return_tx = self.return_tx.clone();
                    tokio::spawn(run_validation(proxy, refs, reply, lease_tx, return_tx));
                }
            }

            info!("proxy manager shut down, {} proxies remained queued", self.queue.len());
        })
    }
}

/// Validates a freshly-popped proxy.
///
/// On `Good`: the proxy is re-enqueued immediately (it is now on lease to
/// the waiting worker *and* available for the next lease-request — a
/// proxy can legitimately appear twice in the queue this way) and
/// delivered via `reply`.
///
/// On `Bad`: the proxy is discarded, never re-enqueued, and the
/// lease-request is re-issued on the original worker's behalf so the
/// worker still receives exactly one delivery.
async fn run_validation(
    proxy: ProxyAddress,
    refs: ReferenceEndpoints,
    reply: LeaseReply,
    lease_tx: mpsc::Sender<LeaseReply>,
    return_tx: mpsc::Sender<ProxyAddress>,
) {
    match validate(&proxy, &refs).await {
        ProxyVerdict::Good(p) => {
            let _ = return_tx.send(p.clone()).await;
            let _ = reply.send(p);
        }
        ProxyVerdict::Bad(_) => {
            let _ = lease_tx.send(reply).await;
        }
    }
}
