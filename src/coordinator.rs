//! Top-level orchestration: fan a target list out across a fixed pool of
//! `ScanWorker`s sharing one `ProxyManager`, collect results as they
//! arrive, and shut everything down in an order that never strands a
//! worker mid-lease.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::info;

use crate::manager::ProxyManager;
use crate::types::{ProxyAddress, ReferenceEndpoints, RunSummary, ScanResult, Target};
use crate::worker::ScanWorker;

/// Worker pool size also sets the target-feed channel's buffer depth, so
/// the feed never backs up behind a worker that is mid-lease.
const WORKER_POOL_SIZE: usize = 100;

pub struct ScanCoordinator {
    candidates: Vec<ProxyAddress>,
    refs: ReferenceEndpoints,
}

impl ScanCoordinator {
    pub fn new(candidates: Vec<ProxyAddress>, refs: ReferenceEndpoints) -> Self {
        ScanCoordinator { candidates, refs }
    }

    pub async fn run(self, targets: Vec<Target>) -> RunSummary {
        let total_targets = targets.len();
        info!(
            targets = total_targets,
            proxies = self.candidates.len(),
            "starting scan"
        );

        let (manager, handle) = ProxyManager::new(self.candidates);
        let (manager_shutdown_tx, manager_shutdown_rx) = oneshot::channel();
        let manager_join = manager.spawn(self.refs, manager_shutdown_rx);

        let (target_tx, target_rx) = mpsc::channel::<Target>(WORKER_POOL_SIZE);
        let (result_tx, mut result_rx) = mpsc::channel::<ScanResult>(WORKER_POOL_SIZE);

        let target_rx = Arc::new(Mutex::new(target_rx));
        let mut worker_joins = Vec::with_capacity(WORKER_POOL_SIZE);
        for id in 0..WORKER_POOL_SIZE {
            let worker = ScanWorker::new(id, handle.clone());
            let results = result_tx.clone();
            let target_rx = target_rx.clone();
            worker_joins.push(tokio::spawn(worker.run(target_rx, results)));
        }
        drop(result_tx);

        let feeder = tokio::spawn(async move {
            for target in targets {
                if target_tx.send(target).await.is_err() {
                    break;
                }
            }
        });

        let progress = ProgressBar::new(total_targets as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} targets scanned")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut summary = RunSummary::default();
        while summary.total() < total_targets {
            let Some(result) = result_rx.recv().await else {
                break;
            };
            if let ScanResult::Open(target) = result {
                progress.println(format!("Open {}", target));
            }
            summary.record(result);
            progress.inc(1);
        }
        progress.finish_and_clear();

        let _ = feeder.await;
        for join in worker_joins {
            let _ = join.await;
        }
        let _ = manager_shutdown_tx.send(());
        let _ = manager_join.await;

        info!(open = summary.open(), closed = summary.closed, "scan complete");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_relaying_socks5() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((sock, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(handle_relaying_client(sock));
            }
        });
        addr
    }

    async fn handle_relaying_client(mut sock: tokio::net::TcpStream) {
        let mut greeting = [0u8; 3];
        if sock.read_exact(&mut greeting).await.is_err() {
            return;
        }
        let _ = sock.write_all(&[0x05, 0x00]).await;
        let mut head = [0u8; 4];
        if sock.read_exact(&mut head).await.is_err() {
            return;
        }
        if head[3] != 0x01 {
            return;
        }
        let mut rest = [0u8; 6];
        if sock.read_exact(&mut rest).await.is_err() {
            return;
        }
        let ip = Ipv4Addr::new(rest[0], rest[1], rest[2], rest[3]);
        let port = u16::from_be_bytes([rest[4], rest[5]]);
        let dest = format!("{}:{}", ip, port);
        let rep = match tokio::net::TcpStream::connect(&dest).await {
            Ok(_) => 0x00,
            Err(_) => 0x05,
        };
        let _ = sock
            .write_all(&[0x05, rep, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
            .await;
    }

    async fn bind_and_close() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    fn ipv4_target(addr: std::net::SocketAddr) -> Target {
        let std::net::IpAddr::V4(ip) = addr.ip() else {
            unreachable!()
        };
        Target::new(ip, addr.port())
    }

    #[tokio::test]
    async fn coordinator_drains_every_target_exactly_once() {
        let good_proxy = spawn_relaying_socks5().await;
        let known_open = spawn_relaying_socks5().await;
        let known_closed = bind_and_close().await;
        let open_target = spawn_relaying_socks5().await;
        let closed_target = bind_and_close().await;

        let refs = ReferenceEndpoints {
            known_open: ProxyAddress::new(known_open.to_string()),
            known_closed: ProxyAddress::new(known_closed.to_string()),
        };
        let coordinator =
            ScanCoordinator::new(vec![ProxyAddress::new(good_proxy.to_string())], refs);

        let targets = vec![ipv4_target(open_target), ipv4_target(closed_target)];
        let summary = coordinator.run(targets).await;

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.open(), 1);
        assert_eq!(summary.closed, 1);
        assert_eq!(summary.opened, vec![ipv4_target(open_target)]);
    }

    /// Spec §8 scenario 3: one proxy that cannot even reach the
    /// known-open reference (bad) alongside one that passes both checks
    /// (good). The bad candidate must never affect the outcome — the
    /// coordinator should still finish both targets correctly.
    #[tokio::test]
    async fn coordinator_tolerates_a_bad_proxy_among_good_ones() {
        let good_proxy = spawn_relaying_socks5().await;
        let known_open = spawn_relaying_socks5().await;
        let known_closed = bind_and_close().await;
        let open_target = spawn_relaying_socks5().await;
        let closed_target = bind_and_close().await;

        let refs = ReferenceEndpoints {
            known_open: ProxyAddress::new(known_open.to_string()),
            known_closed: ProxyAddress::new(known_closed.to_string()),
        };
        let candidates = vec![
            ProxyAddress::new("127.0.0.1:1".to_string()), // nothing listens here: Bad
            ProxyAddress::new(good_proxy.to_string()),
        ];
        let coordinator = ScanCoordinator::new(candidates, refs);

        let targets = vec![ipv4_target(open_target), ipv4_target(closed_target)];
        let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run(targets))
            .await
            .expect("scan should finish even with a bad candidate present");

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.open(), 1);
        assert_eq!(summary.closed, 1);
        assert_eq!(summary.opened, vec![ipv4_target(open_target)]);
    }
}
