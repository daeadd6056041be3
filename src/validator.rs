//! Stateless two-probe liveness check of a single proxy against the
//! operator's reference endpoints. Never panics; always returns a verdict.

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::socks5::connect_via_socks5;
use crate::types::{ProxyAddress, ProxyVerdict, ReferenceEndpoints};

const VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Check A: the proxy must reach the known-open reference. Check B: the
/// proxy must NOT reach the known-closed reference (a proxy that "reaches"
/// a port the operator knows to be closed is tampering with responses).
pub async fn validate(proxy: &ProxyAddress, refs: &ReferenceEndpoints) -> ProxyVerdict {
    match timeout(
        VALIDATION_TIMEOUT,
        connect_via_socks5(proxy, refs.known_open.as_str()),
    )
    .await
    {
        Ok(Ok(stream)) => drop(stream),
        Ok(Err(e)) => {
            debug!(proxy = %proxy, error = %e, "check A (known-open) failed");
            return ProxyVerdict::Bad(proxy.clone());
        }
        Err(_) => {
            debug!(proxy = %proxy, "check A (known-open) timed out");
            return ProxyVerdict::Bad(proxy.clone());
        }
    }

    match timeout(
        VALIDATION_TIMEOUT,
        connect_via_socks5(proxy, refs.known_closed.as_str()),
    )
    .await
    {
        Ok(Ok(stream)) => {
            drop(stream);
            debug!(proxy = %proxy, "check B (known-closed) succeeded — honeypot/tampering proxy");
            ProxyVerdict::Bad(proxy.clone())
        }
        Ok(Err(e)) => {
            debug!(proxy = %proxy, error = %e, "check B (known-closed) failed as expected");
            ProxyVerdict::Good(proxy.clone())
        }
        Err(_) => {
            debug!(proxy = %proxy, "check B (known-closed) timed out as expected");
            ProxyVerdict::Good(proxy.clone())
        }
    }
}
