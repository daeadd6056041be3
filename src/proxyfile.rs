//! Candidate proxy file loading, best-effort public-list scraping, and
//! the dedup pass that keeps repeated `-d` runs from growing the file
//! without bound.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::types::ProxyAddress;

/// A small, fixed set of public SOCKS5 proxy list mirrors. Best-effort
/// only: one source going dark never blocks a run, it just shrinks the
/// candidate pool that the Validator would have filtered anyway.
const PUBLIC_LIST_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/TheSpeedX/SOCKS-List/master/socks5.txt",
    "https://raw.githubusercontent.com/monosans/proxy-list/main/proxies/socks5.txt",
];

const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Reads `path`, treating every non-empty, non-blank line as a candidate
/// `ProxyAddress`. Nothing beyond "non-empty" is validated here — a
/// malformed entry simply fails validation later.
pub fn load_candidates(path: &Path) -> Result<Vec<ProxyAddress>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read proxy file {}", path.display()))?;
    Ok(dedup(parse_lines(&contents)))
}

fn parse_lines(contents: &str) -> Vec<ProxyAddress> {
    contents
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(ProxyAddress::new)
        .collect()
}

fn dedup(candidates: Vec<ProxyAddress>) -> Vec<ProxyAddress> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Fetches each configured public list with its own short timeout.
/// A failed fetch logs a warning and contributes nothing; it is never
/// treated as fatal.
pub async fn scrape_public_lists(client: &reqwest::Client) -> Vec<ProxyAddress> {
    let mut scraped = Vec::new();
    for &url in PUBLIC_LIST_URLS {
        match fetch_one(client, url).await {
            Ok(mut proxies) => scraped.append(&mut proxies),
            Err(e) => warn!(url, error = %e, "public proxy list fetch failed, skipping"),
        }
    }
    scraped
}

async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<Vec<ProxyAddress>> {
    let body = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("GET {} returned an error status", url))?
        .text()
        .await
        .with_context(|| format!("reading body of {} failed", url))?;
    Ok(parse_lines(&body))
}

/// Appends `scraped` to the proxy file at `path`, then reloads and
/// dedups — so repeated `-d` invocations never accumulate duplicate
/// entries on disk.
pub fn append_and_dedup(path: &Path, scraped: &[ProxyAddress]) -> Result<Vec<ProxyAddress>> {
    if !scraped.is_empty() {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {} for append", path.display()))?;
        for proxy in scraped {
            writeln!(file, "{}", proxy.as_str())?;
        }
    }

    let merged = load_candidates(path)?;
    let deduped = dedup(merged.clone());
    if deduped.len() != merged.len() {
        rewrite_deduped(path, &deduped)?;
    }
    Ok(deduped)
}

fn rewrite_deduped(path: &Path, deduped: &[ProxyAddress]) -> Result<()> {
    let body = deduped
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, body + "\n")
        .with_context(|| format!("failed to rewrite deduped proxy file {}", path.display()))
}
