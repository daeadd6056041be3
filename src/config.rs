//! Turns a parsed `Cli` into a fully validated `ScanConfig`, doing every
//! fallible expansion up front so `main` only ever deals with one
//! Configuration-fatal error site.

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::proxyfile::{append_and_dedup, load_candidates, scrape_public_lists};
use crate::target::{build_targets, expand_hosts, expand_ports};
use crate::types::{ProxyAddress, ReferenceEndpoints, Target};

pub struct ScanConfig {
    pub targets: Vec<Target>,
    pub candidates: Vec<ProxyAddress>,
    pub refs: ReferenceEndpoints,
}

impl Cli {
    pub async fn into_config(self) -> Result<ScanConfig> {
        let hosts = expand_hosts(&self.hosts).context("invalid -a host specification")?;
        let ports = expand_ports(&self.ports).context("invalid -p port specification")?;
        let targets = build_targets(&hosts, &ports);

        let mut candidates = load_candidates(&self.proxy_file)
            .with_context(|| format!("failed to load proxy file {}", self.proxy_file.display()))?;

        if self.download {
            let client = reqwest::Client::new();
            let scraped = scrape_public_lists(&client).await;
            candidates = append_and_dedup(&self.proxy_file, &scraped)
                .context("failed to merge scraped proxies into proxy file")?;
        }

        let refs = ReferenceEndpoints {
            known_open: ProxyAddress::new(self.known_open),
            known_closed: ProxyAddress::new(self.known_closed),
        };

        Ok(ScanConfig {
            targets,
            candidates,
            refs,
        })
    }
}
