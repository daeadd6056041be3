//! Command-line surface: clap `derive` struct mirroring the original
//! scanner's short-flag conventions.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "spectre-scan", about = "TCP port scanner routed through a rotating SOCKS5 proxy pool")]
pub struct Cli {
    /// IPv4 address, comma-separated list, or CIDR block.
    #[arg(short = 'a', long = "addr", default_value = "127.0.0.1")]
    pub hosts: String,

    /// Port, comma-separated list, or `lo-hi` range.
    #[arg(short = 'p', long = "ports", default_value = "1-65535")]
    pub ports: String,

    /// Path to the candidate proxy file.
    #[arg(short = 's', long = "socks-file", default_value = "socks5_proxies.txt")]
    pub proxy_file: PathBuf,

    /// Reference endpoint known to accept and close the connection.
    #[arg(short = 'o', long = "known-open")]
    pub known_open: String,

    /// Reference endpoint known to refuse the connection.
    #[arg(short = 'c', long = "known-closed")]
    pub known_closed: String,

    /// Fetch public SOCKS5 proxy lists and append them to the proxy file.
    #[arg(short = 'd', long = "download", default_value_t = false)]
    pub download: bool,
}
