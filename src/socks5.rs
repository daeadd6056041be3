//! Client-side SOCKS5 CONNECT codec, shared by the Validator's two
//! reference-endpoint probes and the ScanWorker's target dial.
//!
//! No authentication is ever negotiated; the greeting always offers a
//! single NO AUTH method. CONNECT is the only command issued.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::types::ProxyAddress;

/// Connects to `proxy`, negotiates SOCKS5 NO AUTH, and issues a CONNECT
/// request for `target`. Returns the connected stream on success.
///
/// `target` is rendered as `host:port`; IPv4 literals are sent using the
/// SOCKS5 IPv4 address type, anything else (hostnames, used only for
/// operator-supplied reference endpoints) via the domain address type.
pub async fn connect_via_socks5(proxy: &ProxyAddress, target: &str) -> io::Result<TcpStream> {
    let mut stream = TcpStream::connect(proxy.as_str()).await?;

    // Greeting: version 5, 1 method offered, NO AUTH (0x00).
    stream.write_all(&[0x05, 0x01, 0x00]).await?;
    let mut greeting_reply = [0u8; 2];
    stream.read_exact(&mut greeting_reply).await?;
    if greeting_reply[0] != 0x05 || greeting_reply[1] != 0x00 {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "SOCKS5 greeting rejected (no acceptable auth method)",
        ));
    }

    let (host, port_str) = target
        .rsplit_once(':')
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target missing port"))?;
    let port: u16 = port_str
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "target port not numeric"))?;

    let mut request = vec![0x05, 0x01, 0x00];
    if let Ok(ipv4) = host.parse::<std::net::Ipv4Addr>() {
        request.push(0x01);
        request.extend_from_slice(&ipv4.octets());
        request.extend_from_slice(&port.to_be_bytes());
    } else {
        request.push(0x03);
        request.push(host.len() as u8);
        request.extend_from_slice(host.as_bytes());
        request.extend_from_slice(&port.to_be_bytes());
    }

    stream.write_all(&request).await?;

    let mut head = [0u8; 4];
    stream.read_exact(&mut head).await?;
    if head[0] != 0x05 {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "malformed SOCKS5 CONNECT reply",
        ));
    }
    if head[1] != 0x00 {
        return Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("SOCKS5 CONNECT failed, REP=0x{:02x}", head[1]),
        ));
    }

    // Drain BND.ADDR / BND.PORT so the connection is left in a clean state.
    match head[3] {
        0x01 => {
            let mut rest = [0u8; 6];
            stream.read_exact(&mut rest).await?;
        }
        0x03 => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            let mut rest = vec![0u8; len[0] as usize + 2];
            stream.read_exact(&mut rest).await?;
        }
        0x04 => {
            let mut rest = [0u8; 18];
            stream.read_exact(&mut rest).await?;
        }
        _ => {}
    }

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Minimal SOCKS5 CONNECT server for tests: accepts the NO-AUTH
    /// greeting and replies to CONNECT with either success or a refusal,
    /// without ever actually dialing the requested target.
    async fn spawn_fake_proxy(succeed: bool) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut greeting = [0u8; 3];
                let _ = sock.read_exact(&mut greeting).await;
                let _ = sock.write_all(&[0x05, 0x00]).await;

                let mut head = [0u8; 4];
                let _ = sock.read_exact(&mut head).await;
                let atyp = head[3];
                match atyp {
                    0x01 => {
                        let mut rest = [0u8; 6];
                        let _ = sock.read_exact(&mut rest).await;
                    }
                    0x03 => {
                        let mut len = [0u8; 1];
                        let _ = sock.read_exact(&mut len).await;
                        let mut rest = vec![0u8; len[0] as usize + 2];
                        let _ = sock.read_exact(&mut rest).await;
                    }
                    _ => {}
                }

                let rep = if succeed { 0x00 } else { 0x05 };
                let _ = sock
                    .write_all(&[0x05, rep, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
                    .await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn connect_succeeds_on_rep_zero() {
        let addr = spawn_fake_proxy(true).await;
        let proxy = ProxyAddress::new(addr.to_string());
        let result = connect_via_socks5(&proxy, "93.184.216.34:80").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn connect_fails_on_nonzero_rep() {
        let addr = spawn_fake_proxy(false).await;
        let proxy = ProxyAddress::new(addr.to_string());
        let result = connect_via_socks5(&proxy, "93.184.216.34:80").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn connect_fails_when_proxy_unreachable() {
        // Nothing listening on this port.
        let proxy = ProxyAddress::new("127.0.0.1:1");
        let result = connect_via_socks5(&proxy, "93.184.216.34:80").await;
        assert!(result.is_err());
    }
}
