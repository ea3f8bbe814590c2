//! Socket transport for the `pilot` client.
//!
//! One exchange per invocation: connect, write a single JSON line, read a
//! single JSON line back, and hand the decoded reply to the caller.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{Context, anyhow};
use serde_json::Value;

use pilot_config::TcpEndpoint;

/// Sends `request` to the bridge at `endpoint` and returns its reply.
///
/// # Errors
/// Returns an error when the endpoint does not resolve, the connection or
/// exchange times out, the bridge closes without answering, or the reply is
/// not valid JSON.
pub fn exchange(endpoint: &TcpEndpoint, timeout: Duration, request: &Value) -> anyhow::Result<Value> {
    let address = resolve(endpoint)?;
    let mut stream = TcpStream::connect_timeout(&address, timeout)
        .with_context(|| format!("failed to connect to bridge at {endpoint}"))?;
    stream
        .set_read_timeout(Some(timeout))
        .context("failed to set read timeout")?;
    stream
        .set_write_timeout(Some(timeout))
        .context("failed to set write timeout")?;

    let mut line = serde_json::to_vec(request).context("failed to encode request")?;
    line.push(b'\n');
    stream
        .write_all(&line)
        .with_context(|| format!("failed to send request to {endpoint}"))?;
    stream.flush().context("failed to flush request")?;

    let mut reply = String::new();
    let mut reader = BufReader::new(stream);
    let read = reader
        .read_line(&mut reply)
        .with_context(|| format!("failed to read reply from {endpoint}"))?;
    if read == 0 {
        return Err(anyhow!("bridge at {endpoint} closed the connection without replying"));
    }

    serde_json::from_str(reply.trim_end())
        .with_context(|| format!("bridge sent a malformed reply: {}", reply.trim_end()))
}

fn resolve(endpoint: &TcpEndpoint) -> anyhow::Result<SocketAddr> {
    let mut addresses = (endpoint.host(), endpoint.port())
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve {endpoint}"))?;
    addresses
        .next()
        .ok_or_else(|| anyhow!("{endpoint} resolved to no addresses"))
}
