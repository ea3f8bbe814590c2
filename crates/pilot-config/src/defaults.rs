use crate::endpoint::TcpEndpoint;

/// Default TCP port the bridge listens on.
pub const DEFAULT_TCP_PORT: u16 = 47201;

/// Default idle timeout for a connection with no traffic, in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 10;

/// Default cap on concurrently served connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Computes the default listener endpoint: loopback on the fixed port.
#[must_use]
pub fn default_endpoint() -> TcpEndpoint {
    TcpEndpoint::new("127.0.0.1", DEFAULT_TCP_PORT)
}

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}
