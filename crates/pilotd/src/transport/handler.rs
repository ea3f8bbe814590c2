//! Connection handling abstraction for the bridge listener.

use std::net::TcpStream;

/// Handles accepted socket connections.
///
/// The listener invokes `handle` on a dedicated thread per connection;
/// implementations should avoid panicking and must close the stream on any
/// unrecoverable I/O error without affecting other connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection to completion.
    fn handle(&self, stream: TcpStream);
}
