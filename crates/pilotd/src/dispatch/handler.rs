//! Per-connection dispatch loop.
//!
//! Each connection is served by one sequential loop: bytes accumulate in a
//! per-connection buffer, complete newline-delimited frames are parsed and
//! dispatched one at a time, and every frame gets exactly one response
//! line, in order. The loop tolerates frames split across reads, several
//! frames in one read, and a final unterminated frame, which is processed
//! when the peer closes its write side.

use std::io::{self, Read};
use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, warn};

use crate::transport::ConnectionHandler;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::{Command, trim_trailing_whitespace};
use super::response::{Reply, ResponseWriter};
use super::router::CommandRouter;

/// Maximum size of a single request frame in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;

const READ_CHUNK_BYTES: usize = 4096;

/// Connection handler that frames, parses, and dispatches commands.
#[derive(Debug)]
pub(crate) struct BridgeConnectionHandler {
    router: CommandRouter,
    idle_timeout: Duration,
}

impl BridgeConnectionHandler {
    pub(crate) const fn new(router: CommandRouter, idle_timeout: Duration) -> Self {
        Self {
            router,
            idle_timeout,
        }
    }

    fn serve(&self, stream: &mut TcpStream) {
        if let Err(error) = stream.set_read_timeout(Some(self.idle_timeout)) {
            warn!(target: DISPATCH_TARGET, %error, "failed to arm idle timeout");
            return;
        }
        let mut buffer: Vec<u8> = Vec::new();
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        loop {
            let bytes_read = match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error)
                    if error.kind() == io::ErrorKind::WouldBlock
                        || error.kind() == io::ErrorKind::TimedOut =>
                {
                    // Idle peers are closed quietly; this is not an error.
                    debug!(target: DISPATCH_TARGET, "closing idle connection");
                    return;
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "connection read failed");
                    return;
                }
            };
            buffer.extend_from_slice(&chunk[..bytes_read]);
            if !self.drain_frames(&mut buffer, stream) {
                return;
            }
        }
        // EOF with an unterminated final frame still buffered.
        if !trim_trailing_whitespace(&buffer).is_empty() {
            let _ = self.respond_to_frame(&buffer, stream);
        }
        debug!(target: DISPATCH_TARGET, "client disconnected");
    }

    /// Processes every complete frame in the buffer. Returns `false` when
    /// the connection must close.
    fn drain_frames(&self, buffer: &mut Vec<u8>, stream: &mut TcpStream) -> bool {
        while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
            let frame: Vec<u8> = buffer.drain(..=newline_pos).collect();
            if !self.respond_to_frame(&frame, stream) {
                return false;
            }
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            // A frame this large cannot be resynchronised; report and close.
            let error = DispatchError::request_too_large(buffer.len(), MAX_REQUEST_BYTES);
            warn!(target: DISPATCH_TARGET, %error, "closing connection");
            let mut writer = ResponseWriter::new(&mut *stream);
            let _ = writer.write_reply(&Reply::error(&error));
            return false;
        }
        true
    }

    /// Handles one frame. Returns `false` when the connection must close.
    fn respond_to_frame(&self, frame: &[u8], stream: &mut TcpStream) -> bool {
        if trim_trailing_whitespace(frame).is_empty() {
            return true;
        }
        let reply = match Command::parse(frame).and_then(|command| self.router.dispatch(command)) {
            Ok(reply) => reply,
            Err(error) if error.is_connection_fatal() => {
                warn!(target: DISPATCH_TARGET, %error, "dispatch failed fatally");
                return false;
            }
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "request failed");
                Reply::error(&error)
            }
        };
        let mut writer = ResponseWriter::new(&mut *stream);
        match writer.write_reply(&reply) {
            Ok(()) => true,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to write response");
                false
            }
        }
    }
}

impl ConnectionHandler for BridgeConnectionHandler {
    fn handle(&self, mut stream: TcpStream) {
        self.serve(&mut stream);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread::{self, JoinHandle};

    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    use pilot_engine::{EngineControl, EngineThread, ScriptedEngine};

    use super::*;

    /// TCP server/client pair serving one connection with a live router.
    struct HandlerTestHarness {
        client: TcpStream,
        server_handle: JoinHandle<()>,
        engine_thread: EngineThread,
    }

    impl HandlerTestHarness {
        fn write_chunks(&mut self, chunks: &[&[u8]]) {
            for chunk in chunks {
                self.client.write_all(chunk).expect("write chunk");
                self.client.flush().expect("flush");
                // Let the server observe each chunk as a separate read.
                thread::sleep(Duration::from_millis(20));
            }
        }

        fn read_lines(&mut self, count: usize) -> Vec<Value> {
            let mut reader = BufReader::new(self.client.try_clone().expect("clone client"));
            let mut lines = Vec::new();
            for _ in 0..count {
                let mut line = String::new();
                assert!(reader.read_line(&mut line).expect("read line") > 0);
                lines.push(serde_json::from_str(&line).expect("response is JSON"));
            }
            lines
        }

        fn finish(self) {
            drop(self.client);
            self.server_handle.join().expect("server join");
            self.engine_thread.join();
        }
    }

    fn create_listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        (listener, addr)
    }

    #[fixture]
    fn harness() -> HandlerTestHarness {
        let mut engine = ScriptedEngine::new("Test Story");
        engine
            .define_label("start")
            .show_line(Some("anna"), "Which way?")
            .present_menu(["North", "South"]);
        let identity = engine.identity();
        let engine_thread = EngineThread::spawn(Box::new(engine));
        let router = CommandRouter::new(engine_thread.handle(), identity, Vec::new(), None);

        let (listener, addr) = create_listener();
        let server_handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            BridgeConnectionHandler::new(router, Duration::from_secs(5)).handle(stream);
        });
        let client = TcpStream::connect(addr).expect("connect");
        HandlerTestHarness {
            client,
            server_handle,
            engine_thread,
        }
    }

    #[rstest]
    fn frame_split_across_writes_produces_one_response(mut harness: HandlerTestHarness) {
        harness.write_chunks(&[b"{\"cm", b"d\":\"pi", b"ng\"}\n"]);
        let lines = harness.read_lines(1);
        assert_eq!(lines[0]["ok"], json!(true));
        assert_eq!(lines[0]["engine"], json!("scripted"));
        harness.finish();
    }

    #[rstest]
    fn two_frames_in_one_write_produce_two_responses(mut harness: HandlerTestHarness) {
        harness.write_chunks(&[b"{\"cmd\":\"ping\"}\n{\"cmd\":\"choices\"}\n"]);
        let lines = harness.read_lines(2);
        assert_eq!(lines[0]["game"], json!("Test Story"));
        assert_eq!(lines[1]["choices"][1]["caption"], json!("South"));
        harness.finish();
    }

    #[rstest]
    fn malformed_frame_keeps_connection_open(mut harness: HandlerTestHarness) {
        harness.write_chunks(&[b"{\"cmd\":\n", b"{\"cmd\":\"ping\"}\n"]);
        let lines = harness.read_lines(2);
        assert_eq!(lines[0]["ok"], json!(false));
        let first_error = lines[0]["error"].as_str().expect("error text");
        assert!(first_error.starts_with("Invalid JSON: "));
        assert_eq!(lines[1]["ok"], json!(true));
        harness.finish();
    }

    #[rstest]
    fn unknown_command_is_reported_in_band(mut harness: HandlerTestHarness) {
        harness.write_chunks(&[b"{\"cmd\":\"reboot\"}\n"]);
        let lines = harness.read_lines(1);
        assert_eq!(lines[0]["error"], json!("Unknown command: reboot"));
        harness.finish();
    }

    #[rstest]
    fn out_of_range_choose_is_reported_in_band(mut harness: HandlerTestHarness) {
        harness.write_chunks(&[b"{\"cmd\":\"choose\",\"index\":9}\n", b"{\"cmd\":\"ping\"}\n"]);
        let lines = harness.read_lines(2);
        assert_eq!(lines[0]["error"], json!("Index 9 out of range (0-1)"));
        assert_eq!(lines[1]["ok"], json!(true));
        harness.finish();
    }

    #[rstest]
    fn unterminated_final_frame_is_served_at_eof(mut harness: HandlerTestHarness) {
        harness
            .client
            .write_all(b"{\"cmd\":\"ping\"}")
            .expect("write partial frame");
        harness
            .client
            .shutdown(std::net::Shutdown::Write)
            .expect("half-close");
        let lines = harness.read_lines(1);
        assert_eq!(lines[0]["ok"], json!(true));
        harness.finish();
    }

    #[rstest]
    fn blank_lines_are_ignored(mut harness: HandlerTestHarness) {
        harness.write_chunks(&[b"\n  \n{\"cmd\":\"ping\"}\n"]);
        let lines = harness.read_lines(1);
        assert_eq!(lines[0]["ok"], json!(true));
        harness.finish();
    }
}
