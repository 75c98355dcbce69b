use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::protocol::dispatcher::RequestDispatcher;
use crate::protocol::request::{Method, RtspRequest};
use crate::protocol::response::RtspResponse;

/// Non-blocking TCP accept loop.
///
/// The listener polls with `accept_timeout` between empty accepts so the
/// `running` flag is checked at that granularity; connections already
/// queued in the backlog are picked up on the next poll. Each accepted
/// connection gets its own handler thread.
pub fn accept_loop(
    listener: TcpListener,
    dispatcher: Arc<RequestDispatcher>,
    accept_timeout: Duration,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                let dispatcher = dispatcher.clone();
                let running = running.clone();
                thread::spawn(move || {
                    Connection::handle(stream, dispatcher, running);
                });
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(accept_timeout);
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// A single RTSP control connection.
///
/// Runs the request/response ping-pong until the client disconnects, a
/// transport error occurs, the server shuts down, or the session is torn
/// down. Transport failures here never touch servlet state.
struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    dispatcher: Arc<RequestDispatcher>,
    peer_addr: SocketAddr,
}

impl Connection {
    fn handle(stream: TcpStream, dispatcher: Arc<RequestDispatcher>, running: Arc<AtomicBool>) {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(_) => return,
        };

        tracing::info!(%peer_addr, "client connected");

        let reader_stream = match stream.try_clone() {
            Ok(cloned) => cloned,
            Err(_) => return,
        };

        let mut conn = Connection {
            reader: BufReader::new(reader_stream),
            writer: stream,
            dispatcher,
            peer_addr,
        };

        let reason = conn.run(&running);
        tracing::info!(%peer_addr, reason, "client disconnected");
    }

    /// RTSP request/response loop. Returns the reason for exiting.
    fn run(&mut self, running: &Arc<AtomicBool>) -> &'static str {
        while running.load(Ordering::SeqCst) {
            // Headers: everything up to the blank line.
            let mut request_text = String::new();
            loop {
                let mut line = String::new();
                match self.reader.read_line(&mut line) {
                    Ok(0) => return "connection closed by client",
                    Ok(_) => {
                        request_text.push_str(&line);
                        if line == "\r\n" || line == "\n" {
                            break;
                        }
                    }
                    Err(_) => return "read error",
                }
            }

            if request_text.trim().is_empty() {
                continue;
            }

            // Body: exactly Content-Length further bytes, when declared.
            let body_len = declared_content_length(&request_text);
            if body_len > 0 {
                let mut body = vec![0u8; body_len];
                if self.reader.read_exact(&mut body).is_err() {
                    return "read error";
                }
                request_text.push_str(&String::from_utf8_lossy(&body));
            }

            let (response, torn_down) = match RtspRequest::parse(&request_text) {
                Ok(mut request) => {
                    request.client_ip = Some(self.peer_addr.ip());
                    tracing::debug!(
                        peer = %self.peer_addr,
                        method = %request.method,
                        uri = %request.uri,
                        "request"
                    );

                    let is_teardown = request.method == Method::Teardown;
                    let response = self.dispatcher.dispatch(request);
                    let torn_down = is_teardown && response.status_code == 200;
                    (response, torn_down)
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "unparsable request");
                    (RtspResponse::bad_request(), false)
                }
            };

            tracing::debug!(peer = %self.peer_addr, status = response.status_code, "response");

            if self
                .writer
                .write_all(response.serialize().as_bytes())
                .is_err()
            {
                return "write error";
            }

            if torn_down {
                return "session torn down";
            }
        }

        "server shutting down"
    }
}

/// Scan raw header lines for `Content-Length`; absent or unparsable means
/// no body.
fn declared_content_length(head: &str) -> usize {
    head.lines()
        .find(|line| line.to_ascii_lowercase().starts_with("content-length:"))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_found_case_insensitive() {
        let head = "SETUP rtsp://h/ RTSP/1.0\r\ncontent-length: 42\r\n\r\n";
        assert_eq!(declared_content_length(head), 42);
    }

    #[test]
    fn content_length_defaults_to_zero() {
        assert_eq!(declared_content_length("OPTIONS * RTSP/1.0\r\n\r\n"), 0);
        assert_eq!(
            declared_content_length("OPTIONS * RTSP/1.0\r\nContent-Length: x\r\n\r\n"),
            0
        );
    }
}
