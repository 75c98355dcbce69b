use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Result, RtspError};
use crate::protocol::dispatcher::RequestDispatcher;
use crate::transport::tcp;

/// Default RTSP listen port. The canonical 554 requires root on Linux.
pub const DEFAULT_RTSP_PORT: u16 = 5544;

/// Server-level configuration shared with servlets.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host advertised in SDP `o=` and `c=` lines. `None` means the
    /// machine's IPv4 address is discovered best-effort at DESCRIBE time.
    pub public_host: Option<String>,
    /// How long the accept loop sleeps between polls while idle; bounds
    /// the shutdown-flag check interval.
    pub accept_timeout: Duration,
    /// Server RTP port, advertised in the SETUP `Transport` response and
    /// bound by the streaming worker. RTCP is this plus one.
    pub server_rtp_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_host: None,
            accept_timeout: Duration::from_secs(2),
            server_rtp_port: 5000,
        }
    }
}

/// RTSP server orchestrator.
///
/// Owns the listening socket, the running flag, and the frozen
/// [`RequestDispatcher`]; delegates connection handling to
/// [`crate::transport::tcp`]. The dispatcher (with its servlets) is built
/// up front and is immutable once the server starts, which is what lets
/// every connection-handler thread share it without locking.
///
/// ```no_run
/// use std::sync::Arc;
/// use pirtsp::capture::{BaselineJpegEncoder, CaptureConfig, TestPattern};
/// use pirtsp::{JpegServlet, RequestDispatcher, Server, ServerConfig};
///
/// let config = Arc::new(ServerConfig::default());
/// let capture = CaptureConfig::default();
/// let servlet = JpegServlet::new(
///     Box::new(TestPattern::new(capture.clone())),
///     Box::new(BaselineJpegEncoder),
///     capture,
///     config.clone(),
/// ).unwrap();
///
/// let mut dispatcher = RequestDispatcher::new();
/// dispatcher.register_servlet("/", Arc::new(servlet));
///
/// let mut server = Server::new("0.0.0.0:5544", config, dispatcher);
/// server.start().unwrap();
/// ```
pub struct Server {
    bind_addr: String,
    config: Arc<ServerConfig>,
    dispatcher: Arc<RequestDispatcher>,
    running: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
}

impl Server {
    /// Create a server from a fully-registered dispatcher.
    ///
    /// `bind_addr` must be `host:port` with an explicit non-zero port
    /// (e.g. `0.0.0.0:5544`); validation happens in [`start`](Self::start).
    pub fn new(bind_addr: &str, config: Arc<ServerConfig>, dispatcher: RequestDispatcher) -> Self {
        Self {
            bind_addr: bind_addr.to_string(),
            config,
            dispatcher: Arc::new(dispatcher),
            running: Arc::new(AtomicBool::new(false)),
            accept_thread: None,
        }
    }

    /// Bind the listener and start accepting connections.
    ///
    /// A bind failure is fatal to the caller: nothing is left running.
    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RtspError::AlreadyRunning);
        }

        let addr: SocketAddr = self.bind_addr.parse().map_err(|_| {
            RtspError::InvalidBindAddress(format!(
                "expected host:port with explicit port, got {:?}",
                self.bind_addr
            ))
        })?;
        if addr.port() == 0 {
            return Err(RtspError::InvalidBindAddress(
                "port must be explicit (non-zero)".to_string(),
            ));
        }

        let listener = TcpListener::bind(&self.bind_addr)?;
        listener.set_nonblocking(true)?;

        self.running.store(true, Ordering::SeqCst);

        let dispatcher = self.dispatcher.clone();
        let accept_timeout = self.config.accept_timeout;
        let running = self.running.clone();

        tracing::info!(addr = %self.bind_addr, "RTSP server listening");

        self.accept_thread = Some(thread::spawn(move || {
            tcp::accept_loop(listener, dispatcher, accept_timeout, running);
        }));

        Ok(())
    }

    /// Stop accepting connections and join the accept loop.
    ///
    /// Streaming workers are joined when their servlets drop — that is,
    /// when the dispatcher's last reference goes away.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        tracing::info!("server stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_server(bind: &str) -> Server {
        Server::new(
            bind,
            Arc::new(ServerConfig::default()),
            RequestDispatcher::new(),
        )
    }

    #[test]
    fn start_rejects_port_zero() {
        let mut server = empty_server("127.0.0.1:0");
        let err = server.start().unwrap_err();
        match &err {
            RtspError::InvalidBindAddress(msg) => assert!(msg.contains("non-zero"), "{}", msg),
            _ => panic!("expected InvalidBindAddress, got {:?}", err),
        }
    }

    #[test]
    fn start_rejects_missing_port() {
        let mut server = empty_server("127.0.0.1");
        let err = server.start().unwrap_err();
        match &err {
            RtspError::InvalidBindAddress(_) => {}
            _ => panic!("expected InvalidBindAddress, got {:?}", err),
        }
    }

    #[test]
    fn start_accepts_explicit_port_and_stops() {
        let mut server = empty_server("127.0.0.1:18555");
        server.start().expect("explicit port should be accepted");
        assert!(server.is_running());
        assert!(matches!(server.start(), Err(RtspError::AlreadyRunning)));
        server.stop();
        assert!(!server.is_running());
    }
}
