//! RTSP session state (RFC 2326 §3, §12.37).
//!
//! A session is created during SETUP and destroyed by TEARDOWN. This server
//! serves one client at a time, so each servlet owns exactly one [`Session`]
//! record rather than a registry; all access is serialized under the
//! servlet's lock, so the record itself carries no synchronization.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle  --SETUP-->  Ready  --PLAY-->  Playing
//!                     |                  |
//!                     +---TEARDOWN------>+--> Idle
//! ```
//!
//! SETUP is only legal in Idle (a SETUP carrying the current session id is
//! answered 459, a SETUP while a client is connected 423). PLAY and
//! TEARDOWN require the matching session id and are legal in Ready and
//! Playing.

pub mod transport;

pub use transport::TransportHeader;

/// Playback state of the single media session (RFC 2326 §A.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session negotiated.
    Idle,
    /// Session created via SETUP, not yet playing.
    Ready,
    /// Media is being delivered to the client's RTP port.
    Playing,
}

/// The servlet's single negotiated session.
///
/// The id is a random non-zero u32 allocated at SETUP and sent back in the
/// `Session` header as a decimal integer. Client ports come from the SETUP
/// `Transport` header.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    id: u32,
    client_rtp_port: u16,
    client_rtcp_port: u16,
    connected: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            id: 0,
            client_rtp_port: 0,
            client_rtcp_port: 0,
            connected: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn client_rtp_port(&self) -> u16 {
        self.client_rtp_port
    }

    pub fn client_rtcp_port(&self) -> u16 {
        self.client_rtcp_port
    }

    /// Whether a client is connected (PLAY issued, not yet torn down).
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the given id names the current session.
    pub fn matches(&self, id: u32) -> bool {
        self.id != 0 && self.id == id
    }

    /// Record a successful SETUP: Idle → Ready.
    pub fn establish(&mut self, id: u32, client_rtp_port: u16, client_rtcp_port: u16) {
        tracing::debug!(session_id = id, client_rtp_port, "session established");
        self.id = id;
        self.client_rtp_port = client_rtp_port;
        self.client_rtcp_port = client_rtcp_port;
        self.connected = false;
        self.state = SessionState::Ready;
    }

    /// Record a successful PLAY: Ready/Playing → Playing.
    pub fn start_playing(&mut self) {
        tracing::debug!(session_id = self.id, "session playing");
        self.connected = true;
        self.state = SessionState::Playing;
    }

    /// Record a TEARDOWN: → Idle. The id is cleared so a later SETUP
    /// carrying the stale id is not mistaken for the current session.
    pub fn tear_down(&mut self) {
        tracing::debug!(session_id = self.id, "session torn down");
        self.id = 0;
        self.connected = false;
        self.state = SessionState::Idle;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
