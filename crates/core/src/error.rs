//! Error types for the RTSP/MJPEG server library.

use std::fmt;

/// Errors that can occur across the server stack.
///
/// Variants map to specific failure modes:
///
/// - **Protocol**: [`Parse`](Self::Parse) — malformed RTSP messages,
///   [`InvalidUrl`](Self::InvalidUrl) — request URLs that are not
///   `rtsp://host[:port]/path`, [`MethodNotAllowed`](Self::MethodNotAllowed)
///   — a servlet received a method it does not serve.
/// - **Transport**: [`Io`](Self::Io) — socket/network failures.
/// - **Capture**: [`Capture`](Self::Capture), [`Encode`](Self::Encode),
///   [`InvalidCaptureConfig`](Self::InvalidCaptureConfig) — the camera and
///   JPEG-encoder collaborators.
/// - **Server**: [`InvalidBindAddress`](Self::InvalidBindAddress),
///   [`AlreadyRunning`](Self::AlreadyRunning).
///
/// The dispatcher translates handler errors onto the RTSP status taxonomy:
/// `MethodNotAllowed` becomes 405, `Parse`/`InvalidUrl` become 400, and any
/// other handler failure becomes 500.
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an RTSP request message (RFC 2326 §6).
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// Request URL is not a well-formed `rtsp://` URL.
    #[error("invalid RTSP URL: {0}")]
    InvalidUrl(String),

    /// The addressed servlet does not serve this RTSP method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Capture parameters are out of range (dimensions, fps, quality).
    #[error("invalid capture configuration: {0}")]
    InvalidCaptureConfig(String),

    /// The frame source failed to produce a frame.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// The JPEG encoder failed on a captured frame.
    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    /// Bind address was not `host:port` with an explicit non-zero port.
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),

    /// [`Server::start`](crate::Server::start) was called while already running.
    #[error("server already running")]
    AlreadyRunning,
}

/// Specific kind of RTSP parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Input was empty (no request line).
    EmptyRequest,
    /// Request line did not have the `Method URL Version` format.
    InvalidRequestLine,
    /// A header line did not contain a colon separator.
    InvalidHeader,
    /// The method token is not one of the ten RTSP methods.
    UnknownMethod(String),
    /// The version token did not start with the `RTSP/` protocol literal.
    UnsupportedProtocol(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "empty request"),
            Self::InvalidRequestLine => write!(f, "invalid request line"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::UnknownMethod(token) => write!(f, "unknown method {token:?}"),
            Self::UnsupportedProtocol(token) => write!(f, "expected RTSP protocol, got {token:?}"),
        }
    }
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;
