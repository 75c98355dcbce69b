use crate::protocol::request::Headers;

/// An RTSP response (RFC 2326 §7).
///
/// Serializes to the standard text format:
///
/// ```text
/// RTSP/1.0 200 OK\r\n
/// CSeq: 2\r\n
/// Content-Type: application/sdp\r\n
/// Content-Length: 142\r\n
/// \r\n
/// v=0\r\n...
/// ```
///
/// Uses a builder pattern — chain [`add_header`](Self::add_header) and
/// [`with_body`](Self::with_body), then call [`serialize`](Self::serialize).
/// `Content-Length` is computed automatically when a body is present.
///
/// Named constructors cover the status taxonomy this server emits; see
/// the dispatcher and the JPEG servlet for where each code is produced.
#[must_use]
#[derive(Debug)]
pub struct RtspResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Option<String>,
}

/// Server identification string included in every response (RFC 2326 §12.36).
pub const SERVER_AGENT: &str = "pirtsp/0.1";

impl RtspResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        let mut headers = Headers::new();
        headers.insert("Server", SERVER_AGENT);
        RtspResponse {
            status_code,
            status_text: status_text.to_string(),
            headers,
            body: None,
        }
    }

    /// 200 OK.
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// 400 Bad Request — malformed message or missing required header.
    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request")
    }

    /// 404 Not Found — no servlet mounted under the request path.
    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    /// 405 Method Not Allowed — the servlet does not serve this method.
    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed")
    }

    /// 423 Locked — another session already holds the stream.
    pub fn locked() -> Self {
        Self::new(423, "Locked")
    }

    /// 454 Session Not Found — Session header absent or mismatched.
    pub fn session_not_found() -> Self {
        Self::new(454, "Session Not Found")
    }

    /// 459 Aggregate Operation Not Allowed — SETUP on the current session.
    pub fn aggregate_not_allowed() -> Self {
        Self::new(459, "Aggregate Operation Not Allowed")
    }

    /// 500 Internal Server Error — a handler failed unexpectedly.
    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }

    /// 501 Not Implemented — no servlet serves this method.
    pub fn not_implemented() -> Self {
        Self::new(501, "Not Implemented")
    }

    /// 505 — the request was not RTSP/1.0.
    pub fn version_not_supported() -> Self {
        Self::new(505, "RTSP Version not supported")
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize to the RTSP text wire format.
    ///
    /// If a body is present, `Content-Length` is appended automatically
    /// (RFC 2326 §12.14).
    pub fn serialize(&self) -> String {
        let mut response = format!("RTSP/1.0 {} {}\r\n", self.status_code, self.status_text);

        for (name, value) in self.headers.iter() {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }

        if let Some(body) = &self.body {
            response.push_str(&format!("Content-Length: {}\r\n", body.len()));
            response.push_str("\r\n");
            response.push_str(body);
        } else {
            response.push_str("\r\n");
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_no_body() {
        let resp = RtspResponse::ok()
            .add_header("CSeq", "1")
            .add_header("Public", "OPTIONS");
        let s = resp.serialize();
        assert!(s.starts_with("RTSP/1.0 200 OK\r\n"));
        assert!(s.contains("Server: pirtsp/0.1\r\n"));
        assert!(s.contains("CSeq: 1\r\n"));
        assert!(s.contains("Public: OPTIONS\r\n"));
        assert!(s.ends_with("\r\n"));
    }

    #[test]
    fn serialize_with_body() {
        let resp = RtspResponse::ok()
            .add_header("CSeq", "2")
            .with_body("v=0\r\n".to_string());
        let s = resp.serialize();
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("v=0\r\n"));
    }

    #[test]
    fn add_header_replaces_existing() {
        let resp = RtspResponse::ok()
            .add_header("Session", "1")
            .add_header("session", "2");
        let s = resp.serialize();
        assert!(!s.contains("Session: 1\r\n"));
        assert!(s.contains("Session: 2\r\n"));
    }

    #[test]
    fn status_taxonomy() {
        assert_eq!(RtspResponse::locked().status_code, 423);
        assert_eq!(RtspResponse::session_not_found().status_code, 454);
        assert_eq!(RtspResponse::aggregate_not_allowed().status_code, 459);
        assert_eq!(RtspResponse::not_implemented().status_code, 501);
        let resp = RtspResponse::version_not_supported();
        assert_eq!(resp.status_code, 505);
        assert_eq!(resp.status_text, "RTSP Version not supported");
    }
}
