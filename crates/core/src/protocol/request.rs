use std::fmt;
use std::net::IpAddr;

use crate::error::{ParseErrorKind, Result, RtspError};

/// The ten client-to-server RTSP methods (RFC 2326 §6.1).
///
/// Parsing any other token is a [`ParseErrorKind::UnknownMethod`] error,
/// which surfaces to the client as 400 Bad Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Describe,
    Announce,
    GetParameter,
    Options,
    Pause,
    Play,
    Record,
    Setup,
    SetParameter,
    Teardown,
}

impl Method {
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "DESCRIBE" => Ok(Self::Describe),
            "ANNOUNCE" => Ok(Self::Announce),
            "GET_PARAMETER" => Ok(Self::GetParameter),
            "OPTIONS" => Ok(Self::Options),
            "PAUSE" => Ok(Self::Pause),
            "PLAY" => Ok(Self::Play),
            "RECORD" => Ok(Self::Record),
            "SETUP" => Ok(Self::Setup),
            "SET_PARAMETER" => Ok(Self::SetParameter),
            "TEARDOWN" => Ok(Self::Teardown),
            _ => Err(RtspError::Parse {
                kind: ParseErrorKind::UnknownMethod(token.to_string()),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Describe => "DESCRIBE",
            Self::Announce => "ANNOUNCE",
            Self::GetParameter => "GET_PARAMETER",
            Self::Options => "OPTIONS",
            Self::Pause => "PAUSE",
            Self::Play => "PLAY",
            Self::Record => "RECORD",
            Self::Setup => "SETUP",
            Self::SetParameter => "SET_PARAMETER",
            Self::Teardown => "TEARDOWN",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive RTSP header map (RFC 2326 §4.2).
///
/// Names compare ASCII-case-insensitively on both insert and lookup;
/// inserting a name that already exists (in any casing) replaces the value.
/// Iteration yields entries in insertion order, which keeps serialized
/// output stable.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header (case-insensitive on the name).
    pub fn insert(&mut self, name: &str, value: &str) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            entry.1 = value.to_string();
        } else {
            self.entries.push((name.to_string(), value.to_string()));
        }
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy over every header from `other` whose name is not present here.
    /// Used by the dispatcher to merge its headers (CSeq) under a handler's.
    pub fn merge_missing(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            if !self.contains(name) {
                self.insert(name, value);
            }
        }
    }
}

/// A parsed RTSP request (RFC 2326 §6).
///
/// RTSP requests follow HTTP/1.1 syntax:
///
/// ```text
/// Method SP Request-URL SP "RTSP/" version CRLF
/// *(Header: Value CRLF)
/// CRLF
/// [body]
/// ```
///
/// `client_ip` is stamped by the TCP layer from the connection's peer
/// address — it is never parsed from the wire.
#[derive(Debug, Clone)]
pub struct RtspRequest {
    pub method: Method,
    /// Request-URL (`rtsp://host:port/path`, or `*` for OPTIONS).
    pub uri: String,
    /// Protocol version after the `RTSP/` literal; only "1.0" is served.
    pub version: String,
    pub headers: Headers,
    pub body: String,
    /// Address of the connection that carried this request.
    pub client_ip: Option<IpAddr>,
}

impl RtspRequest {
    /// Parse an RTSP request from its text representation.
    ///
    /// Expects the complete request: request line, headers, blank line, and
    /// any body bytes the transport already read per `Content-Length`.
    /// Returns [`RtspError::Parse`] on malformed input.
    pub fn parse(raw: &str) -> Result<Self> {
        let (head, body) = match raw.find("\r\n\r\n") {
            Some(pos) => (&raw[..pos], &raw[pos + 4..]),
            None => (raw, ""),
        };

        let mut lines = head.lines();

        let request_line = lines.next().ok_or(RtspError::Parse {
            kind: ParseErrorKind::EmptyRequest,
        })?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(RtspError::Parse {
                kind: ParseErrorKind::InvalidRequestLine,
            });
        }

        let method = Method::parse(parts[0])?;
        let uri = parts[1].to_string();
        let version = parse_version(parts[2])?;

        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                break;
            }

            let colon_pos = line.find(':').ok_or(RtspError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?;

            headers.insert(line[..colon_pos].trim(), line[colon_pos + 1..].trim());
        }

        Ok(RtspRequest {
            method,
            uri,
            version,
            headers,
            body: body.to_string(),
            client_ip: None,
        })
    }

    /// Serialize back to the wire format (used for logging and tests).
    pub fn serialize(&self) -> String {
        let mut out = format!("{} {} RTSP/{}\r\n", self.method, self.uri, self.version);
        for (name, value) in self.headers.iter() {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }

    /// The CSeq header, which numbers and orders RTSP request/response
    /// pairs (RFC 2326 §12.17). Every response must echo it.
    pub fn cseq(&self) -> Option<&str> {
        self.headers.get("CSeq")
    }

    /// The Session header value with any `;timeout=` suffix stripped.
    pub fn session(&self) -> Option<&str> {
        self.headers
            .get("Session")
            .map(|s| s.split(';').next().unwrap_or(s).trim())
    }

    /// The Session header parsed as the numeric session id this server
    /// issues. `None` when absent or non-numeric.
    pub fn session_id(&self) -> Option<u32> {
        self.session().and_then(|s| s.parse().ok())
    }

    /// Declared body length; absent or unparsable means no body.
    pub fn content_length(&self) -> usize {
        self.headers
            .get("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

fn parse_version(token: &str) -> Result<String> {
    match token.split_once('/') {
        Some(("RTSP", version)) => Ok(version.to_string()),
        _ => Err(RtspError::Parse {
            kind: ParseErrorKind::UnsupportedProtocol(token.to_string()),
        }),
    }
}
