//! SDP (Session Description Protocol) model and serializer (RFC 4566).
//!
//! Produces the SDP body returned by DESCRIBE responses. Fields are emitted
//! as `<key>=<value>` lines terminated by CRLF, in the canonical order
//!
//! ```text
//! v, o, s, i?, u?, e*, p*, c?, b*, t, r?, z?, k?, a*, m, i?, c?, b*, k?, a*
//! ```
//!
//! Optional fields that are `None` (or empty vectors) are skipped. A
//! typical body for this server:
//!
//! ```text
//! v=0
//! o=pi 1718000000 1 IN IP4 192.168.1.10
//! s=Session streamed by Pi RTSP Server
//! i=jpeg
//! t=0 0
//! m=video 0 RTP/AVP 26
//! c=IN IP4 192.168.1.10
//! a=control:track1
//! a=cliprect:0,0,480,640
//! a=framerate:10
//! ```

use std::fmt;

const CRLF: &str = "\r\n";

/// The `o=` origin line: username, numeric session id, session version,
/// and the unicast address of the session creator.
#[derive(Debug, Clone)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub address: String,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            username: "-".to_string(),
            session_id: 0,
            session_version: 0,
            address: "0.0.0.0".to_string(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} IN IP4 {}",
            self.username, self.session_id, self.session_version, self.address
        )
    }
}

/// An `a=` attribute line: `name:value`, or a bare flag when the value is
/// empty (e.g. `a=sendonly`).
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.name, self.value)
        }
    }
}

/// A `t=` time description with its optional `r=` repeat line.
/// Live streams use `t=0 0` (unbounded).
#[derive(Debug, Clone)]
pub struct TimeDescription {
    pub start: u64,
    pub stop: u64,
    pub repeat: Option<String>,
}

impl TimeDescription {
    /// `t=0 0` — the session is permanently active.
    pub fn unbounded() -> Self {
        Self {
            start: 0,
            stop: 0,
            repeat: None,
        }
    }
}

/// An `m=` media section with its optional per-media lines.
#[derive(Debug, Clone, Default)]
pub struct MediaDescription {
    /// Media name and transport, e.g. `video 0 RTP/AVP 26`.
    pub name: String,
    pub info: Option<String>,
    pub connection: Option<String>,
    pub bandwidths: Vec<String>,
    pub key: Option<String>,
    pub attributes: Vec<Attribute>,
}

/// A complete session description (RFC 4566 §5).
#[derive(Debug, Clone, Default)]
pub struct SessionDescription {
    /// Protocol version, always 0.
    pub version: u32,
    pub origin: Origin,
    pub session_name: String,
    pub info: Option<String>,
    pub uri: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub connection: Option<String>,
    pub bandwidths: Vec<String>,
    pub time_descriptions: Vec<TimeDescription>,
    pub time_zone: Option<String>,
    pub key: Option<String>,
    pub attributes: Vec<Attribute>,
    pub media_descriptions: Vec<MediaDescription>,
}

impl SessionDescription {
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

fn write_line(out: &mut String, key: char, value: &str) {
    out.push(key);
    out.push('=');
    out.push_str(value);
    out.push_str(CRLF);
}

fn write_opt(out: &mut String, key: char, value: &Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            write_line(out, key, value);
        }
    }
}

fn write_each(out: &mut String, key: char, values: &[String]) {
    for value in values {
        if !value.is_empty() {
            write_line(out, key, value);
        }
    }
}

fn write_attributes(out: &mut String, attributes: &[Attribute]) {
    for attribute in attributes {
        write_line(out, 'a', &attribute.to_string());
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();

        write_line(&mut out, 'v', &self.version.to_string());
        write_line(&mut out, 'o', &self.origin.to_string());
        write_line(&mut out, 's', &self.session_name);

        write_opt(&mut out, 'i', &self.info);
        write_opt(&mut out, 'u', &self.uri);
        write_each(&mut out, 'e', &self.emails);
        write_each(&mut out, 'p', &self.phones);
        write_opt(&mut out, 'c', &self.connection);
        write_each(&mut out, 'b', &self.bandwidths);

        for time in &self.time_descriptions {
            write_line(&mut out, 't', &format!("{} {}", time.start, time.stop));
            write_opt(&mut out, 'r', &time.repeat);
        }

        write_opt(&mut out, 'z', &self.time_zone);
        write_opt(&mut out, 'k', &self.key);
        write_attributes(&mut out, &self.attributes);

        for media in &self.media_descriptions {
            write_line(&mut out, 'm', &media.name);
            write_opt(&mut out, 'i', &media.info);
            write_opt(&mut out, 'c', &media.connection);
            write_each(&mut out, 'b', &media.bandwidths);
            write_opt(&mut out, 'k', &media.key);
            write_attributes(&mut out, &media.attributes);
        }

        f.write_str(&out)
    }
}
