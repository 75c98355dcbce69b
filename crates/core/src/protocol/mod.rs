//! RTSP protocol implementation (RFC 2326).
//!
//! This module handles the text-based RTSP signaling protocol — parsing
//! requests, building responses, routing requests to servlets, and the SDP
//! bodies returned by DESCRIBE.
//!
//! ## RTSP message format (RFC 2326 §4)
//!
//! RTSP messages follow HTTP/1.1 syntax with a different method set:
//!
//! ```text
//! DESCRIBE rtsp://server/ RTSP/1.0\r\n
//! CSeq: 2\r\n
//! Accept: application/sdp\r\n
//! \r\n
//! ```
//!
//! Key differences from HTTP:
//! - Stateful: sessions persist across requests (RFC 2326 §3).
//! - Different methods: OPTIONS, DESCRIBE, SETUP, PLAY, TEARDOWN, ...
//! - The Session header carries a server-assigned id (RFC 2326 §12.37).
//!
//! ## Request routing
//!
//! The [`RequestDispatcher`] owns an ordered map of URL prefixes to
//! [`Servlet`]s and performs the checks common to every request (CSeq,
//! version, OPTIONS, the 4xx/5xx taxonomy). Servlets implement the subset
//! of methods they serve; everything else defaults to 405.

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod sdp;
pub mod servlet;

pub use dispatcher::RequestDispatcher;
pub use request::{Headers, Method, RtspRequest};
pub use response::RtspResponse;
pub use servlet::Servlet;
