//! # pirtsp — RTSP server library for live MJPEG streaming
//!
//! A Rust library for publishing a live MJPEG video stream over the
//! Real-Time Streaming Protocol, delivering frames as fragmented RTP
//! packets with payload type 26.
//!
//! ## Protocol references
//!
//! | RFC | Topic | How this crate uses it |
//! |-----|-------|----------------------|
//! | [RFC 2326](https://tools.ietf.org/html/rfc2326) | RTSP 1.0 | Request/response parsing, servlet dispatch, session lifecycle, transport negotiation |
//! | [RFC 3550](https://tools.ietf.org/html/rfc3550) | RTP | Fixed header format, SSRC generation, sequence/timestamp semantics |
//! | [RFC 2435](https://tools.ietf.org/html/rfc2435) | JPEG RTP payload | Entropy-segment fragmentation, 8-byte JPEG payload header, marker bit |
//! | [RFC 4566](https://tools.ietf.org/html/rfc4566) | SDP | Session description bodies for DESCRIBE responses |
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │  Server       — accept loop, orchestrator │
//! ├───────────────────────────────────────────┤
//! │  Dispatcher   — URL prefix → Servlet      │
//! │  JpegServlet  — session state + worker    │
//! ├───────────────────────────────────────────┤
//! │  Protocol     — RTSP parsing, SDP         │
//! │  Media        — RTP header, packetizer    │
//! ├───────────────────────────────────────────┤
//! │  Transport    — TCP signaling, UDP media  │
//! │  Capture      — camera/encoder seams      │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pirtsp::capture::{BaselineJpegEncoder, CaptureConfig, TestPattern};
//! use pirtsp::{JpegServlet, RequestDispatcher, Server, ServerConfig};
//!
//! let config = Arc::new(ServerConfig::default());
//! let capture = CaptureConfig::default();
//!
//! let servlet = JpegServlet::new(
//!     Box::new(TestPattern::new(capture.clone())),
//!     Box::new(BaselineJpegEncoder),
//!     capture,
//!     config.clone(),
//! ).unwrap();
//!
//! let mut dispatcher = RequestDispatcher::new();
//! dispatcher.register_servlet("/", Arc::new(servlet));
//!
//! let mut server = Server::new("0.0.0.0:5544", config, dispatcher);
//! server.start().unwrap();
//! // ffplay rtsp://<host>:5544/  — SETUP targets /track1 per the SDP.
//! ```
//!
//! ## Crate layout
//!
//! - [`server`] — [`Server`] orchestrator and [`ServerConfig`].
//! - [`protocol`] — RTSP request/response codec, [`RequestDispatcher`],
//!   [`Servlet`] trait, SDP model.
//! - [`servlets`] — the [`JpegServlet`] streaming core.
//! - [`session`] — session state machine and Transport-header parsing.
//! - [`media`] — RTP header writer and the RFC 2435 MJPEG packetizer.
//! - [`transport`] — TCP accept/connection loop, per-session RTP sender.
//! - [`capture`] — camera and JPEG-encoder collaborator seams.
//! - [`error`] — [`RtspError`] and [`Result`] alias.

pub mod capture;
pub mod error;
pub mod media;
pub mod protocol;
pub mod server;
pub mod servlets;
pub mod session;
pub mod transport;

pub use error::{Result, RtspError};
pub use protocol::{RequestDispatcher, Servlet};
pub use server::{Server, ServerConfig, DEFAULT_RTSP_PORT};
pub use servlets::JpegServlet;
