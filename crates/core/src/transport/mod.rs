//! Network transport layer for RTSP signaling and RTP media delivery.
//!
//! RTSP uses a split transport model:
//!
//! - **TCP** ([`tcp`]): carries RTSP request/response signaling. One TCP
//!   connection per client, with a thread per connection.
//!
//! - **UDP** ([`udp`]): carries RTP media packets. The streaming worker
//!   opens one [`udp::RtpSender`] per session, bound to the advertised
//!   server RTP port and connected to the client's declared endpoint.

pub mod tcp;
pub mod udp;

pub use udp::RtpSender;
