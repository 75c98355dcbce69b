//! RTP media-plane building blocks.
//!
//! [`rtp`] owns the generic RFC 3550 fixed header — sequencing, timestamps,
//! SSRC — and [`mjpeg`] builds the RFC 2435 JPEG payload on top of it:
//! entropy-segment extraction, 512-byte fragmentation, and the per-stream
//! [`mjpeg::JpegPacketizer`] that turns whole JPEG frames into wire-ready
//! RTP packets.

pub mod mjpeg;
pub mod rtp;

pub use mjpeg::{JpegPacketizer, JPEG_PAYLOAD_TYPE};
pub use rtp::RtpHeader;
