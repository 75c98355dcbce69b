use rand::Rng;

/// RTP clock rate for video payloads, including JPEG (RFC 2435 §3).
pub const RTP_CLOCK_HZ: u32 = 90_000;

/// Size of the fixed RTP header this server emits (no CSRC, no extension).
pub const RTP_HEADER_LEN: usize = 12;

/// Timestamp increment per frame for a given frame rate:
/// `round(90000 / fps)`.
pub fn timestamp_step(fps: u32) -> u32 {
    (f64::from(RTP_CLOCK_HZ) / f64::from(fps)).round() as u32
}

/// Stateful RTP fixed-header writer (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// One instance exists per RTP stream. It manages:
/// - **Sequence number**: 16-bit, wrapping — incremented on every packet.
/// - **Timestamp**: stored as u64 internally to avoid wrapping arithmetic
///   in duration calculations; the lower 32 bits go on the wire. All
///   fragments of one frame share a timestamp; the packetizer advances it
///   once per frame.
/// - **SSRC**: random per stream (RFC 3550 §8.1).
///
/// Version is always 2. Padding, extension, and CSRC count are always 0.
/// The marker bit is payload-defined; for JPEG it flags the final fragment
/// of a frame (RFC 2435 §3.1).
#[derive(Debug)]
pub struct RtpHeader {
    /// RTP payload type (7-bit, RFC 3551).
    pub pt: u8,
    /// Synchronization source identifier.
    pub ssrc: u32,
    sequence: u16,
    timestamp: u64,
}

impl RtpHeader {
    /// Create header state with an explicit SSRC.
    pub fn new(pt: u8, ssrc: u32) -> Self {
        tracing::debug!(
            pt,
            ssrc = format_args!("{:#010X}", ssrc),
            "RTP header state created"
        );
        Self {
            pt,
            ssrc,
            sequence: 0,
            timestamp: 0,
        }
    }

    /// Create with a random SSRC, minimizing the collision probability
    /// between independent streams (RFC 3550 §8.1).
    pub fn with_random_ssrc(pt: u8) -> Self {
        let ssrc = rand::rng().random::<u32>();
        Self::new(pt, ssrc)
    }

    /// Sequence number the next [`write`](Self::write) call will emit.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Current timestamp (internal u64 representation).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Serialize a 12-byte RTP fixed header and advance the sequence number.
    pub fn write(&mut self, marker: bool) -> [u8; RTP_HEADER_LEN] {
        let first_byte: u8 = 2 << 6;
        let second_byte: u8 = ((marker as u8) << 7) | self.pt;

        let mut header = [0u8; RTP_HEADER_LEN];
        header[0] = first_byte;
        header[1] = second_byte;
        header[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        header[4..8].copy_from_slice(&(self.timestamp as u32).to_be_bytes());
        header[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        self.sequence = self.sequence.wrapping_add(1);
        header
    }

    /// Advance the timestamp by the given 90 kHz increment.
    /// Called once per frame, after all of the frame's fragments are written.
    pub fn advance_timestamp(&mut self, increment: u32) {
        self.timestamp = self.timestamp.wrapping_add(u64::from(increment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> RtpHeader {
        RtpHeader::new(26, 0xAABBCCDD)
    }

    #[test]
    fn version_is_2() {
        let mut h = make_header();
        let buf = h.write(false);
        assert_eq!(buf[0] >> 6, 2);
    }

    #[test]
    fn padding_extension_csrc_all_zero() {
        let mut h = make_header();
        let buf = h.write(false);
        assert_eq!(buf[0] & 0x3F, 0);
    }

    #[test]
    fn marker_bit() {
        let mut h = make_header();
        let no_marker = h.write(false);
        assert_eq!(no_marker[1] & 0x80, 0);

        let with_marker = h.write(true);
        assert_eq!(with_marker[1] & 0x80, 0x80);
    }

    #[test]
    fn payload_type() {
        let mut h = make_header();
        let buf = h.write(false);
        assert_eq!(buf[1] & 0x7f, 26);
    }

    #[test]
    fn sequence_increments() {
        let mut h = make_header();
        let b1 = h.write(false);
        let seq1 = u16::from_be_bytes([b1[2], b1[3]]);
        let b2 = h.write(false);
        let seq2 = u16::from_be_bytes([b2[2], b2[3]]);
        assert_eq!(seq2, seq1 + 1);
    }

    #[test]
    fn sequence_wraps() {
        let mut h = make_header();
        h.sequence = u16::MAX;
        let buf = h.write(false);
        let seq = u16::from_be_bytes([buf[2], buf[3]]);
        assert_eq!(seq, u16::MAX);
        assert_eq!(h.sequence(), 0);
    }

    #[test]
    fn ssrc_written_big_endian() {
        let mut h = make_header();
        let buf = h.write(false);
        let ssrc = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        assert_eq!(ssrc, 0xAABBCCDD);
    }

    #[test]
    fn timestamp_advance() {
        let mut h = make_header();
        h.advance_timestamp(9000);
        assert_eq!(h.timestamp(), 9000);
        h.advance_timestamp(9000);
        assert_eq!(h.timestamp(), 18000);
    }

    #[test]
    fn random_ssrc_differs() {
        let h1 = RtpHeader::with_random_ssrc(26);
        let h2 = RtpHeader::with_random_ssrc(26);
        assert_ne!(h1.ssrc, h2.ssrc);
    }

    #[test]
    fn timestamp_step_rounds() {
        assert_eq!(timestamp_step(10), 9000);
        assert_eq!(timestamp_step(30), 3000);
        assert_eq!(timestamp_step(25), 3600);
        // 90000 / 7 = 12857.14... rounds down
        assert_eq!(timestamp_step(7), 12857);
    }
}
