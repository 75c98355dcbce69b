//! MJPEG-over-RTP packetization (RFC 2435).
//!
//! A JPEG frame maps to one or more RTP packets. Only the entropy-coded
//! scan data travels in the payload; each fragment is prefixed by an 8-byte
//! JPEG payload header carrying the fragment offset and enough metadata
//! (type, quality, dimensions) for a receiver to reconstruct the image.
//! The RTP marker bit flags the last fragment of a frame, and all fragments
//! of a frame share one 90 kHz timestamp.
//!
//! This server produces baseline JPEG with type 1 (4:2:2 sampling, no
//! restart markers) and quality in 1..=99, so neither the restart-marker
//! header nor the inline quantization-table header is ever emitted.

use bytes::Bytes;

use super::rtp::{RtpHeader, RTP_HEADER_LEN};

/// Static RTP payload type assigned to JPEG (RFC 3551 §6).
pub const JPEG_PAYLOAD_TYPE: u8 = 26;

/// Upper bound on the scan-data bytes carried per RTP packet.
pub const MAX_FRAGMENT_BYTES: usize = 512;

const MARKER_PREFIX: u8 = 0xFF;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// The 8-byte JPEG payload header (RFC 2435 §3.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | Type-specific |              Fragment Offset                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Type     |       Q       |     Width     |     Height    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Width and height are carried in units of 8-pixel blocks. The fragment
/// offset is 24 bits, big-endian, counted from the start of the frame's
/// entropy-coded segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegHeader {
    pub type_specific: u8,
    /// Byte offset of this fragment within the entropy-coded segment.
    pub fragment_offset: u32,
    /// How the receiver recovers the image; 1 = 4:2:2, no restart markers.
    pub jpeg_type: u8,
    /// Quality factor; values ≥ 128 would require inline Q tables.
    pub quality: u8,
    /// Frame width / 8.
    pub width_blocks: u8,
    /// Frame height / 8.
    pub height_blocks: u8,
}

impl JpegHeader {
    pub const LEN: usize = 8;

    /// Serialize to the 8-byte wire form, big-endian throughout.
    pub fn write(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[0] = self.type_specific;
        bytes[1] = ((self.fragment_offset >> 16) & 0xFF) as u8;
        bytes[2] = ((self.fragment_offset >> 8) & 0xFF) as u8;
        bytes[3] = (self.fragment_offset & 0xFF) as u8;
        bytes[4] = self.jpeg_type;
        bytes[5] = self.quality;
        bytes[6] = self.width_blocks;
        bytes[7] = self.height_blocks;
        bytes
    }

    /// Parse the 8-byte wire form; `None` when the slice is too short.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::LEN {
            return None;
        }
        Some(Self {
            type_specific: data[0],
            fragment_offset: (u32::from(data[1]) << 16)
                | (u32::from(data[2]) << 8)
                | u32::from(data[3]),
            jpeg_type: data[4],
            quality: data[5],
            width_blocks: data[6],
            height_blocks: data[7],
        })
    }
}

/// One fragment of a JPEG frame: payload header plus scan-data bytes.
#[derive(Debug, Clone)]
pub struct MjpegPacket {
    pub header: JpegHeader,
    pub payload: Bytes,
}

impl MjpegPacket {
    /// Exactly 8 header bytes followed by the payload — this profile never
    /// emits restart-marker or quantization-table trailers.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(JpegHeader::LEN + self.payload.len());
        bytes.extend_from_slice(&self.header.write());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Locate the entropy-coded segment of a baseline JPEG: everything after
/// the SOS header through the EOI marker inclusive.
///
/// The SOS marker (`FF DA`) is followed by a 2-byte big-endian length that
/// counts itself, so scan data starts at `sos + 2 + length`. Returns `None`
/// when either marker is missing or the offsets are inconsistent.
pub fn entropy_segment(jpeg: &[u8]) -> Option<&[u8]> {
    let sos = jpeg
        .windows(2)
        .position(|w| w == [MARKER_PREFIX, SOS])?;
    if sos + 4 > jpeg.len() {
        return None;
    }

    let header_len = usize::from(u16::from_be_bytes([jpeg[sos + 2], jpeg[sos + 3]]));
    let start = sos + 2 + header_len;

    let eoi = jpeg.windows(2).rposition(|w| w == [MARKER_PREFIX, EOI])?;
    let end = eoi + 2;

    if start >= end {
        return None;
    }
    Some(&jpeg[start..end])
}

/// Split a JPEG frame into MJPEG packets of at most
/// [`MAX_FRAGMENT_BYTES`] payload bytes each.
///
/// Frames without a recognizable scan segment yield no packets and are
/// skipped silently. `width` and `height` must be the encoded frame's
/// pixel dimensions (multiples of 8).
pub fn pack_jpeg(jpeg: &[u8], quality: u8, width: u16, height: u16) -> Vec<MjpegPacket> {
    let Some(segment) = entropy_segment(jpeg) else {
        tracing::debug!(frame_bytes = jpeg.len(), "frame without scan data skipped");
        return Vec::new();
    };

    let mut packets = Vec::with_capacity(segment.len() / MAX_FRAGMENT_BYTES + 1);
    for (index, chunk) in segment.chunks(MAX_FRAGMENT_BYTES).enumerate() {
        packets.push(MjpegPacket {
            header: JpegHeader {
                type_specific: 0,
                fragment_offset: (index * MAX_FRAGMENT_BYTES) as u32,
                jpeg_type: 1,
                quality,
                width_blocks: (width / 8) as u8,
                height_blocks: (height / 8) as u8,
            },
            payload: Bytes::copy_from_slice(chunk),
        });
    }
    packets
}

/// Stateful packetizer for one MJPEG RTP stream.
///
/// Composes [`RtpHeader`] for sequencing, timestamps, and the SSRC; one
/// instance lives for the duration of a session. Each call to
/// [`packetize`](Self::packetize) converts a whole JPEG frame into wire-ready
/// RTP packets: the marker bit is set on the last fragment only, all
/// fragments share the frame's timestamp, and the timestamp advances by the
/// caller's 90 kHz increment afterwards.
#[derive(Debug)]
pub struct JpegPacketizer {
    header: RtpHeader,
    quality: u8,
    width: u16,
    height: u16,
}

impl JpegPacketizer {
    pub fn new(ssrc: u32, quality: u8, width: u16, height: u16) -> Self {
        Self {
            header: RtpHeader::new(JPEG_PAYLOAD_TYPE, ssrc),
            quality,
            width,
            height,
        }
    }

    /// New stream identity with a random SSRC (RFC 3550 §8.1).
    pub fn with_random_ssrc(quality: u8, width: u16, height: u16) -> Self {
        Self {
            header: RtpHeader::with_random_ssrc(JPEG_PAYLOAD_TYPE),
            quality,
            width,
            height,
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.header.ssrc
    }

    /// Packetize one JPEG frame into complete RTP packets.
    pub fn packetize(&mut self, jpeg: &[u8], timestamp_increment: u32) -> Vec<Vec<u8>> {
        let fragments = pack_jpeg(jpeg, self.quality, self.width, self.height);
        let mut packets = Vec::with_capacity(fragments.len());

        let last = fragments.len().saturating_sub(1);
        for (index, fragment) in fragments.iter().enumerate() {
            let rtp = self.header.write(index == last);
            let mut packet =
                Vec::with_capacity(RTP_HEADER_LEN + JpegHeader::LEN + fragment.payload.len());
            packet.extend_from_slice(&rtp);
            packet.extend_from_slice(&fragment.header.write());
            packet.extend_from_slice(&fragment.payload);
            packets.push(packet);
        }

        self.header.advance_timestamp(timestamp_increment);

        tracing::trace!(
            frame_bytes = jpeg.len(),
            rtp_packets = packets.len(),
            seq = self.header.sequence(),
            ts = self.header.timestamp(),
            "frame packetized"
        );

        packets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal baseline JPEG skeleton: SOI, SOS with an 8-byte header
    /// (length field 6 + component byte + 3 parameter bytes), the given
    /// scan bytes, EOI.
    fn jpeg_with_scan(scan: &[u8]) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x06, 0x01, 0x01, 0x00, 0x3F]);
        jpeg.extend_from_slice(scan);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn header_write_layout() {
        let header = JpegHeader {
            type_specific: 0,
            fragment_offset: 0x123456,
            jpeg_type: 1,
            quality: 50,
            width_blocks: 80,
            height_blocks: 60,
        };
        let bytes = header.write();
        assert_eq!(bytes, [0x00, 0x12, 0x34, 0x56, 0x01, 0x32, 0x50, 0x3C]);
    }

    #[test]
    fn header_parse_round_trips() {
        let header = JpegHeader {
            type_specific: 0,
            fragment_offset: 1024,
            jpeg_type: 1,
            quality: 75,
            width_blocks: 8,
            height_blocks: 6,
        };
        assert_eq!(JpegHeader::parse(&header.write()), Some(header));
        assert_eq!(JpegHeader::parse(&[0u8; 4]), None);
    }

    #[test]
    fn entropy_segment_spans_scan_through_eoi() {
        let scan = [0x11, 0x22, 0x33, 0x44, 0x55];
        let jpeg = jpeg_with_scan(&scan);
        let segment = entropy_segment(&jpeg).unwrap();
        assert_eq!(&segment[..scan.len()], &scan);
        assert_eq!(&segment[scan.len()..], &[0xFF, 0xD9]);
    }

    #[test]
    fn entropy_segment_missing_sos() {
        assert!(entropy_segment(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]).is_none());
    }

    #[test]
    fn entropy_segment_missing_eoi() {
        let mut jpeg = jpeg_with_scan(&[0x11, 0x22]);
        jpeg.truncate(jpeg.len() - 2);
        assert!(entropy_segment(&jpeg).is_none());
    }

    #[test]
    fn pack_jpeg_fragments_at_512() {
        // Scan of 1198 bytes + EOI = a 1200-byte entropy segment.
        let scan = vec![0xA5u8; 1198];
        let jpeg = jpeg_with_scan(&scan);
        assert_eq!(entropy_segment(&jpeg).unwrap().len(), 1200);

        let packets = pack_jpeg(&jpeg, 50, 640, 480);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].header.fragment_offset, 0);
        assert_eq!(packets[1].header.fragment_offset, 512);
        assert_eq!(packets[2].header.fragment_offset, 1024);
        assert_eq!(packets[0].payload.len(), 512);
        assert_eq!(packets[1].payload.len(), 512);
        assert_eq!(packets[2].payload.len(), 176);
    }

    #[test]
    fn pack_jpeg_payloads_reassemble_segment() {
        let scan: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        let jpeg = jpeg_with_scan(&scan);
        let segment = entropy_segment(&jpeg).unwrap().to_vec();

        let packets = pack_jpeg(&jpeg, 50, 640, 480);
        let mut reassembled = Vec::new();
        for packet in &packets {
            assert_eq!(packet.header.fragment_offset as usize, reassembled.len());
            assert!(packet.payload.len() <= MAX_FRAGMENT_BYTES);
            reassembled.extend_from_slice(&packet.payload);
        }
        assert_eq!(reassembled, segment);
    }

    #[test]
    fn pack_jpeg_header_fields() {
        let jpeg = jpeg_with_scan(&[0x01, 0x02, 0x03]);
        let packets = pack_jpeg(&jpeg, 50, 640, 480);
        assert_eq!(packets.len(), 1);
        let header = &packets[0].header;
        assert_eq!(header.type_specific, 0);
        assert_eq!(header.jpeg_type, 1);
        assert_eq!(header.quality, 50);
        assert_eq!(header.width_blocks, 80);
        assert_eq!(header.height_blocks, 60);
    }

    #[test]
    fn pack_jpeg_without_scan_yields_nothing() {
        assert!(pack_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9], 50, 640, 480).is_empty());
        assert!(pack_jpeg(&[], 50, 640, 480).is_empty());
    }

    #[test]
    fn mjpeg_packet_serializes_header_then_payload() {
        let jpeg = jpeg_with_scan(&[0x42; 16]);
        let packet = pack_jpeg(&jpeg, 50, 64, 48).remove(0);
        let bytes = packet.serialize();
        assert_eq!(bytes.len(), JpegHeader::LEN + packet.payload.len());
        assert_eq!(&bytes[..JpegHeader::LEN], &packet.header.write());
        assert_eq!(&bytes[JpegHeader::LEN..], &packet.payload[..]);
    }

    // --- RTP wrapping ---

    fn seq_of(packet: &[u8]) -> u16 {
        u16::from_be_bytes([packet[2], packet[3]])
    }

    fn ts_of(packet: &[u8]) -> u32 {
        u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]])
    }

    fn ssrc_of(packet: &[u8]) -> u32 {
        u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]])
    }

    #[test]
    fn packetize_sets_marker_on_last_fragment_only() {
        let mut p = JpegPacketizer::new(0x11223344, 50, 640, 480);
        let jpeg = jpeg_with_scan(&vec![0x5Au8; 1198]);
        let packets = p.packetize(&jpeg, 9000);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0][1] & 0x80, 0);
        assert_eq!(packets[1][1] & 0x80, 0);
        assert_eq!(packets[2][1] & 0x80, 0x80);
    }

    #[test]
    fn packetize_shares_timestamp_within_frame() {
        let mut p = JpegPacketizer::new(0x11223344, 50, 640, 480);
        let jpeg = jpeg_with_scan(&vec![0x5Au8; 1198]);
        let packets = p.packetize(&jpeg, 9000);
        let ts = ts_of(&packets[0]);
        assert!(packets.iter().all(|pk| ts_of(pk) == ts));
    }

    #[test]
    fn packetize_sequences_are_consecutive() {
        let mut p = JpegPacketizer::new(0x11223344, 50, 640, 480);
        let jpeg = jpeg_with_scan(&vec![0x5Au8; 2000]);
        let packets = p.packetize(&jpeg, 9000);
        for pair in packets.windows(2) {
            assert_eq!(seq_of(&pair[1]), seq_of(&pair[0]).wrapping_add(1));
        }
    }

    #[test]
    fn packetize_advances_timestamp_between_frames() {
        let mut p = JpegPacketizer::new(0x11223344, 50, 640, 480);
        let jpeg = jpeg_with_scan(&[0x5A; 100]);
        let first = p.packetize(&jpeg, 9000);
        let second = p.packetize(&jpeg, 9000);
        assert_eq!(ts_of(&second[0]), ts_of(&first[0]) + 9000);
    }

    #[test]
    fn packetize_keeps_ssrc_and_payload_type() {
        let mut p = JpegPacketizer::new(0xCAFEBABE, 50, 640, 480);
        let jpeg = jpeg_with_scan(&[0x5A; 100]);
        let mut packets = p.packetize(&jpeg, 9000);
        packets.extend(p.packetize(&jpeg, 9000));
        for packet in &packets {
            assert_eq!(packet[0] >> 6, 2);
            assert_eq!(packet[1] & 0x7F, JPEG_PAYLOAD_TYPE);
            assert_eq!(ssrc_of(packet), 0xCAFEBABE);
        }
    }

    #[test]
    fn packetize_embeds_jpeg_header_after_rtp() {
        let mut p = JpegPacketizer::new(0x1, 50, 64, 48);
        let jpeg = jpeg_with_scan(&[0x5A; 10]);
        let packets = p.packetize(&jpeg, 9000);
        let header = JpegHeader::parse(&packets[0][RTP_HEADER_LEN..]).unwrap();
        assert_eq!(header.fragment_offset, 0);
        assert_eq!(header.width_blocks, 8);
        assert_eq!(header.height_blocks, 6);
    }
}
