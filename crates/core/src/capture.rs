//! Camera and encoder collaborator seams.
//!
//! The streaming worker treats frame capture and JPEG encoding as external
//! collaborators with narrow contracts: a [`FrameGrabber`] yields raw RGB
//! frames, a [`JpegEncoder`] turns one frame into a baseline JPEG byte
//! string. Production deployments plug in a real camera behind these traits;
//! the built-in [`TestPattern`] source and [`BaselineJpegEncoder`] make the
//! default binary and the test suite self-contained.
//!
//! Capture handles are created eagerly at startup and passed into the JPEG
//! servlet by value — an unavailable device fails construction, not the
//! first PLAY.

use std::time::{Duration, Instant};

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{Result, RtspError};

/// Video parameters shared by the camera, the encoder, and the SDP body.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Frame width in pixels, multiple of 8.
    pub width: u16,
    /// Frame height in pixels, multiple of 8.
    pub height: u16,
    /// Frames per second.
    pub fps: u32,
    /// JPEG quality factor, 1..=99 (values ≥ 100 would require inline
    /// quantization tables on the RTP wire).
    pub quality: u8,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RtspError::InvalidCaptureConfig(
                "width and height must be > 0".to_string(),
            ));
        }
        if self.width % 8 != 0 || self.height % 8 != 0 {
            return Err(RtspError::InvalidCaptureConfig(format!(
                "dimensions must be multiples of 8, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(RtspError::InvalidCaptureConfig(format!(
                "fps must be in 1..=120, got {}",
                self.fps
            )));
        }
        if self.quality == 0 || self.quality > 99 {
            return Err(RtspError::InvalidCaptureConfig(format!(
                "quality must be in 1..=99, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 10,
            quality: 50,
        }
    }
}

/// One captured frame: packed RGB24, row-major, `width * height * 3` bytes.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Bytes,
    pub width: u16,
    pub height: u16,
}

/// A camera: produces raw RGB frames at its own pace.
///
/// `grab` blocks until the next frame is due — pacing to the configured
/// frame rate is the source's concern, not the caller's.
pub trait FrameGrabber: Send {
    fn grab(&mut self) -> Result<RawFrame>;
}

/// A JPEG encoder: raw RGB frame in, baseline JPEG byte string out.
pub trait JpegEncoder: Send {
    fn encode(&mut self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>>;
}

/// Synthetic camera producing a scrolling color gradient.
///
/// Frames are generated on demand and paced to the configured fps with a
/// simple sleep, which is what keeps the streaming worker's transmit loop
/// at frame rate.
pub struct TestPattern {
    config: CaptureConfig,
    frame_index: u64,
    last_grab: Option<Instant>,
}

impl TestPattern {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            frame_index: 0,
            last_grab: None,
        }
    }

    fn pace(&mut self) {
        let interval = Duration::from_secs_f64(1.0 / f64::from(self.config.fps));
        if let Some(last) = self.last_grab {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_grab = Some(Instant::now());
    }
}

impl FrameGrabber for TestPattern {
    fn grab(&mut self) -> Result<RawFrame> {
        self.pace();

        let width = usize::from(self.config.width);
        let height = usize::from(self.config.height);
        let phase = (self.frame_index % 256) as usize;
        self.frame_index += 1;

        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * 255 / width + phase) % 256) as u8);
                data.push(((y * 255 / height) % 256) as u8);
                data.push((255 - phase) as u8);
            }
        }

        Ok(RawFrame {
            data: data.into(),
            width: self.config.width,
            height: self.config.height,
        })
    }
}

/// Baseline JPEG encoder backed by the `image` crate.
///
/// Quality maps directly onto the libjpeg-style 1..=99 scale the RTP
/// payload header carries.
pub struct BaselineJpegEncoder;

impl JpegEncoder for BaselineJpegEncoder {
    fn encode(&mut self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>> {
        let expected = usize::from(frame.width) * usize::from(frame.height) * 3;
        if frame.data.len() != expected {
            return Err(RtspError::Encode(format!(
                "frame is {} bytes, expected {} for {}x{} RGB",
                frame.data.len(),
                expected,
                frame.width,
                frame.height
            )));
        }

        let mut jpeg = Vec::new();
        ImageJpegEncoder::new_with_quality(&mut jpeg, quality)
            .write_image(
                &frame.data,
                u32::from(frame.width),
                u32::from(frame.height),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| RtspError::Encode(e.to_string()))?;
        Ok(jpeg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::mjpeg;

    fn small_config() -> CaptureConfig {
        CaptureConfig {
            width: 64,
            height: 48,
            fps: 60,
            quality: 50,
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = small_config();
        cfg.width = 70;
        assert!(cfg.validate().is_err());

        let mut cfg = small_config();
        cfg.fps = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = small_config();
        cfg.quality = 100;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_pattern_emits_rgb_frames() {
        let mut source = TestPattern::new(small_config());
        let frame = source.grab().unwrap();
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.data.len(), 64 * 48 * 3);
    }

    #[test]
    fn test_pattern_frames_change_over_time() {
        let mut source = TestPattern::new(small_config());
        let first = source.grab().unwrap();
        let second = source.grab().unwrap();
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn encoder_produces_packetizable_jpeg() {
        let mut source = TestPattern::new(small_config());
        let frame = source.grab().unwrap();
        let jpeg = BaselineJpegEncoder.encode(&frame, 50).unwrap();

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "missing SOI");
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9], "missing EOI");
        let segment = mjpeg::entropy_segment(&jpeg).expect("scan data");
        assert!(!segment.is_empty());
    }

    #[test]
    fn encoder_rejects_size_mismatch() {
        let frame = RawFrame {
            data: Bytes::from_static(&[0u8; 12]),
            width: 64,
            height: 48,
        };
        assert!(BaselineJpegEncoder.encode(&frame, 50).is_err());
    }
}
