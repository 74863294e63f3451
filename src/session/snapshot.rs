//! Snapshot encoding
//!
//! Clients receive the latest frame as a JPEG, optionally rendered as a
//! `data:` URI for direct use in an `<img>` tag.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

use crate::capture::Frame;
use crate::error::{Error, Result};

/// Default JPEG quality for snapshots
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// A frame re-encoded for transport
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// JPEG file contents
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
    /// Sequence number of the source frame
    pub sequence: u64,
}

impl Snapshot {
    /// Encode an RGB frame as JPEG
    pub fn encode(frame: &Frame, quality: u8) -> Result<Self> {
        let mut buf = Vec::with_capacity(frame.len() / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder
            .encode(&frame.data, frame.width, frame.height, ColorType::Rgb8)
            .map_err(|e| Error::Encode(e.to_string()))?;

        Ok(Self {
            jpeg: Bytes::from(buf),
            width: frame.width,
            height: frame.height,
            sequence: frame.sequence,
        })
    }

    /// Render as `data:image/jpeg;base64,...`
    pub fn to_data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.jpeg))
    }
}
