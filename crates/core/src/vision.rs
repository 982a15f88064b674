//! Vision feed images and pointer position.

use crate::protocol::ProtocolError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Unknown,
}

impl ImageFormat {
    fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            ImageFormat::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Unknown => "unknown",
        }
    }
}

/// A decoded frame from the agent's vision pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionImage {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl VisionImage {
    /// Decode a base64 image, with or without a `data:` URL prefix.
    pub fn from_base64(encoded: &str) -> Result<Self, ProtocolError> {
        let trimmed = encoded.trim();
        let data = match trimmed.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => trimmed,
        };

        if data.is_empty() {
            return Err(ProtocolError::EmptyImage);
        }

        let bytes = STANDARD.decode(data)?;
        let format = ImageFormat::sniff(&bytes);
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Last reported pointer position on the agent's screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}
