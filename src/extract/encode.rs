//! Raster encoding.

use super::ExtractError;
use image::{ImageFormat, RgbaImage};

/// Encoded bytes plus the MIME type that describes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

pub trait Encoder: Send + Sync {
    fn encode(&self, pixels: &RgbaImage) -> Result<EncodedImage, ExtractError>;
}

/// Lossless PNG, encoded in memory. No disk I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl Encoder for PngEncoder {
    fn encode(&self, pixels: &RgbaImage) -> Result<EncodedImage, ExtractError> {
        let mut bytes = Vec::new();
        pixels.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(EncodedImage {
            mime: "image/png",
            bytes,
        })
    }
}
