//! The extracted payload handed to the relay.

use super::encode::EncodedImage;
use crate::dataurl;
use image::RgbaImage;

/// Logical tag for what a payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    CroppedRegion,
}

/// An encoded still image produced by one committed selection.
///
/// Fields are private; a payload never changes after it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPayload {
    kind: PayloadKind,
    width: u32,
    height: u32,
    encoded: EncodedImage,
}

impl ExtractedPayload {
    pub(crate) fn cropped_region(width: u32, height: u32, encoded: EncodedImage) -> Self {
        Self {
            kind: PayloadKind::CroppedRegion,
            width,
            height,
            encoded,
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime(&self) -> &'static str {
        self.encoded.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.encoded.bytes
    }

    /// Self-describing `data:<mime>;base64,<payload>` string.
    pub fn to_data_url(&self) -> String {
        dataurl::encode(self.encoded.mime, &self.encoded.bytes)
    }

    /// Decode the PNG back into pixels.
    pub fn decode_rgba(&self) -> Result<RgbaImage, image::ImageError> {
        Ok(image::load_from_memory(&self.encoded.bytes)?.to_rgba8())
    }
}
