//! In-memory pixel source backed by the `image` crate.

use super::{ExtractError, PixelSource};
use crate::geometry::NativeRect;
use image::{DynamicImage, RgbaImage};

/// A decoded image held in memory.
///
/// `readable = false` models a source whose pixels the host refuses to
/// expose (a cross-origin image in a browser canvas).
pub struct ImageSource {
    pixels: RgbaImage,
    readable: bool,
}

impl ImageSource {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            pixels: image.to_rgba8(),
            readable: true,
        }
    }

    /// Decode an image file from disk.
    pub fn open(path: &std::path::Path) -> Result<Self, ExtractError> {
        let image = image::open(path).map_err(|e| {
            ExtractError::SourceUnreadable(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self::new(image))
    }

    /// Same pixels, but every read fails.
    pub fn tainted(mut self) -> Self {
        self.readable = false;
        self
    }
}

impl PixelSource for ImageSource {
    fn native_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn read_pixels(&self, rect: NativeRect) -> Result<RgbaImage, ExtractError> {
        if !self.readable {
            return Err(ExtractError::SourceUnreadable(
                "pixel access denied by host".to_string(),
            ));
        }
        Ok(image::imageops::crop_imm(&self.pixels, rect.x, rect.y, rect.width, rect.height).to_image())
    }
}
