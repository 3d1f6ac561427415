//! Extraction domain — public API.
//!
//! Turns a finalized native-space rectangle into a standalone PNG.
//! Pixel access goes through the `PixelSource` capability so any raster
//! backend can sit behind it; encoding goes through `Encoder`.

mod encode;
mod payload;
mod source;

pub use encode::{EncodedImage, Encoder, PngEncoder};
pub use payload::{ExtractedPayload, PayloadKind};
pub use source::ImageSource;

use crate::geometry::NativeRect;
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Pixel data cannot be read (e.g. a cross-origin tainted image).
    #[error("source pixels are unreadable: {0}")]
    SourceUnreadable(String),
    #[error("region has zero area")]
    EmptyRegion,
    #[error("PNG encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Read access to a visual's native pixel grid.
pub trait PixelSource: Send + Sync {
    /// Intrinsic width and height. Fixed for the source's lifetime.
    fn native_size(&self) -> (u32, u32);

    /// Copy exactly `rect.width × rect.height` pixels starting at
    /// `(rect.x, rect.y)`. `rect` is already inside the native grid.
    fn read_pixels(&self, rect: NativeRect) -> Result<RgbaImage, ExtractError>;
}

/// Crop `rect` out of `source` and encode it.
///
/// The rectangle is clipped to the native grid first; if nothing is left
/// the call fails with `EmptyRegion` without touching the source.
pub fn extract<S: PixelSource + ?Sized>(
    source: &S,
    rect: NativeRect,
    encoder: &dyn Encoder,
) -> Result<ExtractedPayload, ExtractError> {
    let start = std::time::Instant::now();

    let (native_w, native_h) = source.native_size();
    let rect = rect.clipped_to(native_w, native_h);
    if rect.is_empty() {
        return Err(ExtractError::EmptyRegion);
    }

    let pixels = source.read_pixels(rect)?;
    let read_ms = start.elapsed().as_millis();

    let encoded = encoder.encode(&pixels)?;
    log::info!(
        "[EXTRACT] Cropped region ({}x{} at {},{}) in {}ms, encoded {} bytes in {}ms",
        rect.width,
        rect.height,
        rect.x,
        rect.y,
        read_ms,
        encoded.bytes.len(),
        start.elapsed().as_millis() - read_ms
    );

    Ok(ExtractedPayload::cropped_region(
        rect.width,
        rect.height,
        encoded,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> ImageSource {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        ImageSource::new(img.into())
    }

    #[test]
    fn extract_copies_exact_region() {
        let source = gradient(64, 48);
        let payload = extract(&source, NativeRect::new(10, 5, 20, 8), &PngEncoder).unwrap();
        assert_eq!((payload.width(), payload.height()), (20, 8));

        let decoded = payload.decode_rgba().unwrap();
        assert_eq!(decoded.dimensions(), (20, 8));
        for (x, y, px) in decoded.enumerate_pixels() {
            assert_eq!(*px, Rgba([(x + 10) as u8, (y + 5) as u8, (x + 10 + y + 5) as u8, 255]));
        }
    }

    #[test]
    fn extract_is_deterministic() {
        let source = gradient(32, 32);
        let rect = NativeRect::new(3, 4, 10, 11);
        let a = extract(&source, rect, &PngEncoder).unwrap();
        let b = extract(&source, rect, &PngEncoder).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn extract_clips_overhanging_rect() {
        let source = gradient(16, 16);
        let payload = extract(&source, NativeRect::new(10, 10, 50, 50), &PngEncoder).unwrap();
        assert_eq!((payload.width(), payload.height()), (6, 6));
    }

    #[test]
    fn empty_region_is_rejected() {
        let source = gradient(16, 16);
        let err = extract(&source, NativeRect::new(4, 4, 0, 3), &PngEncoder).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyRegion));
    }

    #[test]
    fn unreadable_source_fails() {
        let source = gradient(16, 16).tainted();
        let err = extract(&source, NativeRect::new(0, 0, 4, 4), &PngEncoder).unwrap_err();
        assert!(matches!(err, ExtractError::SourceUnreadable(_)));
    }
}
