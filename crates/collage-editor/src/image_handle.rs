//! Decoded user images and PNG encoding.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Encoded form kept alongside a decoded image, ready for embedding in a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedFormat {
    Png,
    Jpeg,
    Gif,
}

impl EmbedFormat {
    pub fn mime(self) -> &'static str {
        match self {
            EmbedFormat::Png => "image/png",
            EmbedFormat::Jpeg => "image/jpeg",
            EmbedFormat::Gif => "image/gif",
        }
    }
}

struct ImageData {
    id: u64,
    width: u32,
    height: u32,
    format: EmbedFormat,
    bytes: Vec<u8>,
}

/// Opaque reference to a decoded user image. Cloning is cheap; clones share
/// the same pixels and compare equal.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<ImageData>,
}

impl ImageHandle {
    /// Decode an image file. PNG, JPEG and GIF keep their original bytes;
    /// other formats are re-encoded as PNG.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = (decoded.width(), decoded.height());
        let (format, bytes) = match format {
            ImageFormat::Png => (EmbedFormat::Png, bytes),
            ImageFormat::Jpeg => (EmbedFormat::Jpeg, bytes),
            ImageFormat::Gif => (EmbedFormat::Gif, bytes),
            _ => (EmbedFormat::Png, encode_png(&decoded.to_rgba8())?),
        };
        Ok(Self::new(width, height, format, bytes))
    }

    pub fn from_rgba(pixels: &RgbaImage) -> Result<Self, image::ImageError> {
        let bytes = encode_png(pixels)?;
        Ok(Self::new(pixels.width(), pixels.height(), EmbedFormat::Png, bytes))
    }

    fn new(width: u32, height: u32, format: EmbedFormat, bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(ImageData {
                id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
                width,
                height,
                format,
                bytes,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn format(&self) -> EmbedFormat {
        self.inner.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ImageHandle {}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.inner.id)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("format", &self.inner.format)
            .finish()
    }
}

/// Lossless RGBA8 encoding.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        pixels.as_raw(),
        pixels.width(),
        pixels.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn round_trips_through_png() {
        let pixels = RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255]));
        let handle = ImageHandle::from_rgba(&pixels).unwrap();
        assert_eq!((handle.width(), handle.height()), (4, 3));
        let again = ImageHandle::decode(handle.bytes().to_vec()).unwrap();
        assert_eq!(again.format(), EmbedFormat::Png);
        assert_eq!((again.width(), again.height()), (4, 3));
        assert_ne!(handle, again);
        assert_eq!(handle, handle.clone());
    }

    #[test]
    fn rejects_garbage() {
        assert!(ImageHandle::decode(b"not an image".to_vec()).is_err());
        assert!(ImageHandle::decode(Vec::new()).is_err());
    }
}
