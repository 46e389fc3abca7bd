use crate::error::{Result, RetroError};
use crate::models::CostEstimate;
use image::{Rgba, RgbaImage};

/// An owned RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    buffer: RgbaImage,
}

impl RawImage {
    /// Fully transparent image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbaImage::new(width, height),
        }
    }

    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(Self::from_buffer)
            .ok_or_else(|| {
                RetroError::Encoding(format!(
                    "Pixel buffer of {} bytes does not match {}x{} RGBA ({} bytes)",
                    actual, width, height, expected
                ))
            })
    }

    pub fn from_buffer(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.buffer.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn as_buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn into_buffer(self) -> RgbaImage {
        self.buffer
    }
}

/// Base64 text of a PNG-encoded, alpha-free RGB raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub width: u32,
    pub height: u32,
    pub data: String,
}

impl EncodedPayload {
    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn into_string(self) -> String {
        self.data
    }
}

/// Image plus the accounting the service reported alongside it.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image: RawImage,
    pub cost: Option<CostEstimate>,
    pub remaining_balance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(RawImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        let err = RawImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, RetroError::Encoding(_)));
    }

    #[test]
    fn test_accessors() {
        let image = RawImage::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.as_raw().len(), 24);
        assert!(!image.is_empty());
        assert!(RawImage::new(0, 5).is_empty());
    }
}
