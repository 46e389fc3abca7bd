//! Pixel transcoding between in-memory rasters and the service's wire format.
//!
//! Everything here is pure: no I/O, identical input gives identical output.

use crate::error::{Result, RetroError};
use crate::models::{EncodedPayload, RawImage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

const DATA_URL_MARKER: &str = ";base64,";

#[derive(Debug, Clone, Copy)]
pub struct PixelCodec {
    background: [u8; 3],
    filter: FilterType,
}

impl Default for PixelCodec {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            filter: FilterType::Triangle,
        }
    }
}

impl PixelCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour that transparent pixels are composited onto.
    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Scales `image` so its longest side is exactly `max_dimension`.
    ///
    /// Images that already fit are returned untouched.
    pub fn resize(&self, image: RawImage, max_dimension: u32) -> RawImage {
        let max_dimension = max_dimension.max(1);
        let (width, height) = image.dimensions();
        let longest = width.max(height);
        if longest <= max_dimension {
            return image;
        }

        let scale = f64::from(max_dimension) / f64::from(longest);
        let new_width = scale_side(width, longest, max_dimension, scale);
        let new_height = scale_side(height, longest, max_dimension, scale);

        if image.is_empty() {
            return RawImage::new(new_width, new_height);
        }

        log::debug!(
            "Resizing {}x{} -> {}x{} (scale {:.4})",
            width,
            height,
            new_width,
            new_height,
            scale
        );
        RawImage::from_buffer(imageops::resize(
            image.as_buffer(),
            new_width,
            new_height,
            self.filter,
        ))
    }

    /// Source-over composite onto the opaque background, dropping alpha.
    pub fn flatten(&self, image: &RawImage) -> RgbImage {
        let background = self.background;
        let source = image.as_buffer();
        RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let pixel = source.get_pixel(x, y);
            let alpha = u16::from(pixel[3]);
            let blend = |channel: u8, under: u8| -> u8 {
                ((u16::from(channel) * alpha + u16::from(under) * (255 - alpha) + 127) / 255) as u8
            };
            Rgb([
                blend(pixel[0], background[0]),
                blend(pixel[1], background[1]),
                blend(pixel[2], background[2]),
            ])
        })
    }

    pub fn flatten_and_encode(&self, image: &RawImage) -> Result<EncodedPayload> {
        if image.is_empty() {
            return Err(RetroError::Encoding(format!(
                "Cannot rasterize a {}x{} image",
                image.width(),
                image.height()
            )));
        }

        let flattened = DynamicImage::ImageRgb8(self.flatten(image));
        let bytes = write_png(&flattened)?;

        Ok(EncodedPayload {
            width: image.width(),
            height: image.height(),
            data: STANDARD.encode(bytes),
        })
    }

    /// PNG bytes of `image` with its alpha channel kept.
    pub fn encode_png(&self, image: &RawImage) -> Result<Vec<u8>> {
        if image.is_empty() {
            return Err(RetroError::Encoding("Cannot encode an empty image".into()));
        }
        write_png(&DynamicImage::ImageRgba8(image.as_buffer().clone()))
    }

    /// Materializes a base64 image returned by the service. A leading
    /// `data:<mime>;base64,` prefix is accepted.
    pub fn decode_image(&self, data: &str) -> Result<RawImage> {
        let data = data.trim();
        let data = match data.find(DATA_URL_MARKER) {
            Some(index) if data.starts_with("data:") => &data[index + DATA_URL_MARKER.len()..],
            _ => data,
        };

        let bytes = STANDARD
            .decode(data)
            .map_err(|e| RetroError::Decoding(format!("Invalid base64 image data: {}", e)))?;
        self.decode_bytes(&bytes)
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<RawImage> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RetroError::Decoding(format!("Unreadable image data: {}", e)))?;
        Ok(RawImage::from_buffer(decoded.to_rgba8()))
    }
}

fn scale_side(side: u32, longest: u32, max_dimension: u32, scale: f64) -> u32 {
    if side == longest {
        return max_dimension;
    }
    if side == 0 {
        return 0;
    }
    ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension)
}

fn write_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RetroError::Encoding(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RawImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
            }
        }
        RawImage::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_resize_is_identity_when_image_fits() {
        let codec = PixelCodec::new();
        for (w, h) in [(256, 256), (100, 40), (1, 256)] {
            let image = gradient(w, h);
            let resized = codec.resize(image.clone(), 256);
            assert_eq!(resized, image);
        }
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let codec = PixelCodec::new();
        for (w, h, max) in [(1024, 768, 256), (300, 1000, 128), (513, 97, 64), (4000, 3, 500)] {
            let resized = codec.resize(gradient(w, h), max);
            let (nw, nh) = resized.dimensions();
            assert_eq!(nw.max(nh), max, "{}x{} -> {}x{}", w, h, nw, nh);

            let scale = f64::from(max) / f64::from(w.max(h));
            assert!((f64::from(nw) - f64::from(w) * scale).abs() <= 1.0);
            assert!((f64::from(nh) - f64::from(h) * scale).abs() <= 1.0);
        }
    }

    #[test]
    fn test_resize_is_deterministic() {
        let codec = PixelCodec::new();
        let a = codec.resize(gradient(640, 480), 200);
        let b = codec.resize(gradient(640, 480), 200);
        assert_eq!(a, b);
    }

    #[test]
    fn test_flatten_composites_over_background() {
        let image = RawImage::from_rgba(
            3,
            1,
            vec![
                255, 0, 0, 255, // opaque red
                255, 255, 255, 0, // fully transparent
                200, 100, 0, 128, // half transparent
            ],
        )
        .unwrap();

        let black = PixelCodec::new().flatten(&image);
        assert_eq!(black.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(black.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(black.get_pixel(2, 0).0, [100, 50, 0]);

        let white = PixelCodec::new().with_background([255, 255, 255]).flatten(&image);
        assert_eq!(white.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(white.get_pixel(2, 0).0, [227, 177, 127]);
    }

    #[test]
    fn test_flatten_and_encode_produces_rgb_png() {
        let codec = PixelCodec::new();
        let payload = codec
            .flatten_and_encode(&RawImage::filled(4, 2, [10, 20, 30, 0]))
            .unwrap();
        assert_eq!((payload.width, payload.height), (4, 2));

        let bytes = STANDARD.decode(payload.as_str()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!(decoded.to_rgb8().get_pixel(3, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_flatten_and_encode_is_deterministic() {
        let codec = PixelCodec::new();
        let image = gradient(37, 23);
        let first = codec.flatten_and_encode(&image).unwrap();
        let second = codec.flatten_and_encode(&image).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_area_image_is_an_encoding_error() {
        let codec = PixelCodec::new();
        let err = codec.flatten_and_encode(&RawImage::new(0, 16)).unwrap_err();
        assert!(matches!(err, RetroError::Encoding(_)));
        assert!(codec.encode_png(&RawImage::new(16, 0)).is_err());
    }

    #[test]
    fn test_decode_image_reads_service_payloads() {
        let codec = PixelCodec::new();
        let original = RawImage::filled(5, 3, [9, 8, 7, 255]);
        let png = codec.encode_png(&original).unwrap();
        let b64 = STANDARD.encode(&png);

        assert_eq!(codec.decode_image(&b64).unwrap(), original);
        let data_url = format!("data:image/png;base64,{}", b64);
        assert_eq!(codec.decode_image(&data_url).unwrap(), original);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        let codec = PixelCodec::new();
        assert!(matches!(
            codec.decode_image("not base64!!"),
            Err(RetroError::Decoding(_))
        ));
        assert!(matches!(
            codec.decode_image(&STANDARD.encode(b"plain text")),
            Err(RetroError::Decoding(_))
        ));
    }
}
