//! Image loading and data management

use std::path::PathBuf;

use image::GenericImageView;

use crate::{PaintError, Result};

/// Where an image node's pixels come from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Raw straight-alpha RGBA pixels
    Rgba {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// Encoded image bytes (PNG)
    Encoded(Vec<u8>),
    /// Image file on disk
    File(PathBuf),
}

impl ImageSource {
    /// Decode the source (synchronous)
    pub fn load(&self) -> Result<ImageData> {
        match self {
            ImageSource::Rgba {
                data,
                width,
                height,
            } => ImageData::from_rgba(data.clone(), *width, *height),
            ImageSource::Encoded(bytes) => ImageData::from_bytes(bytes),
            ImageSource::File(path) => {
                let data = std::fs::read(path)
                    .map_err(|e| PaintError::ImageLoad(format!("{}: {}", path.display(), e)))?;
                ImageData::from_bytes(&data)
            }
        }
    }
}

/// Decoded image data
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Straight-alpha RGBA pixel data
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageData {
    /// Create ImageData from raw RGBA pixels
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected_len = width as usize * height as usize * 4;
        if pixels.len() != expected_len {
            return Err(PaintError::ImageDecode(format!(
                "Invalid pixel data length: expected {}, got {}",
                expected_len,
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Decode an encoded image
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|e| PaintError::ImageDecode(e.to_string()))?;
        let (width, height) = img.dimensions();
        let pixels = img.to_rgba8().into_raw();
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixels with color channels multiplied by alpha
    pub fn premultiplied(&self) -> Vec<u8> {
        let mut out = self.pixels.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_length_checked() {
        assert!(ImageData::from_rgba(vec![0; 16], 2, 2).is_ok());
        let err = ImageData::from_rgba(vec![0; 15], 2, 2).unwrap_err();
        assert!(matches!(err, PaintError::ImageDecode(_)));
    }

    #[test]
    fn test_decode_png() {
        let mut encoded = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();
        let data = ImageSource::Encoded(encoded).load().unwrap();
        assert_eq!((data.width(), data.height()), (3, 2));
        assert_eq!(&data.pixels()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(ImageData::from_bytes(&[1, 2, 3]).is_err());
        assert!(matches!(
            ImageSource::File("/nonexistent/image.png".into()).load(),
            Err(PaintError::ImageLoad(_))
        ));
    }

    #[test]
    fn test_premultiply() {
        let data = ImageData::from_rgba(vec![255, 128, 0, 128], 1, 1).unwrap();
        assert_eq!(data.premultiplied(), vec![128, 64, 0, 128]);
    }
}
