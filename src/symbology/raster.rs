//! Grayscale raster buffer and PNG encoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{GrayImage, ImageEncoder, Luma};

use crate::error::EtiquetaError;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// An encoded raster image.
///
/// Keeps both the PNG bytes (for markup output) and the 1-byte-per-pixel
/// luma buffer (for printer graphic fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Luma pixels, row-major, 0 = black, 255 = white.
    pub pixels: Vec<u8>,
    /// PNG encoding of `pixels`.
    pub png: Vec<u8>,
}

impl RasterImage {
    /// `data:` URI suitable for an `<img src>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    /// Pack into 1-bit rows, MSB first, set bit = black.
    ///
    /// Returns `(bytes_per_row, data)`.
    pub fn to_packed_bits(&self) -> (usize, Vec<u8>) {
        let width = self.width as usize;
        let width_bytes = width.div_ceil(8);
        let mut data = vec![0u8; width_bytes * self.height as usize];
        for y in 0..self.height as usize {
            for x in 0..width {
                if self.pixels[y * width + x] < 128 {
                    data[y * width_bytes + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        (width_bytes, data)
    }
}

/// White canvas that barcodes and glyphs are drawn onto.
pub(crate) struct Canvas {
    img: GrayImage,
}

impl Canvas {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            img: GrayImage::from_pixel(width.max(1), height.max(1), Luma([WHITE])),
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.img.width()
    }

    pub(crate) fn height(&self) -> u32 {
        self.img.height()
    }

    /// Fill a rectangle black, clipped to the canvas.
    pub(crate) fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x_end = x.saturating_add(w).min(self.img.width());
        let y_end = y.saturating_add(h).min(self.img.height());
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                self.img.put_pixel(px, py, Luma([BLACK]));
            }
        }
    }

    /// Encode to PNG.
    pub(crate) fn finish(self) -> Result<RasterImage, EtiquetaError> {
        let (width, height) = self.img.dimensions();
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(self.img.as_raw(), width, height, image::ExtendedColorType::L8)
            .map_err(|e: image::ImageError| EtiquetaError::Image(e.to_string()))?;

        Ok(RasterImage {
            width,
            height,
            pixels: self.img.into_raw(),
            png,
        })
    }
}
