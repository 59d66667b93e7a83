//! QR code encoding.

use qrcode::{Color, EcLevel, QrCode};

use super::raster::Canvas;

/// Modules of quiet zone kept around the symbol.
const QUIET_ZONE: usize = 4;

/// Encoded QR symbol: `width` × `width` dark/light modules.
pub struct QrModules {
    pub width: usize,
    pub dark: Vec<bool>,
}

/// Encode a value as a QR symbol at error correction level M.
pub fn qr_modules(value: &str) -> Result<QrModules, String> {
    let code = QrCode::with_error_correction_level(value, EcLevel::M)
        .map_err(|e| format!("QR code generation failed: {}", e))?;

    let width = code.width();
    let mut dark = Vec::with_capacity(width * width);
    for y in 0..width {
        for x in 0..width {
            dark.push(code[(x, y)] == Color::Dark);
        }
    }

    Ok(QrModules { width, dark })
}

/// Draw a QR symbol centered on a `width` × `height` canvas.
///
/// The cell size is the largest whole number of pixels that fits the
/// shorter side; the canvas grows to one pixel per module when even that
/// does not fit.
pub fn draw(qr: &QrModules, width: u32, height: u32) -> Canvas {
    let total = qr.width + 2 * QUIET_ZONE;
    let side = width.min(height) as usize;
    let cell = (side / total).max(1);
    let symbol_px = total * cell;

    let mut canvas = Canvas::new(width.max(symbol_px as u32), height.max(symbol_px as u32));
    let origin_x = (canvas.width() as usize - symbol_px) / 2 + QUIET_ZONE * cell;
    let origin_y = (canvas.height() as usize - symbol_px) / 2 + QUIET_ZONE * cell;

    for qy in 0..qr.width {
        for qx in 0..qr.width {
            if qr.dark[qy * qr.width + qx] {
                canvas.fill_rect(
                    (origin_x + qx * cell) as u32,
                    (origin_y + qy * cell) as u32,
                    cell as u32,
                    cell as u32,
                );
            }
        }
    }

    canvas
}
