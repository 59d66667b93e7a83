//! 1D barcode encoding.
//!
//! Uses the barcoders crate for module patterns and draws them onto a canvas
//! of the requested size.

use barcoders::sym::code39::Code39;
use barcoders::sym::code93::Code93;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::tf::TF;

use super::Symbology;
use super::raster::Canvas;

/// Modules of quiet zone kept on each side of the bars.
const QUIET_ZONE: usize = 10;

/// Encode a value into bar modules (1 = bar, 0 = space).
pub fn modules(symbology: &Symbology, value: &str) -> Result<Vec<u8>, String> {
    let encoded = match symbology {
        // Character set B covers upper and lower case, digits and punctuation.
        Symbology::Code128 => Code128::new(&format!("\u{0181}{}", value)).map(|b| b.encode()),
        Symbology::Code39 => Code39::new(value).map(|b| b.encode()),
        Symbology::Code93 => Code93::new(value).map(|b| b.encode()),
        Symbology::Ean13 => EAN13::new(value).map(|b| b.encode()),
        Symbology::Ean8 => EAN8::new(value).map(|b| b.encode()),
        Symbology::Itf => TF::interleaved(value).map(|b| b.encode()),
        Symbology::Qr | Symbology::Other(_) => {
            return Err(format!("{} is not a linear symbology", symbology));
        }
    };

    encoded.map_err(|e| format!("{} cannot encode {:?}: {}", symbology, value, e))
}

/// Draw bar modules scaled to fill `width` × `height`.
///
/// Each module is the same whole number of pixels wide and the bars are
/// centered. When the modules plus quiet zone do not fit, the canvas grows to
/// one pixel per module instead of dropping bars.
pub fn draw(modules: &[u8], width: u32, height: u32) -> Canvas {
    let total = modules.len() + 2 * QUIET_ZONE;
    let module_px = (width as usize / total.max(1)).max(1);
    let canvas_width = (width as usize).max(total * module_px) as u32;

    let mut canvas = Canvas::new(canvas_width, height);
    let bars_width = modules.len() * module_px;
    let start_x = (canvas.width() as usize - bars_width) / 2;

    for (i, &module) in modules.iter().enumerate() {
        if module == 1 {
            canvas.fill_rect(
                (start_x + i * module_px) as u32,
                0,
                module_px as u32,
                canvas.height(),
            );
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_encoding() {
        let bars = modules(&Symbology::Code128, "SKU-001").unwrap();
        assert!(!bars.is_empty());
        assert!(bars.iter().any(|&b| b == 1));
    }

    #[test]
    fn test_code39_rejects_invalid_characters() {
        assert!(modules(&Symbology::Code39, "HELLO").is_ok());
        assert!(modules(&Symbology::Code39, "HEL@LO").is_err());
    }

    #[test]
    fn test_ean13_rejects_letters() {
        assert!(modules(&Symbology::Ean13, "750103131130").is_ok());
        assert!(modules(&Symbology::Ean13, "ABC").is_err());
    }

    #[test]
    fn test_qr_is_not_linear() {
        assert!(modules(&Symbology::Qr, "x").is_err());
    }

    #[test]
    fn test_draw_scales_modules() {
        let canvas = draw(&[1, 0, 1], 230, 10);
        // 23 modules with quiet zone → 10px per module
        assert_eq!(canvas.width(), 230);
        let raster = canvas.finish().unwrap();
        let black = raster.pixels.iter().filter(|&&p| p == 0).count();
        assert_eq!(black, 2 * 10 * 10);
    }

    #[test]
    fn test_draw_grows_when_too_narrow() {
        let bars = vec![1u8; 100];
        let canvas = draw(&bars, 50, 10);
        assert_eq!(canvas.width(), 120);
    }
}
