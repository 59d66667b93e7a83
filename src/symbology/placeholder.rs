//! Degraded placeholder raster.
//!
//! Drawn when a value cannot be encoded in the requested symbology: a plain
//! white canvas with the value written in black bitmap text and no frame, so
//! it is never mistaken for a scannable symbol.

use spleen_font::{FONT_6X12, PSF2Font};

use super::raster::Canvas;

const GLYPH_WIDTH: usize = 6;
const GLYPH_HEIGHT: usize = 12;
const MARGIN: usize = 4;

/// Draw `text` as a placeholder on a `width` × `height` canvas.
///
/// The glyph scale is the largest integer that fits the text on one line;
/// text that does not fit at scale 1 is truncated.
pub fn draw(text: &str, width: u32, height: u32) -> Canvas {
    let mut canvas = Canvas::new(width, height);
    let chars: Vec<char> = text.chars().filter(|c| !c.is_control()).collect();
    if chars.is_empty() {
        return canvas;
    }

    let usable_w = (canvas.width() as usize).saturating_sub(2 * MARGIN);
    let usable_h = (canvas.height() as usize).saturating_sub(2 * MARGIN);
    let scale = (usable_w / (chars.len() * GLYPH_WIDTH))
        .min(usable_h / GLYPH_HEIGHT)
        .max(1);
    let fit = (usable_w / (GLYPH_WIDTH * scale)).min(chars.len());

    let text_h = GLYPH_HEIGHT * scale;
    let origin_y = (canvas.height() as usize).saturating_sub(text_h) / 2;

    let Ok(mut font) = PSF2Font::new(FONT_6X12) else {
        return canvas;
    };

    for (i, ch) in chars.iter().take(fit).enumerate() {
        let origin_x = MARGIN + i * GLYPH_WIDTH * scale;
        let utf8 = ch.to_string();
        let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) else {
            continue;
        };
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if on {
                    canvas.fill_rect(
                        (origin_x + col_x * scale) as u32,
                        (origin_y + row_y * scale) as u32,
                        scale as u32,
                        scale as u32,
                    );
                }
            }
        }
    }

    canvas
}
