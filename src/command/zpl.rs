//! # ZPL Command Builders
//!
//! Builders for the subset of ZPL II used by label output, plus the
//! [`Zpl`] command language that lays a bound label out with them.
//!
//! ## Label structure
//!
//! ```text
//! ^XA                      start of label
//! ^CI28                    UTF-8 field data
//! ^LH0,0                   label home
//! ^PW400                   print width (dots)
//! ^LL240                   label length (dots)
//! ^FO80,80^A0N,25,25^FB640,1,0,L,0^FH^FDSKU-001^FS
//! ^FO80,320^BY2,3,64^BCN,64,Y,N,N^FH^FDSKU-001^FS
//! ^PQ2                     print quantity
//! ^XZ                      end of label
//! ```
//!
//! ## Field data escaping
//!
//! Every field is preceded by `^FH`, which makes `_` the hex escape
//! indicator. `^`, `~`, `_`, `\`, control characters and every byte of a
//! non-ASCII character are written as `_XX`, so the stream stays ASCII and
//! field data can never start a new command.
//!
//! ## Element mapping
//!
//! | Element | Command | Notes |
//! |---------|---------|-------|
//! | text | `^A0N` + `^FB` | alignment and wrapping via field block |
//! | barcode | `^BC` `^B3` `^BA` `^BE` `^B8` `^B2` | by symbology |
//! | qr | `^BQN,2,m` | data prefixed `MA,` (level M, automatic mode) |
//! | line, box | `^GB` | |
//! | table | text rows joined with ` \| ` | degraded |
//! | image | none | omitted |
//!
//! A barcode whose value the symbology cannot represent, or whose symbology
//! has no native command, is printed as the encoder's placeholder raster in
//! a `^GFA` graphic field and reported as degraded.

use std::fmt::Write;

use tracing::debug;

use super::{CommandLanguage, CommandOutput};
use crate::binder::{BoundElement, BoundLabel, Content};
use crate::printer::PrinterConfig;
use crate::symbology::matrix::qr_modules;
use crate::symbology::{BarcodeEncoder, EncodingResult, RasterImage, Symbology};
use crate::template::{ElementKind, TextAlign};

/// Narrow bar width in dots for 1D barcodes.
pub const MODULE_WIDTH: u32 = 2;

/// Wide-to-narrow ratio for Code39 and ITF.
pub const WIDE_RATIO: f32 = 3.0;

/// Largest QR magnification factor.
const MAX_QR_MAGNIFICATION: u32 = 10;

/// Share of a barcode element's height given to the bars; the rest holds
/// the interpretation line.
const BAR_HEIGHT_RATIO: f64 = 0.8;

// ============================================================================
// LABEL FRAMING
// ============================================================================

/// `^XA` start, UTF-8 encoding, home at origin, label size.
pub fn start(width_dots: u32, length_dots: u32) -> String {
    format!("^XA\n^CI28\n^LH0,0\n^PW{}\n^LL{}\n", width_dots, length_dots)
}

/// `^PQ` print quantity and `^XZ` end.
pub fn end(copies: u32) -> String {
    format!("^PQ{}\n^XZ\n", copies.max(1))
}

/// `^FO` field origin.
pub fn field_origin(x: u32, y: u32) -> String {
    format!("^FO{},{}", x, y)
}

/// `^FH^FD` data `^FS`, hex-escaped.
pub fn field_data(data: &str) -> String {
    format!("^FH^FD{}^FS", escape(data))
}

/// `^FH^FD` data `^FS` inside a `^FB` block: each line escaped, newlines
/// become the block's `\&` line break.
pub fn block_field_data(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| escape(line.strip_suffix('\r').unwrap_or(line)))
        .collect();
    format!("^FH^FD{}^FS", lines.join("\\&"))
}

/// Hex-escape field data for `^FH` (indicator `_`).
pub fn escape(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let mut buf = [0u8; 4];
    for c in data.chars() {
        let special = matches!(c, '^' | '~' | '_' | '\\') || c.is_control() || !c.is_ascii();
        if special {
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "_{:02X}", byte);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// TEXT
// ============================================================================

/// `^A0N` scalable font, height and width in dots.
pub fn font(height: u32, width: u32) -> String {
    format!("^A0N,{},{}", height.max(1), width.max(1))
}

/// `^FB` field block: wraps at `width` dots over at most `lines` lines.
pub fn field_block(width: u32, lines: u32, align: TextAlign) -> String {
    let justify = match align {
        TextAlign::Left => 'L',
        TextAlign::Center => 'C',
        TextAlign::Right => 'R',
    };
    format!("^FB{},{},0,{},0", width.max(1), lines.max(1), justify)
}

// ============================================================================
// BARCODES
// ============================================================================

/// `^BY` module width, ratio and default height.
pub fn barcode_defaults(module_width: u32, ratio: f32, height: u32) -> String {
    format!("^BY{},{:.1},{}", module_width, ratio, height.max(1))
}

/// Native 1D barcode command, if the symbology has one.
///
/// The interpretation line is printed below the bars.
pub fn barcode_command(symbology: &Symbology, height: u32) -> Option<String> {
    let h = height.max(1);
    let cmd = match symbology {
        Symbology::Code128 => format!("^BCN,{},Y,N,N", h),
        Symbology::Code39 => format!("^B3N,N,{},Y,N", h),
        Symbology::Code93 => format!("^BAN,{},Y,N,N", h),
        Symbology::Ean13 => format!("^BEN,{},Y,N", h),
        Symbology::Ean8 => format!("^B8N,{},Y,N", h),
        Symbology::Itf => format!("^B2N,{},Y,N,N", h),
        Symbology::Qr | Symbology::Other(_) => return None,
    };
    Some(cmd)
}

/// `^BQN` QR code, model 2.
pub fn qr_command(magnification: u32) -> String {
    format!("^BQN,2,{}", magnification.clamp(1, MAX_QR_MAGNIFICATION))
}

/// QR field data: error correction M, automatic input mode.
pub fn qr_field_data(data: &str) -> String {
    format!("^FH^FDMA,{}^FS", escape(data))
}

// ============================================================================
// GRAPHICS
// ============================================================================

/// `^GB` graphic box. A box no taller than its border is a horizontal line.
pub fn graphic_box(width: u32, height: u32, thickness: u32) -> String {
    let t = thickness.max(1);
    format!("^GB{},{},{}^FS", width.max(t), height.max(t), t)
}

/// `^GFA` graphic field from a raster, ASCII hex.
pub fn graphic_field(image: &RasterImage) -> String {
    let (bytes_per_row, data) = image.to_packed_bits();
    let mut out = format!("^GFA,{},{},{},", data.len(), data.len(), bytes_per_row);
    out.reserve(data.len() * 2 + 3);
    for byte in &data {
        let _ = write!(out, "{:02X}", byte);
    }
    out.push_str("^FS");
    out
}

// ============================================================================
// LANGUAGE
// ============================================================================

/// ZPL II command language.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zpl;

/// Per-label state while emitting commands.
struct Emitter<'a> {
    printer: &'a PrinterConfig,
    encoder: &'a dyn BarcodeEncoder,
    out: String,
    degraded: Vec<usize>,
    omitted: Vec<usize>,
}

impl Emitter<'_> {
    fn dots(&self, px: f32) -> u32 {
        self.printer.px_to_dots(px as f64)
    }

    fn element(&mut self, bound: &BoundElement<'_>) {
        let element = bound.element;
        let (x, y) = (self.dots(element.x), self.dots(element.y));
        let (w, h) = (self.dots(element.width), self.dots(element.height));

        match (&element.kind, &bound.content) {
            (ElementKind::Image { .. }, _) => self.omitted.push(bound.index),
            (ElementKind::Line { thickness }, _) => {
                let t = self.dots(*thickness as f32).max(1);
                let _ = writeln!(self.out, "{}{}", field_origin(x, y), graphic_box(w, t, t));
            }
            (ElementKind::Box { thickness }, _) => {
                let t = self.dots(*thickness as f32).max(1);
                let _ = writeln!(self.out, "{}{}", field_origin(x, y), graphic_box(w, h, t));
            }
            (_, Content::Text(text)) => self.text(bound, x, y, w, h, text),
            (_, Content::Table(rows)) => {
                self.degraded.push(bound.index);
                let row_h = (h / rows.len().max(1) as u32).max(1);
                for (r, row) in rows.iter().enumerate() {
                    let line = row.join(" | ");
                    self.text(bound, x, y + r as u32 * row_h, w, row_h, &line);
                }
            }
            (_, Content::Code { value, symbology }) => self.code(bound.index, x, y, w, h, value, symbology),
            (_, Content::Image { .. }) | (_, Content::Graphic) => self.omitted.push(bound.index),
        }
    }

    fn text(&mut self, bound: &BoundElement<'_>, x: u32, y: u32, w: u32, h: u32, text: &str) {
        if text.is_empty() {
            return;
        }
        let style = &bound.element.style;
        let font_h = self.dots(style.font_size).max(1);
        let lines = (h / font_h).max(text.lines().count() as u32).max(1);
        let _ = writeln!(
            self.out,
            "{}{}{}{}",
            field_origin(x, y),
            font(font_h, font_h),
            field_block(w, lines, style.text_align),
            block_field_data(text)
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn code(&mut self, index: usize, x: u32, y: u32, w: u32, h: u32, value: &str, symbology: &Symbology) {
        // The encoder decides whether the value is representable
        let result = match self.encoder.encode(value, symbology, w.max(1), h.max(1)) {
            None => return,
            Some(result) => result,
        };

        let origin = field_origin(x, y);
        if let EncodingResult::Degraded { image, .. } = &result {
            self.degraded.push(index);
            let _ = writeln!(self.out, "{}{}", origin, graphic_field(image));
            return;
        }

        if symbology.is_matrix() {
            let magnification = match qr_modules(value) {
                Ok(qr) => w.min(h) / (qr.width as u32 + 8).max(1),
                Err(_) => 1,
            };
            let _ = writeln!(self.out, "{}{}{}", origin, qr_command(magnification), qr_field_data(value));
            return;
        }

        let bar_h = ((h as f64 * BAR_HEIGHT_RATIO).round() as u32).max(1);
        match barcode_command(symbology, bar_h) {
            Some(cmd) => {
                let _ = writeln!(
                    self.out,
                    "{}{}{}{}",
                    origin,
                    barcode_defaults(MODULE_WIDTH, WIDE_RATIO, bar_h),
                    cmd,
                    field_data(value)
                );
            }
            None => {
                self.degraded.push(index);
                let _ = writeln!(self.out, "{}{}", origin, graphic_field(result.image()));
            }
        }
    }
}

impl CommandLanguage for Zpl {
    fn name(&self) -> &'static str {
        "ZPL"
    }

    fn render(
        &self,
        label: &BoundLabel<'_>,
        copies: u32,
        printer: &PrinterConfig,
        encoder: &dyn BarcodeEncoder,
    ) -> CommandOutput {
        let template = label.template;
        let mut emitter = Emitter {
            printer,
            encoder,
            out: start(
                printer.mm_to_dots(template.label_width_mm as f64),
                printer.mm_to_dots(template.label_height_mm as f64),
            ),
            degraded: Vec::new(),
            omitted: Vec::new(),
        };

        for bound in &label.elements {
            emitter.element(bound);
        }
        emitter.out.push_str(&end(copies));

        debug!(
            template = %template.id,
            bytes = emitter.out.len(),
            degraded = emitter.degraded.len(),
            omitted = emitter.omitted.len(),
            "commands rendered"
        );

        CommandOutput {
            bytes: emitter.out.into_bytes(),
            degraded: emitter.degraded,
            omitted: emitter.omitted,
        }
    }
}
