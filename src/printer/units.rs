//! # Unit Conversion
//!
//! Templates are laid out in CSS pixels, labels are sized in millimeters and
//! thermal print heads address dots. This module converts between the three.
//!
//! ```text
//! dots = mm × dpi / 25.4
//! dots = px × dpi / (px_per_mm × 25.4)
//!
//! For a 203 DPI head and the 96 DPI CSS reference:
//!   50mm  → 400 dots
//!   10px  → 21 dots
//! ```
//!
//! All conversions into dots round half up. Each element is converted from
//! its own template coordinates, never from a previously rounded neighbour,
//! so rounding error does not accumulate across a label.

/// Default thermal print head resolution.
pub const DEFAULT_DPI: u16 = 203;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// CSS reference pixels per millimeter (96 px per inch).
pub const CSS_PX_PER_MM: f64 = 96.0 / MM_PER_INCH;

/// Absorbs binary representation error (e.g. 25.4) so that exact halves
/// round up consistently.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Round a non-negative dot value half up. Negative and NaN inputs clamp to 0.
#[inline]
pub fn round_half_up(value: f64) -> u32 {
    if !(value > 0.0) {
        return 0;
    }
    let rounded = (value + 0.5 + ROUNDING_EPSILON).floor();
    if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Dots per millimeter for a resolution.
#[inline]
pub fn dots_per_mm(dpi: u16) -> f64 {
    dpi as f64 / MM_PER_INCH
}

/// Convert millimeters to printer dots.
///
/// ```
/// use etiqueta::printer::units::mm_to_dots;
///
/// assert_eq!(mm_to_dots(50.0, 203), 400);
/// assert_eq!(mm_to_dots(25.4, 300), 300);
/// ```
pub fn mm_to_dots(mm: f64, dpi: u16) -> u32 {
    round_half_up(mm * dpi as f64 / MM_PER_INCH)
}

/// Convert template pixels to printer dots.
///
/// `px_per_mm_reference` is the pixel density the template was designed at,
/// normally [`CSS_PX_PER_MM`].
pub fn px_to_dots(px: f64, dpi: u16, px_per_mm_reference: f64) -> u32 {
    if !(px_per_mm_reference > 0.0) {
        return 0;
    }
    round_half_up(px * dpi as f64 / (px_per_mm_reference * MM_PER_INCH))
}

/// Convert template pixels to millimeters.
pub fn px_to_mm(px: f64, px_per_mm_reference: f64) -> f64 {
    if px_per_mm_reference > 0.0 {
        px / px_per_mm_reference
    } else {
        0.0
    }
}

/// Convert millimeters to template pixels.
pub fn mm_to_px(mm: f64, px_per_mm_reference: f64) -> f64 {
    mm * px_per_mm_reference
}

/// Convert printer dots back to millimeters.
pub fn dots_to_mm(dots: u32, dpi: u16) -> f64 {
    if dpi == 0 {
        return 0.0;
    }
    dots as f64 / dots_per_mm(dpi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_dots_203() {
        // 50 × 203 / 25.4 = 399.6
        assert_eq!(mm_to_dots(50.0, 203), 400);
        // 30 × 203 / 25.4 = 239.76
        assert_eq!(mm_to_dots(30.0, 203), 240);
        assert_eq!(mm_to_dots(25.4, 203), 203);
        assert_eq!(mm_to_dots(0.0, 203), 0);
    }

    #[test]
    fn test_round_half_up_on_exact_halves() {
        // 1.5px × 254 / (10 × 25.4) = 1.5
        assert_eq!(px_to_dots(1.5, 254, 10.0), 2);
        // 2.5 rounds up too, not to even
        assert_eq!(px_to_dots(2.5, 254, 10.0), 3);
        assert_eq!(round_half_up(0.49), 0);
        assert_eq!(round_half_up(0.5), 1);
    }

    #[test]
    fn test_px_to_dots_css_reference() {
        // 96px is one inch
        assert_eq!(px_to_dots(96.0, 203, CSS_PX_PER_MM), 203);
        assert_eq!(px_to_dots(10.0, 203, CSS_PX_PER_MM), 21);
    }

    #[test]
    fn test_negative_and_invalid_inputs_clamp() {
        assert_eq!(mm_to_dots(-3.0, 203), 0);
        assert_eq!(px_to_dots(f64::NAN, 203, CSS_PX_PER_MM), 0);
        assert_eq!(px_to_dots(10.0, 203, 0.0), 0);
    }

    #[test]
    fn test_no_drift_across_many_elements() {
        // Converting each element independently never strays more than
        // half a dot from the exact position.
        for i in 0..200 {
            let px = i as f64 * 7.3;
            let exact = px * 203.0 / (CSS_PX_PER_MM * MM_PER_INCH);
            let dots = px_to_dots(px, 203, CSS_PX_PER_MM) as f64;
            assert!((dots - exact).abs() <= 0.5 + 1e-6, "px {} drifted", px);
        }
    }

    #[test]
    fn test_mm_px_round_trip() {
        let px = mm_to_px(50.0, CSS_PX_PER_MM);
        assert!((px_to_mm(px, CSS_PX_PER_MM) - 50.0).abs() < 1e-9);
        assert!((dots_to_mm(203, 203) - 25.4).abs() < 1e-9);
    }
}
