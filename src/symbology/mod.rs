//! # Symbology Encoder
//!
//! Renders barcode and QR values to PNG rasters for the markup renderer and
//! for printer graphic fields.
//!
//! ## Supported Symbologies
//!
//! | Symbology | Character set |
//! |-----------|---------------|
//! | Code128 | Full printable ASCII (set B) |
//! | Code39 | A-Z, 0-9, space, `-.$/+%` |
//! | Code93 | Full ASCII |
//! | EAN-13 | 12 or 13 digits |
//! | EAN-8 | 7 or 8 digits |
//! | ITF | Even number of digits |
//! | QR | Any text |
//!
//! ## Degraded output
//!
//! [`encode`] never fails. An empty or whitespace value yields `None`. A
//! value the symbology cannot represent, or a symbology name that is not in
//! the table above, yields [`EncodingResult::Degraded`]: a white raster with
//! the value printed as plain black text. Degraded rasters are not
//! scannable and callers should surface the flag.
//!
//! ```
//! use etiqueta::symbology::{encode, EncodingResult, Symbology};
//!
//! assert!(encode("   ", &Symbology::Code128, 200, 80).is_none());
//!
//! let result = encode("SKU-001", &Symbology::Code128, 200, 80).unwrap();
//! assert!(matches!(result, EncodingResult::Encoded(_)));
//! ```

pub mod linear;
pub mod matrix;
pub mod placeholder;
pub mod raster;

pub use raster::RasterImage;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

// ============================================================================
// SYMBOLOGY
// ============================================================================

/// Barcode encoding scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Code93,
    Ean13,
    Ean8,
    Itf,
    Qr,
    /// A name no encoder exists for. Always renders degraded.
    Other(String),
}

impl Symbology {
    /// Parse a symbology name, ignoring case, spaces, `-` and `_`.
    ///
    /// ```
    /// use etiqueta::symbology::Symbology;
    ///
    /// assert_eq!(Symbology::parse("EAN-13"), Symbology::Ean13);
    /// assert_eq!(Symbology::parse("QR Code"), Symbology::Qr);
    /// assert_eq!(Symbology::parse("code_128"), Symbology::Code128);
    /// ```
    pub fn parse(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "code128" => Self::Code128,
            "code39" => Self::Code39,
            "code93" => Self::Code93,
            "ean13" | "jan13" => Self::Ean13,
            "ean8" | "jan8" => Self::Ean8,
            "itf" | "interleaved2of5" => Self::Itf,
            "qr" | "qrcode" => Self::Qr,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Canonical display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Code128 => "Code128",
            Self::Code39 => "Code39",
            Self::Code93 => "Code93",
            Self::Ean13 => "EAN-13",
            Self::Ean8 => "EAN-8",
            Self::Itf => "ITF",
            Self::Qr => "QR Code",
            Self::Other(name) => name,
        }
    }

    /// True for 2D matrix symbologies.
    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Qr)
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Symbology {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Symbology> for String {
    fn from(symbology: Symbology) -> Self {
        symbology.name().to_string()
    }
}

// ============================================================================
// ENCODING
// ============================================================================

/// Result of encoding a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingResult {
    /// A scannable symbol.
    Encoded(RasterImage),
    /// Placeholder text raster; `reason` says why encoding failed.
    Degraded { image: RasterImage, reason: String },
}

impl EncodingResult {
    /// The raster, whichever variant.
    pub fn image(&self) -> &RasterImage {
        match self {
            Self::Encoded(image) | Self::Degraded { image, .. } => image,
        }
    }

    /// True when the placeholder fallback was used.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Largest raster side in pixels; larger requests are clamped.
pub const MAX_RASTER_SIDE: u32 = 4096;

/// Encode `value` as `symbology` on a `width_px` × `height_px` raster.
///
/// Pure in `(value, symbology, width_px, height_px)`: identical arguments
/// produce byte-identical PNGs. Each side is clamped to
/// `1..=`[`MAX_RASTER_SIDE`].
pub fn encode(
    value: &str,
    symbology: &Symbology,
    width_px: u32,
    height_px: u32,
) -> Option<EncodingResult> {
    if value.trim().is_empty() {
        return None;
    }
    let width = width_px.clamp(1, MAX_RASTER_SIDE);
    let height = height_px.clamp(1, MAX_RASTER_SIDE);

    let canvas = match symbology {
        Symbology::Qr => matrix::qr_modules(value).map(|qr| matrix::draw(&qr, width, height)),
        Symbology::Other(name) => Err(format!("unsupported symbology {:?}", name)),
        linear_kind => {
            linear::modules(linear_kind, value).map(|bars| linear::draw(&bars, width, height))
        }
    };

    let reason = match canvas.and_then(|c| c.finish().map_err(|e| e.to_string())) {
        Ok(image) => return Some(EncodingResult::Encoded(image)),
        Err(reason) => reason,
    };

    warn!(symbology = %symbology, %reason, "barcode encoding degraded to placeholder");
    let image = placeholder::draw(value, width, height)
        .finish()
        .unwrap_or_else(|e| {
            warn!(error = %e, "placeholder raster could not be encoded");
            RasterImage {
                width: 0,
                height: 0,
                pixels: Vec::new(),
                png: Vec::new(),
            }
        });
    Some(EncodingResult::Degraded { image, reason })
}

// ============================================================================
// ENCODER SEAM
// ============================================================================

/// Anything that can turn a value into a symbol raster.
///
/// Renderers take this instead of calling [`encode`] directly so a job can
/// share one cache across copies and records.
pub trait BarcodeEncoder: Send + Sync {
    fn encode(
        &self,
        value: &str,
        symbology: &Symbology,
        width_px: u32,
        height_px: u32,
    ) -> Option<EncodingResult>;
}

/// Encoder that always encodes afresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEncoder;

impl BarcodeEncoder for DirectEncoder {
    fn encode(
        &self,
        value: &str,
        symbology: &Symbology,
        width_px: u32,
        height_px: u32,
    ) -> Option<EncodingResult> {
        encode(value, symbology, width_px, height_px)
    }
}

/// Cache key for encoded rasters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub value: String,
    pub symbology: Symbology,
    pub width: u32,
    pub height: u32,
}

/// Memoizing encoder keyed by [`Fingerprint`].
///
/// Holds at most `capacity` entries; once full, new results are returned
/// without being stored.
pub struct SymbologyCache {
    entries: Mutex<HashMap<Fingerprint, Option<EncodingResult>>>,
    capacity: usize,
}

impl SymbologyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SymbologyCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl BarcodeEncoder for SymbologyCache {
    fn encode(
        &self,
        value: &str,
        symbology: &Symbology,
        width_px: u32,
        height_px: u32,
    ) -> Option<EncodingResult> {
        let key = Fingerprint {
            value: value.to_string(),
            symbology: symbology.clone(),
            width: width_px,
            height: height_px,
        };

        if let Ok(entries) = self.entries.lock() {
            if let Some(hit) = entries.get(&key) {
                debug!(value, symbology = %symbology, "symbology cache hit");
                return hit.clone();
            }
        }

        let result = encode(value, symbology, width_px, height_px);

        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() < self.capacity {
                entries.insert(key, result.clone());
            }
        }
        result
    }
}
