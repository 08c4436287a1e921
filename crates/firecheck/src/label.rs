//! Printable QR labels carrying a unit's code.
//!
//! Labels use the highest error correction level so a scratched or partly
//! covered sticker still scans.

use qrcode::render::svg;
use qrcode::{Color, EcLevel, QrCode};

use crate::error::Result;
use crate::model::normalize_code;
use crate::scan::LumaImage;

/// Modules of light margin around the symbol.
const QUIET_ZONE: usize = 4;

/// A QR label for one unit code.
#[derive(Clone)]
pub struct Label {
    code: String,
    symbol: QrCode,
}

impl Label {
    /// Encode the normalized form of `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Label`] if the code cannot be encoded.
    pub fn for_code(raw: &str) -> Result<Self> {
        let code = normalize_code(raw);
        let symbol = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::H)?;
        Ok(Self { code, symbol })
    }

    /// The encoded code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Symbol width in modules, without the quiet zone.
    #[must_use]
    pub fn modules(&self) -> usize {
        self.symbol.width()
    }

    /// Render as a standalone SVG document at least `min_size` pixels wide.
    #[must_use]
    pub fn to_svg(&self, min_size: u32) -> String {
        self.symbol
            .render::<svg::Color>()
            .min_dimensions(min_size, min_size)
            .quiet_zone(true)
            .build()
    }

    /// Rasterize to a luma image, `module_px` pixels per module.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidFrame`] for a zero `module_px`.
    pub fn to_luma(&self, module_px: u32) -> Result<LumaImage> {
        let colors = self.symbol.to_colors();
        let width = self.symbol.width();
        let scale = module_px as usize;
        let side = (width + 2 * QUIET_ZONE) * scale;

        let mut pixels = Vec::with_capacity(side * side);
        for y in 0..side {
            for x in 0..side {
                let dark = scale > 0
                    && module_at(x / scale, width)
                        .zip(module_at(y / scale, width))
                        .is_some_and(|(mx, my)| colors[my * width + mx] == Color::Dark);
                pixels.push(if dark { 0 } else { 255 });
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let side = side as u32;
        LumaImage::new(side.max(1), side.max(1), pixels)
    }
}

fn module_at(padded: usize, width: usize) -> Option<usize> {
    padded
        .checked_sub(QUIET_ZONE)
        .filter(|&module| module < width)
}

impl std::fmt::Debug for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Label")
            .field("code", &self.code)
            .field("modules", &self.modules())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{DecodeOptions, FrameDecoder, QrDecoder};

    #[test]
    fn test_label_encodes_normalized_code() {
        let label = Label::for_code(" fe-001 ").unwrap();
        assert_eq!(label.code(), "FE-001");
        assert!(label.modules() >= 21);
    }

    #[test]
    fn test_svg_output() {
        let svg = Label::for_code("FE-001").unwrap().to_svg(256);
        assert!(!svg.is_empty());
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_raster_has_quiet_zone() {
        let label = Label::for_code("FE-001").unwrap();
        let image = label.to_luma(2).unwrap();
        let side = (label.modules() + 2 * QUIET_ZONE) * 2;
        assert_eq!(image.width() as usize, side);
        assert!(image.pixels()[..side * QUIET_ZONE * 2].iter().all(|&p| p == 255));
        assert!(image.pixels().contains(&0));
    }

    #[test]
    fn test_rendered_label_decodes_back() {
        let label = Label::for_code("fe-001").unwrap();
        let image = label.to_luma(4).unwrap();
        assert_eq!(
            QrDecoder.decode(&image, DecodeOptions::default()).as_deref(),
            Some("FE-001")
        );
    }
}
