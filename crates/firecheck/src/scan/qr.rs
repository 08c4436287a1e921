//! QR symbol decoding backed by `rqrr`.

use tracing::trace;

use super::decoder::{DecodeOptions, FrameDecoder};
use super::frame::LumaImage;

/// Reads dark-on-light QR symbols.
///
/// Wrap it in [`super::BothPolarities`] to also read inverted labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl FrameDecoder for QrDecoder {
    fn decode(&self, image: &LumaImage, _options: DecodeOptions) -> Option<String> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let pixels = image.pixels();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
                pixels[y * width + x]
            });

        prepared.detect_grids().into_iter().find_map(|grid| match grid.decode() {
            Ok((_meta, content)) => Some(content),
            Err(error) => {
                trace!(error = ?error, "QR grid found but not decodable");
                None
            }
        })
    }
}
