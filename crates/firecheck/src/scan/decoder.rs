//! The black-box symbol decoder and polarity handling.

use super::frame::LumaImage;

/// Options passed with every decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Attempt both dark-on-light and light-on-dark symbols.
    pub try_both_polarities: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            try_both_polarities: true,
        }
    }
}

/// Extracts a candidate identifier string from a preprocessed image.
///
/// Implementations are best effort: `None` means nothing was recognized in
/// this frame, not an error.
pub trait FrameDecoder {
    /// Decode a symbol from `image`.
    fn decode(&self, image: &LumaImage, options: DecodeOptions) -> Option<String>;
}

impl<F> FrameDecoder for F
where
    F: Fn(&LumaImage, DecodeOptions) -> Option<String>,
{
    fn decode(&self, image: &LumaImage, options: DecodeOptions) -> Option<String> {
        self(image, options)
    }
}

/// Adds inverted-image retries to a decoder that only reads one polarity.
#[derive(Debug, Clone)]
pub struct BothPolarities<D> {
    inner: D,
}

impl<D> BothPolarities<D> {
    /// Wrap a single-polarity decoder.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped decoder.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: FrameDecoder> FrameDecoder for BothPolarities<D> {
    fn decode(&self, image: &LumaImage, options: DecodeOptions) -> Option<String> {
        let single = DecodeOptions {
            try_both_polarities: false,
        };
        self.inner.decode(image, single).or_else(|| {
            if options.try_both_polarities {
                self.inner.decode(&image.inverted(), single)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads "DARK" when the first pixel is black, nothing otherwise.
    fn dark_only(image: &LumaImage, _options: DecodeOptions) -> Option<String> {
        (image.pixels().first() == Some(&0)).then(|| "DARK".to_string())
    }

    #[test]
    fn test_closure_is_a_decoder() {
        let image = LumaImage::new(1, 1, vec![0]).unwrap();
        assert_eq!(
            dark_only.decode(&image, DecodeOptions::default()),
            Some("DARK".to_string())
        );
    }

    #[test]
    fn test_inverted_retry() {
        let light = LumaImage::new(1, 1, vec![255]).unwrap();
        let decoder = BothPolarities::new(dark_only);
        assert_eq!(
            decoder.decode(&light, DecodeOptions::default()),
            Some("DARK".to_string())
        );
        assert_eq!(
            decoder.decode(
                &light,
                DecodeOptions {
                    try_both_polarities: false
                }
            ),
            None
        );
    }

    #[test]
    fn test_normal_polarity_first() {
        let calls = std::cell::Cell::new(0);
        let counting = |image: &LumaImage, options: DecodeOptions| {
            calls.set(calls.get() + 1);
            assert!(!options.try_both_polarities);
            dark_only(image, options)
        };
        let dark = LumaImage::new(1, 1, vec![0]).unwrap();
        let decoder = BothPolarities::new(counting);
        assert!(decoder.decode(&dark, DecodeOptions::default()).is_some());
        assert_eq!(calls.get(), 1);
    }
}
