//! Camera scanning: frame preprocessing, decoding and the scan loop.
//!
//! The camera and the symbol decoder enter through the [`CaptureDevice`] and
//! [`FrameDecoder`] traits. Everything between them, from region sampling to
//! duplicate suppression, lives here, along with a QR decoder and a device
//! that replays still images.

mod controller;
mod decoder;
pub(crate) mod device;
mod files;
mod frame;
mod qr;

pub use controller::{
    ScanController, ScanEvent, ScanExit, ScanHandle, ScanSettings, ScanState, Scanner,
    TickOutcome,
};
pub use decoder::{BothPolarities, DecodeOptions, FrameDecoder};
pub use device::{CaptureDevice, Facing, StreamLease, VideoStream};
pub use files::{load_frame, ImageFiles};
pub use frame::{Frame, LumaImage, Region};
pub use qr::QrDecoder;
