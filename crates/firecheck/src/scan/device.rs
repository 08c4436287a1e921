//! Capture device abstraction and scoped stream ownership.

use tracing::debug;

use super::frame::Frame;
use crate::error::WorkflowError;

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// The rear camera, pointed at the unit.
    #[default]
    Environment,
    /// The front camera.
    User,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A live video stream.
pub trait VideoStream: Send {
    /// The most recent frame, or `None` while the stream is still warming up.
    fn current_frame(&mut self) -> Option<Frame>;
}

/// A platform camera.
///
/// Acquisition is the only operation in the workflow that may fail
/// asynchronously (permission prompts, busy devices).
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Name of this device (for logging).
    fn name(&self) -> &'static str;

    /// Open a stream from the camera facing `facing`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::DeviceUnavailable`] when the camera cannot be
    /// opened.
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoStream>, WorkflowError>;

    /// Release a stream obtained from [`CaptureDevice::acquire`].
    fn release(&self, stream: Box<dyn VideoStream>);
}

/// Owns an acquired stream and hands it back to the device exactly once.
///
/// The stream is released by [`StreamLease::release`] or, failing that, on
/// drop, so every exit from the scanning view gives the camera back.
pub struct StreamLease<'a> {
    device: &'a dyn CaptureDevice,
    stream: Option<Box<dyn VideoStream>>,
}

impl<'a> StreamLease<'a> {
    /// Acquire a stream from `device`.
    ///
    /// # Errors
    ///
    /// Propagates the device's acquisition failure.
    pub async fn acquire(
        device: &'a dyn CaptureDevice,
        facing: Facing,
    ) -> Result<StreamLease<'a>, WorkflowError> {
        let stream = device.acquire(facing).await?;
        debug!(device = device.name(), facing = %facing, "Acquired capture stream");
        Ok(Self {
            device,
            stream: Some(stream),
        })
    }

    /// The leased stream, until released.
    pub fn stream(&mut self) -> Option<&mut (dyn VideoStream + 'static)> {
        self.stream.as_deref_mut()
    }

    /// Whether the stream is still held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.stream.is_some()
    }

    /// Give the stream back to the device. Later calls do nothing.
    pub fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.device.release(stream);
            debug!(device = self.device.name(), "Released capture stream");
        }
    }
}

impl Drop for StreamLease<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StreamLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLease")
            .field("device", &self.device.name())
            .field("held", &self.is_held())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed list of frames, then repeats the last one.
    pub(crate) struct ScriptedStream {
        frames: VecDeque<Option<Frame>>,
        last: Option<Frame>,
    }

    impl VideoStream for ScriptedStream {
        fn current_frame(&mut self) -> Option<Frame> {
            if let Some(next) = self.frames.pop_front() {
                self.last = next;
            }
            self.last.clone()
        }
    }

    /// A camera that serves scripted frames and counts acquire/release calls.
    #[derive(Clone, Default)]
    pub(crate) struct FakeCamera {
        pub(crate) frames: Arc<Mutex<Vec<Option<Frame>>>>,
        pub(crate) fail_with: Option<String>,
        pub(crate) acquired: Arc<AtomicUsize>,
        pub(crate) released: Arc<AtomicUsize>,
    }

    impl FakeCamera {
        pub(crate) fn with_frames(frames: Vec<Option<Frame>>) -> Self {
            Self {
                frames: Arc::new(Mutex::new(frames)),
                ..Self::default()
            }
        }

        pub(crate) fn broken(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub(crate) fn acquired(&self) -> usize {
            self.acquired.load(Ordering::SeqCst)
        }

        pub(crate) fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CaptureDevice for FakeCamera {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn acquire(&self, _facing: Facing) -> Result<Box<dyn VideoStream>, WorkflowError> {
            if let Some(message) = &self.fail_with {
                return Err(WorkflowError::device_unavailable(message.clone()));
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            let frames = self.frames.lock().unwrap().clone();
            Ok(Box::new(ScriptedStream {
                frames: frames.into(),
                last: None,
            }))
        }

        fn release(&self, _stream: Box<dyn VideoStream>) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_lease_releases_once_on_drop() {
        let camera = FakeCamera::with_frames(Vec::new());
        {
            let mut lease = StreamLease::acquire(&camera, Facing::Environment)
                .await
                .unwrap();
            assert!(lease.is_held());
            lease.release();
            lease.release();
            assert!(!lease.is_held());
        }
        assert_eq!(camera.acquired(), 1);
        assert_eq!(camera.released(), 1);
    }

    #[tokio::test]
    async fn test_lease_released_by_drop() {
        let camera = FakeCamera::with_frames(Vec::new());
        let lease = StreamLease::acquire(&camera, Facing::Environment)
            .await
            .unwrap();
        drop(lease);
        assert_eq!(camera.released(), 1);
    }

    #[tokio::test]
    async fn test_failed_acquire() {
        let camera = FakeCamera::broken("permission denied");
        let err = StreamLease::acquire(&camera, Facing::Environment)
            .await
            .unwrap_err();
        assert!(err.forces_manual_entry());
        assert_eq!(camera.released(), 0);
    }

    #[test]
    fn test_facing_display() {
        assert_eq!(Facing::Environment.to_string(), "environment");
        assert_eq!(Facing::default(), Facing::Environment);
    }
}
