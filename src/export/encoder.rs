//! Pull-based encoder session contract and its test double.
//!
//! An encoder session owns one output file and exposes a demand signal: the frame loop may
//! only append while [`EncoderSession::is_ready_for_more_data`] holds, and is woken by the
//! callback registered through [`EncoderSession::request_notification_when_ready`], which
//! the session may invoke repeatedly from its own thread.

use crate::foundation::core::{PixelSize, PresentationTime};
use crate::foundation::error::{ExportError, ExportResult};
use crate::render::backend::FrameRGBA;
use std::sync::{Arc, Mutex};

/// Bits-per-pixel constant for the video track bitrate.
pub const BITS_PER_PIXEL: f64 = 0.2;
/// Floor on the average video bitrate, in bits per second.
pub const MIN_BITRATE: u64 = 2_000_000;

/// Average video bitrate for a given output size and frame rate.
///
/// `pixel area × frame rate × 0.2 bpp`, floored at [`MIN_BITRATE`] so high resolution and
/// frame rate combinations never produce a pathologically starved encode.
pub fn target_bitrate(size: PixelSize, frame_rate: u32) -> u64 {
    let px = u64::from(size.width) * u64::from(size.height);
    let raw = (px * u64::from(frame_rate)) as f64 * BITS_PER_PIXEL;
    (raw as u64).max(MIN_BITRATE)
}

/// One frame's worth of RGBA8 pixels, drawn from a session's pool.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 bytes.
    pub data: Vec<u8>,
}

/// Bounded recycling allocator for [`PixelBuffer`]s of one fixed size.
#[derive(Debug)]
pub struct PixelBufferPool {
    size: PixelSize,
    free: Mutex<Vec<Vec<u8>>>,
    max_retained: usize,
}

impl PixelBufferPool {
    /// Pool for buffers of `size`; fails for zero-area sizes.
    pub fn new(size: PixelSize, max_retained: usize) -> ExportResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(ExportError::PixelBufferPoolCreationFailed);
        }
        Ok(Self {
            size,
            free: Mutex::new(Vec::new()),
            max_retained,
        })
    }

    /// The fixed buffer size this pool serves.
    pub fn buffer_size(&self) -> PixelSize {
        self.size
    }

    /// Copy a rendered frame into a pooled buffer.
    ///
    /// Fails with [`ExportError::PixelBufferCreationFailed`] when the frame does not match
    /// the pool's dimensions or its byte length.
    pub fn buffer_from_frame(&self, frame: &FrameRGBA) -> ExportResult<PixelBuffer> {
        if frame.width != self.size.width
            || frame.height != self.size.height
            || frame.data.len() != self.size.rgba_byte_len()
        {
            return Err(ExportError::PixelBufferCreationFailed);
        }
        let mut data = match self.free.lock() {
            Ok(mut free) => free.pop().unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        data.clear();
        data.extend_from_slice(&frame.data);
        Ok(PixelBuffer {
            width: frame.width,
            height: frame.height,
            data,
        })
    }

    /// Return a buffer's storage for reuse.
    pub fn release(&self, buffer: PixelBuffer) {
        if let Ok(mut free) = self.free.lock()
            && free.len() < self.max_retained
        {
            free.push(buffer.data);
        }
    }
}

/// Demand-driven media encoder for one output file.
///
/// Terminal protocol: [`mark_finished`](EncoderSession::mark_finished) then
/// [`finalize`](EncoderSession::finalize), whose completion callback fires exactly once;
/// or [`cancel`](EncoderSession::cancel), after which every other call is a no-op.
pub trait EncoderSession: Send + Sync {
    /// Demand signal: the only legal moment to append is while this holds.
    fn is_ready_for_more_data(&self) -> bool;

    /// Register the single wake-up callback. The session may invoke it repeatedly, from a
    /// dedicated internal thread, whenever demand becomes available.
    fn request_notification_when_ready(&self, on_ready: Box<dyn FnMut() + Send>);

    /// Append one frame at its presentation time; `false` is a hard encoder failure.
    fn append(&self, buffer: PixelBuffer, time: PresentationTime) -> bool;

    /// Declare that no more frames will be appended.
    fn mark_finished(&self);

    /// Finish the container; `on_complete` fires once with an encoder error, if any.
    fn finalize(&self, on_complete: Box<dyn FnOnce(Option<ExportError>) + Send>);

    /// Abort and release resources; repeated calls are no-ops.
    fn cancel(&self);

    /// The session's pixel buffer pool, absent when the session cannot allocate one.
    fn buffer_pool(&self) -> Option<Arc<PixelBufferPool>>;

    /// Take a pending asynchronous session failure, if one occurred.
    ///
    /// Sessions that encode on their own thread can die between appends; once that
    /// happens [`is_ready_for_more_data`](EncoderSession::is_ready_for_more_data) stays
    /// false and the underlying error is retrievable (exactly once) here.
    fn take_error(&self) -> Option<ExportError> {
        None
    }
}

struct InMemoryState {
    frames: Vec<(PresentationTime, PixelSize)>,
    on_ready: Option<Box<dyn FnMut() + Send>>,
    finished: bool,
    cancelled: bool,
    finalized: bool,
    fail_append_at: Option<u64>,
    fail_session_after: Option<u64>,
    failed: bool,
    session_error: Option<ExportError>,
}

/// In-memory [`EncoderSession`] for tests and debugging.
///
/// Always ready until finished or cancelled; records the presentation time and size of
/// every appended frame instead of encoding anything.
pub struct InMemorySession {
    state: Mutex<InMemoryState>,
    pool: Option<Arc<PixelBufferPool>>,
}

impl InMemorySession {
    /// Session accepting frames of `size`.
    pub fn new(size: PixelSize) -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                frames: Vec::new(),
                on_ready: None,
                finished: false,
                cancelled: false,
                finalized: false,
                fail_append_at: None,
                fail_session_after: None,
                failed: false,
                session_error: None,
            }),
            pool: PixelBufferPool::new(size, 4).ok().map(Arc::new),
        }
    }

    /// Make the `n`-th append (0-based) report a hard failure.
    pub fn fail_append_at(&self, n: u64) {
        if let Ok(mut s) = self.state.lock() {
            s.fail_append_at = Some(n);
        }
    }

    /// Simulate the session's encoder thread dying after `n` frames were accepted:
    /// demand goes permanently false and the failure is retrievable via
    /// [`EncoderSession::take_error`].
    pub fn fail_session_after(&self, n: u64) {
        if let Ok(mut s) = self.state.lock() {
            s.fail_session_after = Some(n);
        }
    }

    /// Presentation times of every appended frame, in append order.
    pub fn appended_times(&self) -> Vec<PresentationTime> {
        self.state
            .lock()
            .map(|s| s.frames.iter().map(|(t, _)| *t).collect())
            .unwrap_or_default()
    }

    /// Number of appended frames.
    pub fn frame_count(&self) -> usize {
        self.state.lock().map(|s| s.frames.len()).unwrap_or(0)
    }

    /// Whether `mark_finished` was called.
    pub fn is_finished(&self) -> bool {
        self.state.lock().map(|s| s.finished).unwrap_or(false)
    }

    /// Whether `cancel` was called.
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().map(|s| s.cancelled).unwrap_or(false)
    }

    /// Invoke the registered ready callback, as the real encoder's demand thread would.
    /// No-op when nothing is registered.
    pub fn fire_ready(&self) {
        let cb = match self.state.lock() {
            Ok(mut s) => s.on_ready.take(),
            Err(_) => None,
        };
        if let Some(mut cb) = cb {
            cb();
            if let Ok(mut s) = self.state.lock()
                && s.on_ready.is_none()
            {
                s.on_ready = Some(cb);
            }
        }
    }
}

impl EncoderSession for InMemorySession {
    fn is_ready_for_more_data(&self) -> bool {
        self.state
            .lock()
            .map(|s| !s.finished && !s.cancelled && !s.failed)
            .unwrap_or(false)
    }

    fn request_notification_when_ready(&self, on_ready: Box<dyn FnMut() + Send>) {
        if let Ok(mut s) = self.state.lock() {
            s.on_ready = Some(on_ready);
        }
        self.fire_ready();
    }

    fn append(&self, buffer: PixelBuffer, time: PresentationTime) -> bool {
        let Ok(mut s) = self.state.lock() else {
            return false;
        };
        if s.finished || s.cancelled {
            return false;
        }
        if let Some(n) = s.fail_append_at
            && s.frames.len() as u64 == n
        {
            return false;
        }
        let size = PixelSize::new(buffer.width, buffer.height);
        s.frames.push((time, size));
        if s.fail_session_after == Some(s.frames.len() as u64) {
            s.failed = true;
            s.session_error = Some(ExportError::Other(anyhow::anyhow!(
                "encoder thread died mid-stream"
            )));
        }
        drop(s);
        if let Some(pool) = &self.pool {
            pool.release(buffer);
        }
        true
    }

    fn mark_finished(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.finished = true;
        }
    }

    fn finalize(&self, on_complete: Box<dyn FnOnce(Option<ExportError>) + Send>) {
        let already = match self.state.lock() {
            Ok(mut s) => {
                let already = s.finalized;
                s.finalized = true;
                already
            }
            Err(_) => true,
        };
        if already {
            on_complete(Some(ExportError::finalization(
                "session finalized more than once",
            )));
        } else {
            on_complete(None);
        }
    }

    fn cancel(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.cancelled = true;
            s.finished = true;
        }
    }

    fn buffer_pool(&self) -> Option<Arc<PixelBufferPool>> {
        self.pool.clone()
    }

    fn take_error(&self) -> Option<ExportError> {
        self.state.lock().ok().and_then(|mut s| s.session_error.take())
    }
}
