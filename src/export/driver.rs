//! The frame-loop state machine.
//!
//! One [`FrameLoopDriver`] owns one export run: it answers the encoder's demand callback,
//! renders and appends frames strictly in index order, and resolves a one-shot completion
//! exactly once whether the run ends in success, failure, timeout, or cancellation. Every
//! abnormal ending converges on the same cleanup: mark finished, cancel the session,
//! delete the partial output file.

use crate::export::encoder::EncoderSession;
use crate::export::snapshot::{ExportSnapshot, FrameLoopPlan};
use crate::foundation::core::{FrameIndex, PixelSize};
use crate::foundation::error::{ExportError, ExportResult};
use crate::render::host::RenderHost;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Mutable frame-loop bookkeeping, guarded by the driver's state lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterState {
    /// Next frame to produce.
    pub frame_index: u64,
    /// Terminal flag; once set, every later pass and cleanup attempt is a no-op.
    pub is_finished: bool,
}

/// One-shot completion: the first resolution wins, later ones are dropped.
pub(crate) struct Completion {
    slot: Mutex<CompletionSlot>,
    cv: Condvar,
}

struct CompletionSlot {
    resolved: bool,
    value: Option<ExportResult<()>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(CompletionSlot {
                resolved: false,
                value: None,
            }),
            cv: Condvar::new(),
        }
    }

    /// Store the outcome; returns `false` when already resolved.
    pub(crate) fn resolve(&self, value: ExportResult<()>) -> bool {
        let Ok(mut slot) = self.slot.lock() else {
            return false;
        };
        if slot.resolved {
            return false;
        }
        slot.resolved = true;
        slot.value = Some(value);
        self.cv.notify_all();
        true
    }

    /// Block until resolved or `timeout` elapses; `None` means timeout.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<ExportResult<()>> {
        let deadline = Instant::now() + timeout;
        let Ok(mut slot) = self.slot.lock() else {
            return Some(Err(ExportError::finalization("completion lock poisoned")));
        };
        while !slot.resolved {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (s, timed_out) = match self.cv.wait_timeout(slot, deadline - now) {
                Ok((s, t)) => (s, t.timed_out()),
                Err(_) => return Some(Err(ExportError::finalization("completion lock poisoned"))),
            };
            slot = s;
            if timed_out && !slot.resolved {
                return None;
            }
        }
        slot.value.take()
    }
}

/// Cooperative cancellation signal shared between a caller and an in-flight export.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed at the export's arbitration points.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

enum PassOutcome {
    /// Demand exhausted or already finished; wait for the next wake-up.
    Waiting,
    /// Every frame has been appended.
    Complete,
    /// A terminal per-frame error.
    Failed(ExportError),
}

/// Serializes frame production against the encoder's demand signal.
///
/// Cancellation and timeout are cooperative: both are observed at loop iteration
/// boundaries, never mid-render or mid-append.
pub struct FrameLoopDriver {
    snapshot: ExportSnapshot,
    plan: FrameLoopPlan,
    pixel_size: PixelSize,
    session: Arc<dyn EncoderSession>,
    host: RenderHost,
    output_path: PathBuf,
    token: CancelToken,
    timeout: Duration,
    deadline: Instant,
    state: Mutex<WriterState>,
    pass_active: AtomicBool,
    completion: Arc<Completion>,
}

impl FrameLoopDriver {
    /// Build a driver for one export run. The clock for `timeout` starts here.
    pub fn new(
        snapshot: ExportSnapshot,
        plan: FrameLoopPlan,
        pixel_size: PixelSize,
        session: Arc<dyn EncoderSession>,
        host: RenderHost,
        output_path: PathBuf,
        token: CancelToken,
        timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            snapshot,
            plan,
            pixel_size,
            session,
            host,
            output_path,
            token,
            timeout,
            deadline: Instant::now() + timeout,
            state: Mutex::new(WriterState::default()),
            pass_active: AtomicBool::new(false),
            completion: Arc::new(Completion::new()),
        })
    }

    /// Hook the driver into the session's demand callback and start producing frames.
    pub fn start(self: &Arc<Self>) {
        let driver = Arc::clone(self);
        self.session
            .request_notification_when_ready(Box::new(move || driver.pump()));
    }

    /// Block until the run resolves or `timeout` elapses; `None` means timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ExportResult<()>> {
        self.completion.wait_timeout(timeout)
    }

    /// Abort the run: mark finished, cancel the encoder, delete the partial file, and
    /// resolve with `reason`. Runs its cleanup at most once; a race with normal
    /// completion is settled by whoever flips `is_finished` first.
    pub fn cancel_and_cleanup(&self, reason: ExportError) {
        self.fail(reason);
    }

    /// One demand-callback activation. Re-entrant activations while a pass is running
    /// are no-ops.
    fn pump(&self) {
        if self.is_finished() {
            return;
        }
        if self.pass_active.swap(true, Ordering::AcqRel) {
            return;
        }
        loop {
            let outcome = self.write_frames();
            self.pass_active.store(false, Ordering::Release);

            match outcome {
                PassOutcome::Waiting => {
                    // a notify that landed while the pass was active was swallowed by the
                    // guard; re-check demand so that wake-up is not lost
                    if self.session.is_ready_for_more_data()
                        && !self.is_finished()
                        && !self.pass_active.swap(true, Ordering::AcqRel)
                    {
                        continue;
                    }
                    return;
                }
                PassOutcome::Complete => return self.complete(),
                PassOutcome::Failed(e) => return self.fail(e),
            }
        }
    }

    fn write_frames(&self) -> PassOutcome {
        loop {
            let frame_index = {
                let Ok(state) = self.state.lock() else {
                    return PassOutcome::Failed(ExportError::finalization("driver state poisoned"));
                };
                if state.is_finished {
                    return PassOutcome::Waiting;
                }
                state.frame_index
            };
            if self.token.is_cancelled() {
                return PassOutcome::Failed(ExportError::Cancelled);
            }
            if Instant::now() >= self.deadline {
                return PassOutcome::Failed(ExportError::TimedOut(self.timeout));
            }
            if frame_index >= self.plan.total_frames {
                return PassOutcome::Complete;
            }
            if !self.session.is_ready_for_more_data() {
                // demand can stay down because the session died; never park on that
                if let Some(e) = self.session.take_error() {
                    return PassOutcome::Failed(e);
                }
                return PassOutcome::Waiting;
            }

            let index = FrameIndex(frame_index);
            let scene = self.snapshot.scene_at(self.plan.elapsed_at(index));
            let Some(frame) = self.host.render(scene, self.pixel_size) else {
                return PassOutcome::Failed(ExportError::FrameRenderingFailed);
            };

            let Some(pool) = self.session.buffer_pool() else {
                return PassOutcome::Failed(ExportError::PixelBufferPoolCreationFailed);
            };
            let buffer = match pool.buffer_from_frame(&frame) {
                Ok(b) => b,
                Err(e) => return PassOutcome::Failed(e),
            };

            if !self.session.append(buffer, self.plan.presentation_time(index)) {
                return PassOutcome::Failed(ExportError::FailedToAppendPixelBuffer);
            }

            if let Ok(mut state) = self.state.lock() {
                state.frame_index += 1;
            }
        }
    }

    fn complete(&self) {
        if !self.finish_once() {
            return;
        }
        tracing::debug!(frames = self.plan.total_frames, "frame loop complete, finalizing");
        self.session.mark_finished();

        let completion = Arc::clone(&self.completion);
        let path = self.output_path.clone();
        self.session.finalize(Box::new(move |err| match err {
            None => {
                completion.resolve(Ok(()));
            }
            Some(e) => {
                let _ = std::fs::remove_file(&path);
                completion.resolve(Err(e));
            }
        }));
    }

    fn fail(&self, reason: ExportError) {
        if !self.finish_once() {
            return;
        }
        tracing::debug!(error = %reason, "aborting export, cleaning up");
        self.session.cancel();
        let _ = std::fs::remove_file(&self.output_path);
        self.completion.resolve(Err(reason));
    }

    /// Flip `is_finished`; only the first caller gets `true` and owns the terminal
    /// transition.
    fn finish_once(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if state.is_finished {
            return false;
        }
        state.is_finished = true;
        true
    }

    fn is_finished(&self) -> bool {
        self.state.lock().map(|s| s.is_finished).unwrap_or(true)
    }
}
