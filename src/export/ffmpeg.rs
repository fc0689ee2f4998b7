//! MP4 encoding through the system `ffmpeg`.
//!
//! [`FfmpegSession`] spawns `ffmpeg` reading raw RGBA frames on stdin and implements the
//! pull-based [`EncoderSession`] contract on top of a bounded in-flight queue: demand is
//! "queue has room", and the wake-up callback is invoked from the writer thread each time
//! a queued frame has been handed to the encoder.

use crate::export::encoder::{EncoderSession, PixelBuffer, PixelBufferPool, target_bitrate};
use crate::foundation::core::{PixelSize, PresentationTime};
use crate::foundation::error::{ExportError, ExportResult};
use crate::foundation::math::mul_div255_u16;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// H.264 in MP4, `yuv420p`, faststart.
    Mp4,
}

impl ContainerFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
        }
    }
}

/// Options for [`FfmpegSession`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSessionOpts {
    /// Output file path.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Background used to flatten alpha before encoding (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSessionOpts {
    /// Options writing to `out_path` with overwrite enabled and a black background.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Frames buffered between `append` and the ffmpeg stdin writer.
const QUEUE_CAPACITY: usize = 4;

type ReadyCallback = Box<dyn FnMut() + Send>;

struct SessionState {
    sender: Option<SyncSender<PixelBuffer>>,
    child: Option<Child>,
    writer: Option<JoinHandle<()>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    last_time: Option<PresentationTime>,
    finished: bool,
    cancelled: bool,
}

struct Shared {
    state: Mutex<SessionState>,
    in_flight: AtomicUsize,
    failed: AtomicBool,
    // the writer thread's failure, held until the frame loop or finalize takes it
    error: Mutex<Option<ExportError>>,
    on_ready: Mutex<Option<ReadyCallback>>,
    pool: Arc<PixelBufferPool>,
}

/// A pull-based encoder session backed by a system `ffmpeg` process.
pub struct FfmpegSession {
    shared: Arc<Shared>,
    out_path: PathBuf,
}

impl std::fmt::Debug for FfmpegSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSession")
            .field("out_path", &self.out_path)
            .finish_non_exhaustive()
    }
}

impl FfmpegSession {
    /// Spawn `ffmpeg` for one output file.
    ///
    /// Fails with [`ExportError::UnsupportedFormat`] when `ffmpeg` is not on `PATH`, with
    /// [`ExportError::InvalidConfiguration`] for odd dimensions (`yuv420p` needs even), and
    /// with [`ExportError::FailedToStartWriting`] when the process cannot be started.
    pub fn open(
        opts: FfmpegSessionOpts,
        size: PixelSize,
        frame_rate: u32,
        format: ContainerFormat,
    ) -> ExportResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(ExportError::invalid_configuration(
                "output dimensions must be non-zero",
            ));
        }
        if !size.width.is_multiple_of(2) || !size.height.is_multiple_of(2) {
            return Err(ExportError::invalid_configuration(
                "output dimensions must be even (required for yuv420p output)",
            ));
        }
        if frame_rate == 0 {
            return Err(ExportError::invalid_configuration("frame rate must be > 0"));
        }
        ensure_parent_dir(&opts.out_path)?;
        if !opts.overwrite && opts.out_path.exists() {
            return Err(ExportError::invalid_configuration(format!(
                "output file '{}' already exists",
                opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ExportError::UnsupportedFormat);
        }

        let ContainerFormat::Mp4 = format;
        let bitrate = target_bitrate(size, frame_rate);

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if opts.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", size.width, size.height),
            "-r",
            &frame_rate.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-b:v",
            &bitrate.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ExportError::failed_to_start_writing(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExportError::failed_to_start_writing("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExportError::failed_to_start_writing("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let pool = Arc::new(PixelBufferPool::new(size, QUEUE_CAPACITY + 1)?);
        let (tx, rx) = sync_channel::<PixelBuffer>(QUEUE_CAPACITY);

        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState {
                sender: Some(tx),
                child: Some(child),
                writer: None,
                stderr_drain: Some(stderr_drain),
                last_time: None,
                finished: false,
                cancelled: false,
            }),
            in_flight: AtomicUsize::new(0),
            failed: AtomicBool::new(false),
            error: Mutex::new(None),
            on_ready: Mutex::new(None),
            pool,
        });

        let writer = spawn_writer(Arc::clone(&shared), rx, stdin, size, opts.bg_rgba);
        if let Ok(mut state) = shared.state.lock() {
            state.writer = Some(writer);
        }

        Ok(Self {
            shared,
            out_path: opts.out_path,
        })
    }

    /// The path this session writes to.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }
}

fn spawn_writer(
    shared: Arc<Shared>,
    rx: Receiver<PixelBuffer>,
    mut stdin: ChildStdin,
    size: PixelSize,
    bg_rgba: [u8; 4],
) -> JoinHandle<()> {
    let on_spawn_failure = Arc::clone(&shared);
    std::thread::Builder::new()
        .name("ffmpeg-writer".into())
        .spawn(move || {
            use std::io::Write as _;
            let mut scratch = vec![0u8; size.rgba_byte_len()];
            while let Ok(buffer) = rx.recv() {
                let result = flatten_premul_over_bg(&mut scratch, &buffer.data, bg_rgba)
                    .and_then(|()| {
                        stdin.write_all(&scratch).map_err(|e| {
                            ExportError::Other(anyhow::anyhow!(
                                "failed to write frame to ffmpeg stdin: {e}"
                            ))
                        })
                    });
                shared.pool.release(buffer);
                shared.in_flight.fetch_sub(1, Ordering::AcqRel);

                if let Err(e) = result {
                    fail_session(&shared, e);
                    // wake the frame loop so the failure surfaces now, not at timeout
                    notify_ready(&shared);
                    return;
                }
                notify_ready(&shared);
            }
            // sender dropped: flush and close the pipe so ffmpeg can finish the container
            let _ = stdin.flush();
        })
        .unwrap_or_else(|e| {
            fail_session(
                &on_spawn_failure,
                ExportError::Other(anyhow::anyhow!("failed to spawn ffmpeg writer thread: {e}")),
            );
            std::thread::spawn(|| {})
        })
}

fn fail_session(shared: &Shared, error: ExportError) {
    tracing::warn!(error = %error, "ffmpeg writer stopped");
    if let Ok(mut slot) = shared.error.lock() {
        slot.get_or_insert(error);
    }
    shared.failed.store(true, Ordering::Release);
}

fn notify_ready(shared: &Shared) {
    let cb = match shared.on_ready.lock() {
        Ok(mut slot) => slot.take(),
        Err(_) => None,
    };
    if let Some(mut cb) = cb {
        cb();
        if let Ok(mut slot) = shared.on_ready.lock()
            && slot.is_none()
        {
            *slot = Some(cb);
        }
    }
}

impl EncoderSession for FfmpegSession {
    fn is_ready_for_more_data(&self) -> bool {
        if self.shared.failed.load(Ordering::Acquire) {
            return false;
        }
        let open = self
            .shared
            .state
            .lock()
            .map(|s| s.sender.is_some() && !s.finished && !s.cancelled)
            .unwrap_or(false);
        open && self.shared.in_flight.load(Ordering::Acquire) < QUEUE_CAPACITY
    }

    fn request_notification_when_ready(&self, on_ready: Box<dyn FnMut() + Send>) {
        if let Ok(mut slot) = self.shared.on_ready.lock() {
            *slot = Some(on_ready);
        }
        if self.is_ready_for_more_data() {
            notify_ready(&self.shared);
        }
    }

    fn append(&self, buffer: PixelBuffer, time: PresentationTime) -> bool {
        if self.shared.failed.load(Ordering::Acquire) {
            return false;
        }
        let sender = {
            let Ok(mut state) = self.shared.state.lock() else {
                return false;
            };
            if state.finished || state.cancelled {
                return false;
            }
            if let Some(last) = state.last_time
                && time <= last
            {
                tracing::warn!(?time, ?last, "rejecting out-of-order presentation time");
                return false;
            }
            state.last_time = Some(time);
            state.sender.clone()
        };
        let Some(sender) = sender else {
            return false;
        };
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        if sender.send(buffer).is_err() {
            self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }

    fn mark_finished(&self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.finished = true;
            // closing the channel lets the writer drain and exit
            state.sender = None;
        }
    }

    fn finalize(&self, on_complete: Box<dyn FnOnce(Option<ExportError>) + Send>) {
        let shared = Arc::clone(&self.shared);
        std::thread::spawn(move || {
            on_complete(finish_process(&shared).err());
        });
    }

    fn cancel(&self) {
        let Ok(mut state) = self.shared.state.lock() else {
            return;
        };
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        state.finished = true;
        state.sender = None;
        if let Some(mut child) = state.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn buffer_pool(&self) -> Option<Arc<PixelBufferPool>> {
        Some(Arc::clone(&self.shared.pool))
    }

    fn take_error(&self) -> Option<ExportError> {
        self.shared.error.lock().ok().and_then(|mut slot| slot.take())
    }
}

fn finish_process(shared: &Shared) -> ExportResult<()> {
    let (writer, child, stderr_drain) = {
        let Ok(mut state) = shared.state.lock() else {
            return Err(ExportError::finalization("session state poisoned"));
        };
        if !state.finished {
            state.finished = true;
            state.sender = None;
        }
        (state.writer.take(), state.child.take(), state.stderr_drain.take())
    };

    if let Some(writer) = writer {
        writer
            .join()
            .map_err(|_| ExportError::finalization("ffmpeg writer thread panicked"))?;
    }

    let Some(mut child) = child else {
        return Err(ExportError::finalization("ffmpeg process already reaped"));
    };
    let status = child
        .wait()
        .map_err(|e| ExportError::finalization(format!("failed to wait for ffmpeg: {e}")))?;

    let stderr_bytes = match stderr_drain {
        Some(handle) => handle
            .join()
            .map_err(|_| ExportError::finalization("ffmpeg stderr drain thread panicked"))?
            .unwrap_or_default(),
        None => Vec::new(),
    };

    // a writer failure nobody picked up yet takes precedence over the exit status
    if let Ok(mut slot) = shared.error.lock()
        && let Some(e) = slot.take()
    {
        return Err(e);
    }

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_bytes);
        return Err(ExportError::finalization(format!(
            "ffmpeg exited with status {}: {}",
            status,
            stderr.trim()
        )));
    }
    Ok(())
}

fn flatten_premul_over_bg(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ExportResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ExportError::invalid_configuration(
            "flatten expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }
        let inv = 255 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ExportResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_alpha_0_returns_bg() {
        let src = vec![0u8, 0, 0, 0];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn flatten_alpha_255_is_identity() {
        let src = vec![1u8, 2, 3, 255];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn odd_dimensions_are_rejected_before_spawning() {
        let err = FfmpegSession::open(
            FfmpegSessionOpts::new("/tmp/never-written.mp4"),
            PixelSize::new(321, 320),
            30,
            ContainerFormat::Mp4,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfiguration(_)));
    }

    #[test]
    fn container_extension() {
        assert_eq!(ContainerFormat::Mp4.extension(), "mp4");
    }
}
