//! Public export entry point.
//!
//! [`export_video`] validates the request, snapshots the gradient, opens an encoder
//! session on a unique output path, runs the frame loop, and arbitrates it against the
//! configured timeout and an optional caller-held [`CancelToken`]. Whatever loses the race
//! is cleaned up; the caller gets either the finished file's path or one error from the
//! closed [`ExportError`](crate::foundation::error::ExportError) taxonomy.

use crate::export::driver::{CancelToken, FrameLoopDriver};
use crate::export::encoder::EncoderSession;
use crate::export::ffmpeg::{ContainerFormat, FfmpegSession, FfmpegSessionOpts};
use crate::export::snapshot::{ExportSnapshot, FrameLoopPlan, VideoExportOptions};
use crate::export::validate::validate_strict;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{ExportError, ExportResult};
use crate::gradient::template::GradientTemplate;
use crate::render::backend::{RendererKind, create_renderer};
use crate::render::host::RenderHost;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Granularity of the timeout/cancellation arbitration loop.
const ARBITRATION_SLICE: Duration = Duration::from_millis(50);
/// Grace period for the cleanup path to resolve after an abort request.
const ABORT_GRACE: Duration = Duration::from_secs(30);

/// Export an animated gradient as an MP4 file; returns the output path.
pub fn export_video(
    template: &GradientTemplate,
    options: &VideoExportOptions,
) -> ExportResult<PathBuf> {
    export_video_cancellable(template, options, &CancelToken::new())
}

/// Like [`export_video`] but observes `token` while the export runs.
pub fn export_video_cancellable(
    template: &GradientTemplate,
    options: &VideoExportOptions,
    token: &CancelToken,
) -> ExportResult<PathBuf> {
    validate_strict(
        template,
        options.view_size,
        options.duration_secs,
        options.frame_rate,
        options.render_scale,
    )?;

    let pixel_size = PixelSize::from_view(options.view_size, options.render_scale);
    let out_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let out_path = unique_output_path(&out_dir, ContainerFormat::Mp4);

    let bg = template.background.to_rgb8();
    let session = FfmpegSession::open(
        FfmpegSessionOpts {
            out_path: out_path.clone(),
            overwrite: true,
            bg_rgba: [bg[0], bg[1], bg[2], 255],
        },
        pixel_size,
        options.frame_rate,
        ContainerFormat::Mp4,
    )?;

    let snapshot = ExportSnapshot::capture(template, options);
    let plan = FrameLoopPlan::new(options.duration_secs, options.frame_rate);
    tracing::info!(
        out = %out_path.display(),
        frames = plan.total_frames,
        width = pixel_size.width,
        height = pixel_size.height,
        "starting video export"
    );

    let host = RenderHost::spawn(create_renderer(RendererKind::Cpu));
    drive_to_completion(
        snapshot,
        plan,
        pixel_size,
        Arc::new(session),
        host,
        out_path.clone(),
        options.timeout,
        token,
    )?;

    if !out_path.exists() {
        return Err(ExportError::FileNotAccessible);
    }
    tracing::info!(out = %out_path.display(), "video export finished");
    Ok(out_path)
}

/// Run one frame loop to completion against any encoder session, arbitrating timeout and
/// cancellation. Used by [`export_video_cancellable`] and directly by tests with an
/// in-memory session.
#[allow(clippy::too_many_arguments)]
pub fn drive_to_completion(
    snapshot: ExportSnapshot,
    plan: FrameLoopPlan,
    pixel_size: PixelSize,
    session: Arc<dyn EncoderSession>,
    host: RenderHost,
    output_path: PathBuf,
    timeout: Duration,
    token: &CancelToken,
) -> ExportResult<()> {
    let driver = FrameLoopDriver::new(
        snapshot,
        plan,
        pixel_size,
        session,
        host,
        output_path,
        token.clone(),
        timeout,
    );
    driver.start();

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(result) = driver.wait_timeout(ARBITRATION_SLICE) {
            return result;
        }
        if token.is_cancelled() {
            driver.cancel_and_cleanup(ExportError::Cancelled);
            return settle_after_abort(&driver);
        }
        if Instant::now() >= deadline {
            driver.cancel_and_cleanup(ExportError::TimedOut(timeout));
            return settle_after_abort(&driver);
        }
    }
}

/// After an abort request, return whatever actually won the race: the abort's own
/// resolution, or a normal completion that slipped in first.
fn settle_after_abort(driver: &FrameLoopDriver) -> ExportResult<()> {
    driver
        .wait_timeout(ABORT_GRACE)
        .unwrap_or_else(|| Err(ExportError::finalization("abort cleanup did not resolve")))
}

static PATH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A collision-free output path: pid, wall-clock nanos, and a process-wide counter, so
/// concurrent exports in one or many processes never share a file.
pub fn unique_output_path(dir: &Path, format: ContainerFormat) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = PATH_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "mesh-export-{}-{}-{}.{}",
        std::process::id(),
        nanos,
        seq,
        format.extension()
    ))
}
