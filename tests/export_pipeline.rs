//! End-to-end export pipeline tests.
//!
//! Everything except the final test runs against the in-memory encoder session; the last
//! one drives the real `ffmpeg` path and is skipped when ffmpeg is not installed.

use meshgrad::export::controller::drive_to_completion;
use meshgrad::export::ffmpeg::is_ffmpeg_on_path;
use meshgrad::{
    CancelToken, EncoderSession, ExportError, ExportSnapshot, FrameLoopPlan, InMemorySession,
    PixelSize, PresetSize3, RenderHost, RendererKind, Size, VideoExportOptions, create_renderer,
    export_video,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn snapshot_and_plan(options: &VideoExportOptions) -> (ExportSnapshot, FrameLoopPlan) {
    let template = PresetSize3::Intelligence.template();
    (
        ExportSnapshot::capture(&template, options),
        FrameLoopPlan::new(options.duration_secs, options.frame_rate),
    )
}

#[test]
fn in_memory_export_appends_exactly_the_planned_frames() {
    let options = VideoExportOptions {
        view_size: Size::new(32.0, 32.0),
        duration_secs: 1.0,
        frame_rate: 2,
        ..VideoExportOptions::default()
    };
    let (snapshot, plan) = snapshot_and_plan(&options);
    assert_eq!(plan.total_frames, 2);

    let size = PixelSize::from_view(options.view_size, options.render_scale);
    let session = Arc::new(InMemorySession::new(size));

    drive_to_completion(
        snapshot,
        plan,
        size,
        Arc::clone(&session) as Arc<dyn EncoderSession>,
        RenderHost::spawn(create_renderer(RendererKind::Cpu)),
        std::env::temp_dir().join("pipeline-inmemory.mp4"),
        Duration::from_secs(30),
        &CancelToken::new(),
    )
    .unwrap();

    let times = session.appended_times();
    assert_eq!(times.len(), 2);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    assert!((times.last().unwrap().as_secs_f64() - 0.5).abs() < 1e-9);
    assert!(session.is_finished());
}

#[test]
fn sub_frame_duration_still_produces_one_frame() {
    let options = VideoExportOptions {
        view_size: Size::new(16.0, 16.0),
        duration_secs: 0.01,
        frame_rate: 1,
        ..VideoExportOptions::default()
    };
    let (snapshot, plan) = snapshot_and_plan(&options);
    assert_eq!(plan.total_frames, 1);

    let size = PixelSize::new(16, 16);
    let session = Arc::new(InMemorySession::new(size));
    drive_to_completion(
        snapshot,
        plan,
        size,
        Arc::clone(&session) as Arc<dyn EncoderSession>,
        RenderHost::spawn(create_renderer(RendererKind::Cpu)),
        std::env::temp_dir().join("pipeline-subframe.mp4"),
        Duration::from_secs(30),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(session.frame_count(), 1);
}

#[test]
fn mid_loop_append_failure_leaves_no_output_file() {
    let path = std::env::temp_dir().join("pipeline-append-failure.mp4");
    std::fs::write(&path, b"partial").unwrap();

    let options = VideoExportOptions {
        view_size: Size::new(16.0, 16.0),
        duration_secs: 2.0,
        frame_rate: 4,
        ..VideoExportOptions::default()
    };
    let (snapshot, plan) = snapshot_and_plan(&options);

    let size = PixelSize::new(16, 16);
    let session = Arc::new(InMemorySession::new(size));
    session.fail_append_at(3);

    let err = drive_to_completion(
        snapshot,
        plan,
        size,
        Arc::clone(&session) as Arc<dyn EncoderSession>,
        RenderHost::spawn(create_renderer(RendererKind::Cpu)),
        path.clone(),
        Duration::from_secs(30),
        &CancelToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::FailedToAppendPixelBuffer));
    assert!(!path.exists());
    assert!(session.is_cancelled());
}

#[test]
fn encoder_death_mid_stream_fails_well_before_the_timeout() {
    let path = std::env::temp_dir().join("pipeline-session-death.mp4");
    std::fs::write(&path, b"partial").unwrap();

    let options = VideoExportOptions {
        view_size: Size::new(16.0, 16.0),
        duration_secs: 2.0,
        frame_rate: 4,
        ..VideoExportOptions::default()
    };
    let (snapshot, plan) = snapshot_and_plan(&options);

    let size = PixelSize::new(16, 16);
    let session = Arc::new(InMemorySession::new(size));
    session.fail_session_after(2);

    let started = Instant::now();
    let err = drive_to_completion(
        snapshot,
        plan,
        size,
        Arc::clone(&session) as Arc<dyn EncoderSession>,
        RenderHost::spawn(create_renderer(RendererKind::Cpu)),
        path.clone(),
        Duration::from_secs(30),
        &CancelToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::Other(_)));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "a dead encoder must fail the export immediately, not stall until the timeout"
    );
    assert_eq!(session.frame_count(), 2);
    assert!(!path.exists());
}

#[test]
fn ffmpeg_export_end_to_end() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }

    let template = PresetSize3::Intelligence.template();
    let options = VideoExportOptions {
        view_size: Size::new(320.0, 320.0),
        duration_secs: 1.0,
        frame_rate: 2,
        render_scale: 1.0,
        ..VideoExportOptions::default()
    };

    let path = export_video(&template, &options).unwrap();
    let meta = std::fs::metadata(&path).unwrap();
    assert!(meta.len() > 0, "output file is empty");

    // 2 frames at 2 fps: the container should hold about a second of video
    match probed_duration_secs(&path) {
        Some(duration) => assert!(
            (0.4..=1.6).contains(&duration),
            "expected ~1s of video, ffprobe reports {duration}s"
        ),
        None => eprintln!("skipping duration check: ffprobe not on PATH"),
    }
    std::fs::remove_file(&path).unwrap();
}

fn probed_duration_secs(path: &Path) -> Option<f64> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout).trim().parse().ok()
}
