//! Single-context rendering hand-off.
//!
//! Some rendering backends are only safe to drive from one thread. [`RenderHost`] owns
//! such a renderer on a dedicated thread and exposes a blocking call-and-await API; the
//! export loop never touches the renderer directly and never has two renders in flight.

use crate::foundation::core::PixelSize;
use crate::render::backend::{FrameRGBA, FrameRenderer, FrameScene};
use std::sync::mpsc;
use std::thread::JoinHandle;

struct RenderRequest {
    scene: FrameScene,
    target: PixelSize,
    reply: mpsc::Sender<Option<FrameRGBA>>,
}

/// Owns a [`FrameRenderer`] on its own thread and serializes access to it.
pub struct RenderHost {
    requests: mpsc::Sender<RenderRequest>,
    worker: Option<JoinHandle<()>>,
}

impl RenderHost {
    /// Move `renderer` onto a dedicated thread.
    pub fn spawn(mut renderer: Box<dyn FrameRenderer>) -> Self {
        let (tx, rx) = mpsc::channel::<RenderRequest>();
        let worker = std::thread::Builder::new()
            .name("mesh-render".into())
            .spawn(move || {
                while let Ok(req) = rx.recv() {
                    let frame = renderer.render(&req.scene, req.target);
                    // receiver gone means the export was abandoned; nothing to do
                    let _ = req.reply.send(frame);
                }
            })
            .map_err(|e| {
                tracing::error!(error = %e, "failed to spawn render thread");
                e
            })
            .ok();
        Self {
            requests: tx,
            worker,
        }
    }

    /// Render one scene, blocking until the render thread replies.
    ///
    /// `None` covers both a renderer failure and a dead render thread; either way the
    /// frame is unusable and the export must stop.
    pub fn render(&self, scene: FrameScene, target: PixelSize) -> Option<FrameRGBA> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send(RenderRequest {
                scene,
                target,
                reply: reply_tx,
            })
            .ok()?;
        reply_rx.recv().ok()?
    }
}

impl Drop for RenderHost {
    fn drop(&mut self) {
        // closing the channel stops the worker loop
        let (dead_tx, _) = mpsc::channel();
        self.requests = dead_tx;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
