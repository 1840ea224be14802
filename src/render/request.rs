//! Asynchronous pick and screenshot requests.
//!
//! Requests may be issued from any thread. They are queued on a `flume`
//! channel and served by the engine at the next frame boundary, after the
//! frame rendered; the answer travels back on a one-shot channel. Dropping
//! the [`PendingRequest`] abandons the answer, it never cancels the work.

use glam::Vec2;

use crate::errors::{Result, StrataError};
use crate::render::capture::Screenshot;
use crate::render::picking::{PickHit, PickOptions};
use crate::scene::view::ViewId;

pub(crate) enum FrameRequest {
    Pick {
        view: ViewId,
        point: Vec2,
        options: PickOptions,
        reply: flume::Sender<Result<Option<PickHit>>>,
    },
    Screenshot {
        view: ViewId,
        reply: flume::Sender<Result<Screenshot>>,
    },
}

/// Answer of a queued request, available after the frame it was served in.
#[must_use = "the answer is lost if the pending request is dropped"]
pub struct PendingRequest<T> {
    rx: flume::Receiver<Result<T>>,
}

impl<T> PendingRequest<T> {
    /// Waits for the frame boundary that serves the request.
    pub async fn wait(self) -> Result<T> {
        self.rx.recv_async().await.map_err(|_| StrataError::RequestDropped)?
    }

    /// Blocking variant of [`wait`](Self::wait). Must not be called on the
    /// thread that drives the engine.
    pub fn wait_blocking(self) -> Result<T> {
        self.rx.recv().map_err(|_| StrataError::RequestDropped)?
    }

    /// The answer if it already arrived.
    pub fn try_take(&self) -> Option<Result<T>> {
        self.rx.try_recv().ok()
    }
}

/// Cloneable handle for queueing requests from other threads.
#[derive(Clone)]
pub struct Requester {
    tx: flume::Sender<FrameRequest>,
}

impl Requester {
    pub(crate) fn new(tx: flume::Sender<FrameRequest>) -> Self {
        Self { tx }
    }

    /// Queues a pick at a normalized screen point of `view`.
    pub fn pick(&self, view: ViewId, point: Vec2, options: PickOptions) -> PendingRequest<Option<PickHit>> {
        let (reply, rx) = flume::bounded(1);
        self.send(FrameRequest::Pick {
            view,
            point,
            options,
            reply,
        });
        PendingRequest { rx }
    }

    /// Queues a full-frame capture of `view`.
    pub fn screenshot(&self, view: ViewId) -> PendingRequest<Screenshot> {
        let (reply, rx) = flume::bounded(1);
        self.send(FrameRequest::Screenshot { view, reply });
        PendingRequest { rx }
    }

    fn send(&self, request: FrameRequest) {
        // The engine owns the receiver; a failed send means it is gone and
        // the pending request resolves to `RequestDropped`.
        if self.tx.send(request).is_err() {
            log::warn!("Engine dropped, request discarded");
        }
    }
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester").field("queued", &self.tx.len()).finish()
    }
}
