use tokio::sync::oneshot;

use crate::surface::ElementId;

/// Playback requests serialized against in-flight transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Pause,
    Resume,
    Advance,
    Jump(usize),
}

/// Handle -> controller.
#[derive(Debug)]
pub(crate) struct Command {
    pub request: Request,
    /// Answered once the request was applied or queued.
    pub accepted: oneshot::Sender<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FadeId(pub u64);

/// Completions reported back to the controller by the tasks it spawns.
#[derive(Debug)]
pub(crate) enum Internal {
    Preloaded {
        index: usize,
        element: ElementId,
        result: anyhow::Result<()>,
    },
    Frame {
        fade: FadeId,
        progress: f32,
    },
    FadeDone(FadeId),
}

/// Controller state published after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub index: usize,
    pub playing: bool,
    pub transitioning: bool,
}

/// Request queue of depth one; a newer request replaces the queued one.
#[derive(Debug, Default)]
pub(crate) struct PendingRequest(Option<Request>);

impl PendingRequest {
    /// Queues `request`, returning the request it displaced.
    pub fn replace(&mut self, request: Request) -> Option<Request> {
        self.0.replace(request)
    }

    pub fn take(&mut self) -> Option<Request> {
        self.0.take()
    }
}
