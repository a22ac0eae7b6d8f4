//! Injected fade capability.
//!
//! An [`Animator`] is a clock for one fade: it reports fractional progress
//! through a [`FrameSink`] and completes once. The controller turns progress
//! into opacity on its own surface, so all surface mutation stays on the
//! controller task.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior, interval};

use crate::events::{FadeId, Internal};
use crate::surface::ElementId;

/// One opacity fade requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub element: ElementId,
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
}

/// Where an animator reports fade progress.
#[derive(Debug, Clone)]
pub struct FrameSink {
    fade: FadeId,
    tx: UnboundedSender<Internal>,
}

impl FrameSink {
    pub(crate) fn new(fade: FadeId, tx: UnboundedSender<Internal>) -> Self {
        Self { fade, tx }
    }

    /// Reports that the fade is `fraction` (0..=1) of the way done.
    pub fn progress(&self, fraction: f32) {
        let _ = self.tx.send(Internal::Frame {
            fade: self.fade,
            progress: fraction.clamp(0.0, 1.0),
        });
    }
}

pub trait Animator: Send + Sync + 'static {
    /// Drives `fade`, reporting progress to `frames`. The returned future
    /// resolving is the completion signal.
    fn fade(&self, fade: Fade, frames: FrameSink) -> BoxFuture<'static, ()>;
}

/// Linear fade ticking at a fixed frame interval.
#[derive(Debug, Clone, Copy)]
pub struct TweenAnimator {
    frame_interval: Duration,
}

impl TweenAnimator {
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval: frame_interval.max(Duration::from_millis(1)),
        }
    }
}

impl Default for TweenAnimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRAME_INTERVAL)
    }
}

impl Animator for TweenAnimator {
    fn fade(&self, fade: Fade, frames: FrameSink) -> BoxFuture<'static, ()> {
        let step = self.frame_interval;
        async move {
            if fade.duration.is_zero() {
                frames.progress(1.0);
                return;
            }
            let total = fade.duration.as_secs_f32();
            let start = Instant::now();
            let mut ticker = interval(step);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let progress = (start.elapsed().as_secs_f32() / total).min(1.0);
                frames.progress(progress);
                if progress >= 1.0 {
                    break;
                }
            }
        }
        .boxed()
    }
}
