//! The slide-advance state machine.
//!
//! One task owns every piece of playback state. Preloads and fades run in
//! spawned tasks and report back over the internal channel, so state is only
//! ever touched here, one message at a time.
//!
//! Rules:
//! - At most one transition is in flight. Requests arriving meanwhile are
//!   queued (depth one, latest wins) and applied once the incoming slide has
//!   finished fading in.
//! - The current index only changes when the incoming slide is fully shown.
//! - Listeners are never run here; events go to the dispatcher task after
//!   the snapshot is published.

use std::collections::HashMap;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::time::{Sleep, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::animation::{Animator, Fade, FrameSink};
use crate::events::{Command, FadeId, Internal, PendingRequest, Request, Snapshot};
use crate::listeners::{EventKind, Listeners, SlideEvent};
use crate::preload::Preloader;
use crate::slide::Slide;
use crate::surface::{ElementId, ResizeToParent, Surface};
use crate::tasks::dispatch::Dispatch;

#[derive(Debug, Clone)]
pub(crate) struct Options {
    pub default_duration: Duration,
    pub fade_duration: Duration,
    pub css_classes: String,
    pub loading_indicator: String,
}

pub(crate) struct Collaborators {
    pub surface: Box<dyn Surface>,
    pub animator: Option<Arc<dyn Animator>>,
    pub preloader: Arc<dyn Preloader>,
    pub resizer: Option<Arc<dyn ResizeToParent>>,
}

pub(crate) struct Channels {
    pub dispatch: UnboundedSender<Dispatch>,
    pub internal_tx: UnboundedSender<Internal>,
    pub state: watch::Sender<Snapshot>,
}

/// Per-slide bookkeeping, reset whenever the slide is mounted again.
#[derive(Debug, Default, Clone, Copy)]
struct SlideSlot {
    element: Option<ElementId>,
    loaded: bool,
    show_on_load: bool,
}

/// What happens once a fade completes.
#[derive(Debug, Clone, Copy)]
enum AfterFade {
    Nothing,
    /// The outgoing slide is transparent; bring `target` in once loaded.
    OutgoingDone { target: usize },
    /// `index` is fully opaque.
    Shown { index: usize },
}

#[derive(Debug)]
struct ActiveFade {
    element: ElementId,
    from: f32,
    to: f32,
    /// Slide whose progress is reported to listeners.
    report: Option<usize>,
    then: AfterFade,
}

pub(crate) struct Controller {
    slides: Arc<[Slide]>,
    slots: Vec<SlideSlot>,
    container: Arc<str>,
    options: Options,
    surface: Box<dyn Surface>,
    animator: Option<Arc<dyn Animator>>,
    preloader: Arc<dyn Preloader>,
    resizer: Option<Arc<dyn ResizeToParent>>,
    listeners: Arc<Mutex<Listeners>>,
    channels: Channels,

    loading: Option<ElementId>,
    current: usize,
    upcoming: Option<usize>,
    /// Target of the transition in flight.
    incoming: Option<usize>,
    playing: bool,
    transitioning: bool,
    pending: PendingRequest,
    timer: Option<Pin<Box<Sleep>>>,
    fades: HashMap<FadeId, ActiveFade>,
    next_fade: u64,
    opacity: HashMap<ElementId, f32>,
}

impl Controller {
    pub fn new(
        slides: Arc<[Slide]>,
        options: Options,
        collaborators: Collaborators,
        listeners: Arc<Mutex<Listeners>>,
        channels: Channels,
    ) -> Self {
        let Collaborators {
            surface,
            animator,
            preloader,
            resizer,
        } = collaborators;
        Self {
            slots: vec![SlideSlot::default(); slides.len()],
            container: Arc::from(surface.id()),
            slides,
            options,
            surface,
            animator,
            preloader,
            resizer,
            listeners,
            channels,
            loading: None,
            current: 0,
            upcoming: None,
            incoming: None,
            playing: true,
            transitioning: false,
            pending: PendingRequest::default(),
            timer: None,
            fades: HashMap::new(),
            next_fade: 0,
            opacity: HashMap::new(),
        }
    }

    /// Mounts the loading indicator and the first slide. The show counts as
    /// transitioning until slide 0 has faded in.
    fn start(&mut self) {
        let loading = self
            .surface
            .mount_loading_indicator(&self.options.loading_indicator, &self.options.css_classes);
        self.opacity.insert(loading, 1.0);
        self.resize();
        self.loading = Some(loading);
        self.incoming = Some(0);
        self.transitioning = true;
        self.publish();
        self.prepare(0, true);
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            index: self.current,
            playing: self.playing,
            transitioning: self.transitioning,
        };
        self.channels.state.send_if_modified(|s| {
            if *s == snapshot {
                false
            } else {
                *s = snapshot;
                true
            }
        });
    }

    fn emit(&self, kind: EventKind, index: usize, progress: Option<f32>) {
        let listeners = self.listeners.lock().set(kind).snapshot();
        if listeners.is_empty() {
            return;
        }
        let event = SlideEvent {
            kind,
            container: Arc::clone(&self.container),
            slides: Arc::clone(&self.slides),
            index,
            progress,
        };
        let _ = self.channels.dispatch.send(Dispatch { listeners, event });
    }

    fn resize(&self) {
        if let Some(resizer) = &self.resizer {
            resizer.resize();
        }
    }

    fn set_opacity(&mut self, element: ElementId, opacity: f32) {
        self.opacity.insert(element, opacity);
        self.surface.set_opacity(element, opacity);
    }

    fn set_loading_visible(&mut self, visible: bool) {
        if let Some(loading) = self.loading {
            self.set_opacity(loading, if visible { 1.0 } else { 0.0 });
        }
    }

    /// Mounts a fresh element for `index` and starts preloading it.
    fn prepare(&mut self, index: usize, show_on_load: bool) {
        let slide = &self.slides[index];
        debug!(index, src = %slide.src, "going to load");
        let element = self.surface.mount_slide(slide, &self.options.css_classes);
        self.opacity.insert(element, 0.0);
        self.resize();
        self.slots[index] = SlideSlot {
            element: Some(element),
            loaded: false,
            show_on_load,
        };

        let mut load = self.preloader.preload(&slide.src);
        match (&mut load).now_or_never() {
            Some(result) => self.on_preloaded(index, element, result),
            None => {
                let tx = self.channels.internal_tx.clone();
                tokio::spawn(async move {
                    let result = load.await;
                    let _ = tx.send(Internal::Preloaded {
                        index,
                        element,
                        result,
                    });
                });
            }
        }
    }

    fn on_preloaded(&mut self, index: usize, element: ElementId, result: Result<()>) {
        let slot = &mut self.slots[index];
        if slot.element != Some(element) {
            debug!(index, element = %element, "ignoring preload of a replaced element");
            return;
        }
        if let Err(err) = result {
            warn!(index, src = %self.slides[index].src, "preload failed: {err:#}");
        }
        slot.loaded = true;
        if slot.show_on_load {
            slot.show_on_load = false;
            self.fade_in(index);
        }
    }

    fn start_fade(&mut self, element: ElementId, to: f32, report: Option<usize>, then: AfterFade) {
        let from = self.opacity.get(&element).copied().unwrap_or(0.0);
        let id = FadeId(self.next_fade);
        self.next_fade += 1;
        self.fades.insert(
            id,
            ActiveFade {
                element,
                from,
                to,
                report,
                then,
            },
        );

        match &self.animator {
            Some(animator) => {
                let frames = FrameSink::new(id, self.channels.internal_tx.clone());
                let fade = Fade {
                    element,
                    from,
                    to,
                    duration: self.options.fade_duration,
                };
                let run = animator.fade(fade, frames);
                let tx = self.channels.internal_tx.clone();
                tokio::spawn(async move {
                    run.await;
                    let _ = tx.send(Internal::FadeDone(id));
                });
            }
            None => {
                // No animator: jump straight to the target and report the
                // endpoints so progress listeners still see 0 and 1.
                if let Some(index) = report {
                    self.emit(EventKind::TransitionProgress, index, Some(0.0));
                }
                self.set_opacity(element, to);
                if let Some(index) = report {
                    self.emit(EventKind::TransitionProgress, index, Some(1.0));
                }
                let _ = self.channels.internal_tx.send(Internal::FadeDone(id));
            }
        }
    }

    fn on_frame(&mut self, id: FadeId, progress: f32) {
        let Some(fade) = self.fades.get(&id) else {
            return;
        };
        let (element, report) = (fade.element, fade.report);
        if !self.opacity.contains_key(&element) {
            return;
        }
        let opacity = fade.from + (fade.to - fade.from) * progress;
        self.set_opacity(element, opacity);
        if let Some(index) = report {
            self.emit(EventKind::TransitionProgress, index, Some(progress));
        }
    }

    fn on_fade_done(&mut self, id: FadeId) {
        let Some(fade) = self.fades.remove(&id) else {
            return;
        };
        if self.opacity.contains_key(&fade.element) {
            self.set_opacity(fade.element, fade.to);
        }
        match fade.then {
            AfterFade::Nothing => {}
            AfterFade::OutgoingDone { target } => {
                if self.slots[target].loaded {
                    self.fade_in(target);
                } else {
                    debug!(index = target, "waiting for slide to finish loading");
                    self.slots[target].show_on_load = true;
                }
            }
            AfterFade::Shown { index } => self.on_shown(index),
        }
    }

    /// Raises `index` and fades it in with progress reporting.
    fn fade_in(&mut self, index: usize) {
        let Some(element) = self.slots[index].element else {
            warn!(index, "slide has no mounted element to fade in");
            return;
        };
        self.surface.raise(element);
        self.emit(EventKind::SlideChangeStart, index, None);
        self.start_fade(element, 1.0, Some(index), AfterFade::Shown { index });
    }

    fn fade_out_current(&mut self, then: AfterFade) {
        match self.slots[self.current].element {
            Some(element) => self.start_fade(element, 0.0, None, then),
            None => self.on_after_missing_outgoing(then),
        }
    }

    fn on_after_missing_outgoing(&mut self, then: AfterFade) {
        if let AfterFade::OutgoingDone { target } = then {
            if self.slots[target].loaded {
                self.fade_in(target);
            } else {
                self.slots[target].show_on_load = true;
            }
        }
    }

    /// Moves from the current slide to `target`, whose element is mounted.
    fn begin_transition(&mut self, target: usize) {
        self.cancel_timer();
        self.incoming = Some(target);
        self.transitioning = true;
        self.publish();
        if self.slots[target].loaded {
            self.fade_out_current(AfterFade::Nothing);
            self.fade_in(target);
        } else {
            debug!(index = target, "next slide still loading");
            self.set_loading_visible(true);
            self.fade_out_current(AfterFade::OutgoingDone { target });
        }
    }

    fn on_shown(&mut self, index: usize) {
        // Transitions cancel the timer before starting, so this only fires
        // if that ordering is ever broken.
        if self.timer.take().is_some() {
            warn!(index, "overlapping advance timers; cancelled the stale one");
        }
        self.set_loading_visible(false);

        let mut keep = Vec::with_capacity(2);
        keep.extend(self.slots[index].element);
        keep.extend(self.loading);
        self.surface.retain(&keep);
        self.opacity.retain(|element, _| keep.contains(element));
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if i != index {
                *slot = SlideSlot::default();
            }
        }

        self.current = index;
        self.incoming = None;
        self.transitioning = false;
        self.publish();
        info!(index, src = %self.slides[index].src, "slide shown");
        self.emit(EventKind::SlideChangeEnd, index, None);

        self.upcoming = None;
        if self.slides.len() > 1 {
            let next = (index + 1) % self.slides.len();
            self.prepare(next, false);
            self.upcoming = Some(next);
        }

        if let Some(request) = self.pending.take() {
            debug!(?request, "applying queued request");
            self.apply(request);
        }
        if self.playing && !self.transitioning && self.timer.is_none() {
            self.arm_timer();
        }
    }

    fn arm_timer(&mut self) {
        if self.upcoming.is_none() {
            debug!("single slide show; nothing to advance to");
            return;
        }
        let duration = self.slides[self.current].display_duration(self.options.default_duration);
        debug!(index = self.current, ?duration, "advance timer armed");
        self.timer = Some(Box::pin(sleep(duration)));
    }

    fn cancel_timer(&mut self) {
        if self.timer.take().is_some() {
            debug!("advance timer cancelled");
        }
    }

    fn on_timer(&mut self) {
        self.timer = None;
        if self.playing && !self.transitioning {
            self.advance();
        }
    }

    fn advance(&mut self) {
        let target = match self.upcoming {
            Some(next) => next,
            None if self.slides.len() > 1 => {
                let next = (self.current + 1) % self.slides.len();
                self.prepare(next, false);
                self.upcoming = Some(next);
                next
            }
            None => {
                debug!("single slide show; ignoring advance");
                return;
            }
        };
        self.begin_transition(target);
    }

    fn jump(&mut self, target: usize) {
        if target >= self.slides.len() {
            warn!(index = target, "dropping jump to an index past the end");
            return;
        }
        if target == self.current {
            info!(index = target, "ignored a jump to the slide already shown");
            return;
        }
        self.cancel_timer();
        if self.upcoming != Some(target) {
            self.prepare(target, false);
            self.upcoming = Some(target);
        }
        self.begin_transition(target);
    }

    fn apply(&mut self, request: Request) {
        match request {
            Request::Pause => {
                if self.playing {
                    self.playing = false;
                    self.cancel_timer();
                    self.publish();
                    info!(index = self.current, "paused");
                }
            }
            Request::Resume => {
                if !self.playing {
                    self.playing = true;
                    self.publish();
                    info!(index = self.current, "resumed");
                    if !self.transitioning {
                        self.arm_timer();
                    }
                }
            }
            Request::Advance => self.advance(),
            Request::Jump(target) => self.jump(target),
        }
    }

    /// Applies `request` now, or queues it while a transition is in flight.
    /// A jump to the slide already fading in is dropped rather than queued so
    /// it cannot displace an earlier request.
    fn on_command(&mut self, Command { request, accepted }: Command) {
        match request {
            Request::Jump(target) if self.transitioning && self.incoming == Some(target) => {
                info!(index = target, "ignored a jump to the slide already coming in");
            }
            _ if self.transitioning => {
                if let Some(dropped) = self.pending.replace(request) {
                    debug!(?dropped, ?request, "replaced queued request");
                } else {
                    debug!(?request, "queued until the transition completes");
                }
            }
            _ => self.apply(request),
        }
        let _ = accepted.send(());
    }

    fn on_internal(&mut self, event: Internal) {
        match event {
            Internal::Preloaded {
                index,
                element,
                result,
            } => self.on_preloaded(index, element, result),
            Internal::Frame { fade, progress } => self.on_frame(fade, progress),
            Internal::FadeDone(fade) => self.on_fade_done(fade),
        }
    }
}

async fn timer_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(deadline) => deadline.await,
        None => pending().await,
    }
}

/// Drives `controller` until `cancel` fires.
pub(crate) async fn run(
    mut controller: Controller,
    mut commands: Receiver<Command>,
    mut internal: UnboundedReceiver<Internal>,
    cancel: CancellationToken,
) -> Result<()> {
    controller.start();
    loop {
        select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(command) = commands.recv() => controller.on_command(command),
            Some(event) = internal.recv() => controller.on_internal(event),
            _ = timer_elapsed(&mut controller.timer) => controller.on_timer(),
        }
    }
    debug!(index = controller.current, "slideshow controller stopped");
    Ok(())
}
