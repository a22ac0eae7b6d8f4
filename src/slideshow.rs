use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::animation::Animator;
use crate::config::Configuration;
use crate::error::{BuildError, SlideshowError};
use crate::events::{Command, Request, Snapshot};
use crate::listeners::{EventKind, Listener, Listeners, SlideEvent};
use crate::preload::{ImmediatePreloader, Preloader};
use crate::slide::Slide;
use crate::surface::{ResizeToParent, Surface};
use crate::tasks::controller::{self, Channels, Collaborators, Controller, Options};
use crate::tasks::dispatch::{self, Dispatch};

pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(500);
pub const DEFAULT_LOADING_INDICATOR: &str = "EasySlideshowJSLoading.gif";

/// Collects construction inputs and starts a slideshow.
///
/// `container`, `slides` and `default_duration` are required; everything
/// else has a default.
#[derive(Default)]
pub struct SlideshowBuilder {
    container: Option<Box<dyn Surface>>,
    slides: Option<Vec<Slide>>,
    default_duration: Option<Duration>,
    fade_duration: Option<Duration>,
    css_classes: Option<String>,
    loading_indicator: Option<String>,
    animator: Option<Arc<dyn Animator>>,
    preloader: Option<Arc<dyn Preloader>>,
    resizer: Option<Arc<dyn ResizeToParent>>,
    cancel: Option<CancellationToken>,
}

impl SlideshowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes slides, durations, classes and the loading indicator from
    /// `cfg`. Collaborators still have to be supplied separately.
    pub fn from_config(cfg: &Configuration) -> Self {
        let mut builder = Self::new()
            .slides(cfg.slides.clone())
            .fade_duration(cfg.fade_duration)
            .css_classes(cfg.css_classes.clone())
            .loading_indicator(cfg.loading_indicator.clone());
        builder.default_duration = cfg.default_duration;
        builder
    }

    pub fn container(mut self, surface: impl Surface) -> Self {
        self.container = Some(Box::new(surface));
        self
    }

    pub fn slides(mut self, slides: impl Into<Vec<Slide>>) -> Self {
        self.slides = Some(slides.into());
        self
    }

    pub fn default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = Some(duration);
        self
    }

    /// A zero duration falls back to the 500 ms default.
    pub fn fade_duration(mut self, duration: Duration) -> Self {
        self.fade_duration = Some(duration);
        self
    }

    pub fn css_classes(mut self, classes: impl Into<String>) -> Self {
        self.css_classes = Some(classes.into());
        self
    }

    pub fn loading_indicator(mut self, src: impl Into<String>) -> Self {
        self.loading_indicator = Some(src.into());
        self
    }

    pub fn animator(mut self, animator: impl Animator) -> Self {
        self.animator = Some(Arc::new(animator));
        self
    }

    pub fn preloader(mut self, preloader: impl Preloader) -> Self {
        self.preloader = Some(Arc::new(preloader));
        self
    }

    pub fn resizer(mut self, resizer: impl ResizeToParent) -> Self {
        self.resizer = Some(Arc::new(resizer));
        self
    }

    /// Token that stops the slideshow when cancelled. A fresh one is used
    /// when none is given.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validates the inputs and spawns the controller and listener tasks on
    /// the current tokio runtime.
    ///
    /// # Errors
    /// Returns the first validation failure; it is also logged.
    pub fn spawn(self) -> Result<SlideshowHandle, BuildError> {
        self.spawn_inner().inspect_err(|err| {
            error!(error = %err, "slideshow construction aborted");
        })
    }

    fn spawn_inner(self) -> Result<SlideshowHandle, BuildError> {
        let container = self.container.ok_or(BuildError::MissingContainer)?;
        let slides = self.slides.ok_or(BuildError::MissingSlides)?;
        let default_duration = self
            .default_duration
            .filter(|d| !d.is_zero())
            .ok_or(BuildError::MissingDefaultDuration)?;
        if let Some(index) = slides.iter().position(|s| s.src.trim().is_empty()) {
            return Err(BuildError::MissingImageSource { index });
        }
        if !container.tag_name().eq_ignore_ascii_case("div") {
            return Err(BuildError::NotADiv {
                id: container.id().to_owned(),
                tag: container.tag_name().to_owned(),
            });
        }
        if slides.is_empty() {
            return Err(BuildError::NoSlides);
        }

        if self.resizer.is_none() {
            warn!("no resize-to-parent hook supplied; slides keep their natural size");
        }
        if self.animator.is_none() {
            warn!("no fade animator supplied; slide changes will be instantaneous");
        }
        let preloader = self.preloader.unwrap_or_else(|| {
            debug!("no preloader supplied; treating every image as loaded");
            Arc::new(ImmediatePreloader) as Arc<dyn Preloader>
        });
        let options = Options {
            default_duration,
            fade_duration: self
                .fade_duration
                .filter(|d| !d.is_zero())
                .unwrap_or(DEFAULT_FADE_DURATION),
            css_classes: self.css_classes.unwrap_or_default(),
            loading_indicator: self
                .loading_indicator
                .unwrap_or_else(|| DEFAULT_LOADING_INDICATOR.to_owned()),
        };
        let cancel = self.cancel.unwrap_or_default();

        let slides: Arc<[Slide]> = Arc::from(slides);
        let container_id: Arc<str> = Arc::from(container.id());
        let listeners = Arc::new(Mutex::new(Listeners::default()));
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel::<Dispatch>();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel::<Command>(16);
        let (state_tx, state_rx) = watch::channel(Snapshot {
            index: 0,
            playing: true,
            transitioning: true,
        });

        let controller = Controller::new(
            Arc::clone(&slides),
            options,
            Collaborators {
                surface: container,
                animator: self.animator,
                preloader,
                resizer: self.resizer,
            },
            Arc::clone(&listeners),
            Channels {
                dispatch: dispatch_tx.clone(),
                internal_tx,
                state: state_tx,
            },
        );

        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if let Err(err) = dispatch::run(dispatch_rx, cancel).await {
                    warn!("listener dispatcher failed: {err:#}");
                }
            }
        });
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if let Err(err) = controller::run(controller, command_rx, internal_rx, cancel).await
                {
                    warn!("slideshow controller failed: {err:#}");
                }
            }
        });

        Ok(SlideshowHandle {
            commands: command_tx,
            state: state_rx,
            slides,
            container: container_id,
            listeners,
            dispatch: dispatch_tx,
            cancel,
        })
    }
}

/// Controls a running slideshow. Clones control the same show.
#[derive(Clone)]
pub struct SlideshowHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<Snapshot>,
    slides: Arc<[Slide]>,
    container: Arc<str>,
    listeners: Arc<Mutex<Listeners>>,
    dispatch: mpsc::UnboundedSender<Dispatch>,
    cancel: CancellationToken,
}

impl SlideshowHandle {
    pub fn snapshot(&self) -> Snapshot {
        *self.state.borrow()
    }

    /// Receiver that observes every published state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot().playing
    }

    /// Zero-based index of the slide on screen.
    pub fn current_index(&self) -> usize {
        self.snapshot().index
    }

    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.current_index()]
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn container_id(&self) -> &str {
        &self.container
    }

    pub async fn resume(&self) -> Result<(), SlideshowError> {
        self.request(Request::Resume).await
    }

    pub async fn pause(&self) -> Result<(), SlideshowError> {
        self.request(Request::Pause).await
    }

    /// Moves on to the next slide now, whether playing or paused.
    pub async fn advance(&self) -> Result<(), SlideshowError> {
        self.request(Request::Advance).await
    }

    /// Jumps to the zero-based `index`. Jumping to the slide already shown
    /// does nothing.
    ///
    /// # Errors
    /// [`SlideshowError::IndexOutOfRange`] when `index` is past the last
    /// slide; the request is logged and dropped.
    pub async fn jump_to(&self, index: usize) -> Result<(), SlideshowError> {
        let max = self.slides.len() - 1;
        if index > max {
            error!(index, max, "cannot jump past the last slide");
            return Err(SlideshowError::IndexOutOfRange { index, max });
        }
        self.request(Request::Jump(index)).await
    }

    async fn request(&self, request: Request) -> Result<(), SlideshowError> {
        let (accepted, ack) = oneshot::channel();
        self.commands
            .send(Command { request, accepted })
            .await
            .map_err(|_| SlideshowError::Stopped)?;
        ack.await.map_err(|_| SlideshowError::Stopped)
    }

    /// Registers `listener` for `kind`. Registering it again moves it to the
    /// end of the list instead of adding a second entry.
    pub fn add_listener(&self, kind: EventKind, listener: &Listener) {
        self.listeners.lock().set_mut(kind).insert(listener);
    }

    pub fn remove_listener(&self, kind: EventKind, listener: &Listener) {
        self.listeners.lock().set_mut(kind).remove(listener);
    }

    /// Registers a slide-change-end listener. With `fire_now` it also gets
    /// an event for the current slide, delivered on the dispatcher task.
    pub fn add_slide_change_end_listener(&self, listener: &Listener, fire_now: bool) {
        self.add_listener(EventKind::SlideChangeEnd, listener);
        if fire_now {
            let event = SlideEvent {
                kind: EventKind::SlideChangeEnd,
                container: Arc::clone(&self.container),
                slides: Arc::clone(&self.slides),
                index: self.current_index(),
                progress: None,
            };
            let _ = self.dispatch.send(Dispatch {
                listeners: vec![Arc::clone(listener)],
                event,
            });
        }
    }

    /// Stops the controller and listener tasks.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
