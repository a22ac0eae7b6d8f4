#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use easy_slideshow::animation::TweenAnimator;
use easy_slideshow::preload::Preloader;
use easy_slideshow::surface::HeadlessSurface;
use easy_slideshow::{EventKind, Listener, Slide, SlideshowBuilder, listener};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;

pub const DEFAULT: Duration = Duration::from_millis(1000);
pub const FADE: Duration = Duration::from_millis(200);
pub const FRAME: Duration = Duration::from_millis(50);

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub fn three_slides() -> Vec<Slide> {
    vec![
        Slide::new("a.jpg"),
        Slide::new("b.jpg").with_link("https://example.com/b"),
        Slide::new("c.jpg"),
    ]
}

/// A show on `surface` with a 1000 ms default, a 200 ms fade ticking every
/// 50 ms, and every image already loaded. Slide 0 is shown at t=200 and
/// each later slide 1200 ms after the previous one.
pub fn builder(surface: &HeadlessSurface, slides: Vec<Slide>) -> SlideshowBuilder {
    SlideshowBuilder::new()
        .container(surface.clone())
        .slides(slides)
        .default_duration(DEFAULT)
        .fade_duration(FADE)
        .animator(TweenAnimator::new(FRAME))
        .resizer(|| {})
}

/// Preloads that take a scripted amount of time or fail; unlisted sources
/// are cache hits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPreloader {
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
}

impl ScriptedPreloader {
    pub fn with_delay(mut self, src: &str, delay: Duration) -> Self {
        self.delays.insert(src.to_owned(), delay);
        self
    }

    pub fn with_failure(mut self, src: &str) -> Self {
        self.failures.insert(src.to_owned());
        self
    }
}

impl Preloader for ScriptedPreloader {
    fn preload(&self, src: &str) -> BoxFuture<'static, anyhow::Result<()>> {
        if self.failures.contains(src) {
            return future::ready(Err(anyhow::anyhow!("cannot decode {src}"))).boxed();
        }
        match self.delays.get(src).copied() {
            Some(delay) => async move {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            .boxed(),
            None => future::ready(Ok(())).boxed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seen {
    pub kind: EventKind,
    pub index: usize,
    pub progress: Option<f32>,
}

/// Records every event it is registered for.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    pub fn listener(&self) -> Listener {
        let seen = Arc::clone(&self.seen);
        listener(move |ev| {
            seen.lock().push(Seen {
                kind: ev.kind,
                index: ev.index,
                progress: ev.progress,
            })
        })
    }

    pub fn indices(&self, kind: EventKind) -> Vec<usize> {
        self.seen
            .lock()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.index)
            .collect()
    }

    pub fn progress(&self) -> Vec<(usize, f32)> {
        self.seen
            .lock()
            .iter()
            .filter_map(|s| s.progress.map(|p| (s.index, p)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }
}
