//! Listener registry and the events handed to listeners.

use std::fmt;
use std::sync::Arc;

use crate::slide::Slide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SlideChangeStart,
    SlideChangeEnd,
    TransitionProgress,
}

/// What a listener receives.
#[derive(Clone)]
pub struct SlideEvent {
    pub kind: EventKind,
    /// Id of the container surface.
    pub container: Arc<str>,
    pub slides: Arc<[Slide]>,
    /// Slide the event is about: the incoming slide for start and progress
    /// events, the now-current slide for end events.
    pub index: usize,
    /// Fade-in progress in `0..=1`; only set on progress events.
    pub progress: Option<f32>,
}

impl SlideEvent {
    pub fn slide(&self) -> &Slide {
        &self.slides[self.index]
    }
}

impl fmt::Debug for SlideEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlideEvent")
            .field("kind", &self.kind)
            .field("container", &self.container)
            .field("index", &self.index)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

pub type Listener = Arc<dyn Fn(&SlideEvent) + Send + Sync>;

/// Wraps a closure as a [`Listener`]. Keep the returned value around to
/// remove the listener later; identity is the allocation, not the closure.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&SlideEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Ordered set of listeners keyed by identity.
#[derive(Clone, Default)]
pub struct ListenerSet {
    entries: Vec<Listener>,
}

impl ListenerSet {
    /// Adds `listener` at the end. Re-inserting a registered listener moves
    /// it to the end. Returns `true` if it was not registered before.
    pub fn insert(&mut self, listener: &Listener) -> bool {
        let existed = self.remove(listener);
        self.entries.push(Arc::clone(listener));
        !existed
    }

    pub fn remove(&mut self, listener: &Listener) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| !same_listener(l, listener));
        before != self.entries.len()
    }

    pub fn contains(&self, listener: &Listener) -> bool {
        self.entries.iter().any(|l| same_listener(l, listener))
    }

    pub fn snapshot(&self) -> Vec<Listener> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Listeners {
    start: ListenerSet,
    end: ListenerSet,
    progress: ListenerSet,
}

impl Listeners {
    pub fn set(&self, kind: EventKind) -> &ListenerSet {
        match kind {
            EventKind::SlideChangeStart => &self.start,
            EventKind::SlideChangeEnd => &self.end,
            EventKind::TransitionProgress => &self.progress,
        }
    }

    pub fn set_mut(&mut self, kind: EventKind) -> &mut ListenerSet {
        match kind {
            EventKind::SlideChangeStart => &mut self.start,
            EventKind::SlideChangeEnd => &mut self.end,
            EventKind::TransitionProgress => &mut self.progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(kind: EventKind) -> SlideEvent {
        SlideEvent {
            kind,
            container: Arc::from("show"),
            slides: Arc::from(vec![Slide::new("a.jpg")]),
            index: 0,
            progress: None,
        }
    }

    #[test]
    fn reinserting_moves_to_end_without_duplicating() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let a = {
            let order = order.clone();
            listener(move |_| order.lock().push("a"))
        };
        let b = {
            let order = order.clone();
            listener(move |_| order.lock().push("b"))
        };

        let mut set = ListenerSet::default();
        assert!(set.insert(&a));
        assert!(set.insert(&b));
        assert!(!set.insert(&a));
        assert_eq!(set.len(), 2);

        let ev = event(EventKind::SlideChangeEnd);
        for l in set.snapshot() {
            l(&ev);
        }
        assert_eq!(*order.lock(), vec!["b", "a"]);
    }

    #[test]
    fn identical_closures_are_distinct_listeners() {
        let hits = Arc::new(AtomicUsize::new(0));
        let make = || {
            let hits = hits.clone();
            listener(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        let first = make();
        let second = make();

        let mut set = ListenerSet::default();
        set.insert(&first);
        set.insert(&second);
        assert_eq!(set.len(), 2);

        assert!(set.remove(&first));
        assert!(!set.remove(&first));
        assert!(set.contains(&second));
        assert!(!set.contains(&first));
    }

    #[test]
    fn kinds_are_independent() {
        let l = listener(|_| {});
        let mut listeners = Listeners::default();
        listeners.set_mut(EventKind::SlideChangeStart).insert(&l);
        assert_eq!(listeners.set(EventKind::SlideChangeStart).len(), 1);
        assert!(listeners.set(EventKind::SlideChangeEnd).is_empty());
        assert!(listeners.set(EventKind::TransitionProgress).is_empty());
    }

    #[test]
    fn event_exposes_its_slide() {
        let ev = event(EventKind::SlideChangeStart);
        assert_eq!(ev.slide().src, "a.jpg");
    }
}
