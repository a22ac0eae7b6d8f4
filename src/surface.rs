//! The container the slideshow renders into.
//!
//! The controller never touches pixels itself. It asks a [`Surface`] to mount
//! elements, change their opacity and stacking, and drop children it no
//! longer needs. [`HeadlessSurface`] keeps an in-memory scene and is what the
//! binary and the tests render into.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::slide::Slide;

/// Opaque identity of an element mounted on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait Surface: Send + 'static {
    /// Identifier handed to listeners as the container handle.
    fn id(&self) -> &str;

    /// Element kind of the container; only `div` containers are accepted.
    fn tag_name(&self) -> &str;

    /// Appends the loading indicator, fully visible.
    fn mount_loading_indicator(&mut self, src: &str, class: &str) -> ElementId;

    /// Appends a transparent, lowered image for `slide`, wrapped in a link
    /// when the slide has one. The returned id is the outermost element.
    fn mount_slide(&mut self, slide: &Slide, class: &str) -> ElementId;

    fn set_opacity(&mut self, element: ElementId, opacity: f32);

    /// Stacks `element` above its siblings.
    fn raise(&mut self, element: ElementId);

    /// Removes every child not listed in `keep`, foreign children included.
    fn retain(&mut self, keep: &[ElementId]);
}

/// Invoked after every element insertion so the embedder can fit new
/// elements to the container.
pub trait ResizeToParent: Send + Sync + 'static {
    fn resize(&self);
}

impl<F> ResizeToParent for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn resize(&self) {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    LoadingIndicator,
    Image,
    /// An image wrapped in a click-through link.
    Link { href: String },
    /// A child the slideshow did not create.
    Foreign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub src: String,
    pub class: String,
    pub opacity: f32,
    pub z_index: i32,
}

#[derive(Debug, Default)]
struct Scene {
    nodes: BTreeMap<ElementId, Node>,
    next_id: u64,
}

impl Scene {
    fn append(&mut self, node: Node) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }
}

/// In-memory container. Clones share the same scene, so a clone kept by the
/// embedder observes what the controller does to the one it owns.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    id: String,
    tag: String,
    scene: Arc<Mutex<Scene>>,
}

impl HeadlessSurface {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            scene: Arc::new(Mutex::new(Scene::default())),
        }
    }

    /// A `div` container with the given id.
    pub fn div(id: impl Into<String>) -> Self {
        Self::new(id, "div")
    }

    pub fn node(&self, element: ElementId) -> Option<Node> {
        self.scene.lock().nodes.get(&element).cloned()
    }

    /// All children in insertion order.
    pub fn nodes(&self) -> Vec<(ElementId, Node)> {
        self.scene
            .lock()
            .nodes
            .iter()
            .map(|(id, node)| (*id, node.clone()))
            .collect()
    }

    /// The topmost fully opaque image or link, if any.
    pub fn visible_src(&self) -> Option<String> {
        self.scene
            .lock()
            .nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Image | NodeKind::Link { .. }))
            .filter(|n| n.opacity >= 1.0)
            .max_by_key(|n| n.z_index)
            .map(|n| n.src.clone())
    }

    pub fn loading_indicator_visible(&self) -> bool {
        self.scene
            .lock()
            .nodes
            .values()
            .any(|n| n.kind == NodeKind::LoadingIndicator && n.opacity > 0.0)
    }

    /// Appends a child the slideshow knows nothing about.
    pub fn insert_foreign(&self, src: impl Into<String>) -> ElementId {
        self.scene.lock().append(Node {
            kind: NodeKind::Foreign,
            src: src.into(),
            class: String::new(),
            opacity: 1.0,
            z_index: 0,
        })
    }
}

impl Surface for HeadlessSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn mount_loading_indicator(&mut self, src: &str, class: &str) -> ElementId {
        let id = self.scene.lock().append(Node {
            kind: NodeKind::LoadingIndicator,
            src: src.to_owned(),
            class: class.to_owned(),
            opacity: 1.0,
            z_index: 0,
        });
        debug!(container = %self.id, element = %id, src, "mounted loading indicator");
        id
    }

    fn mount_slide(&mut self, slide: &Slide, class: &str) -> ElementId {
        let kind = match &slide.link {
            Some(href) => NodeKind::Link { href: href.clone() },
            None => NodeKind::Image,
        };
        let id = self.scene.lock().append(Node {
            kind,
            src: slide.src.clone(),
            class: class.to_owned(),
            opacity: 0.0,
            z_index: 0,
        });
        debug!(container = %self.id, element = %id, src = %slide.src, "mounted slide");
        id
    }

    fn set_opacity(&mut self, element: ElementId, opacity: f32) {
        if let Some(node) = self.scene.lock().nodes.get_mut(&element) {
            trace!(element = %element, opacity, "opacity");
            node.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn raise(&mut self, element: ElementId) {
        if let Some(node) = self.scene.lock().nodes.get_mut(&element) {
            node.z_index = 1;
        }
    }

    fn retain(&mut self, keep: &[ElementId]) {
        let mut scene = self.scene.lock();
        let before = scene.nodes.len();
        scene.nodes.retain(|id, _| keep.contains(id));
        let removed = before - scene.nodes.len();
        if removed > 0 {
            debug!(container = %self.id, removed, "removed stale children");
        }
    }
}
