pub mod animation;
pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod listeners;
pub mod preload;
pub mod slide;
pub mod slideshow;
pub mod surface;
pub(crate) mod tasks {
    pub mod controller;
    pub mod dispatch;
}

pub use error::{BuildError, SlideshowError};
pub use listeners::{EventKind, Listener, SlideEvent, listener};
pub use slide::Slide;
pub use slideshow::{SlideshowBuilder, SlideshowHandle};
