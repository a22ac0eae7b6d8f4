use thiserror::Error;

/// Reasons a slideshow could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No container surface was supplied.
    #[error("no container was specified for the slideshow")]
    MissingContainer,

    /// No slide list was supplied.
    #[error("no slide list was specified")]
    MissingSlides,

    /// No default slide duration was supplied (or it was zero).
    #[error("no default slide duration was specified")]
    MissingDefaultDuration,

    /// A slide has an empty image source.
    #[error("slide {index} does not have an image source")]
    MissingImageSource { index: usize },

    /// The container is some other element kind.
    #[error("container `{id}` is a `{tag}`, not a div")]
    NotADiv { id: String, tag: String },

    /// The slide list is empty.
    #[error("no slides were specified for the slideshow")]
    NoSlides,
}

/// Errors returned by requests made through a running slideshow handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlideshowError {
    #[error("cannot jump to index {index}; the highest valid index is {max}")]
    IndexOutOfRange { index: usize, max: usize },

    /// The controller task is no longer running.
    #[error("slideshow controller has stopped")]
    Stopped,
}
