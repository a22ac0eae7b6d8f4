use std::time::Duration;

use serde::Deserialize;

/// One image entry in the show.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Slide {
    /// Image source URI.
    pub src: String,
    /// Optional click-through link wrapped around the image.
    #[serde(default)]
    pub link: Option<String>,
    /// Display duration overriding the show's default.
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
}

impl Slide {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            link: None,
            duration: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// How long this slide stays on screen once fully shown.
    pub fn display_duration(&self, default: Duration) -> Duration {
        self.duration.unwrap_or(default)
    }
}
