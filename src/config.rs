use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::animation::TweenAnimator;
use crate::slide::Slide;
use crate::slideshow::{DEFAULT_FADE_DURATION, DEFAULT_LOADING_INDICATOR};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContainerOptions {
    /// Identifier reported to listeners.
    pub id: String,
    /// Element kind of the container; must be `div`.
    pub tag: String,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            id: "slideshow".to_owned(),
            tag: "div".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    pub container: ContainerOptions,
    /// Slides in display order.
    pub slides: Vec<Slide>,
    /// How long a slide stays up when it has no duration of its own.
    #[serde(with = "humantime_serde")]
    pub default_duration: Option<Duration>,
    /// Cross-fade duration.
    #[serde(with = "humantime_serde")]
    pub fade_duration: Duration,
    /// Classes applied to every mounted element.
    pub css_classes: String,
    /// Image shown while the next slide is still loading.
    pub loading_indicator: String,
    /// Directory slide sources are resolved against.
    pub image_root: PathBuf,
    /// Tick of the fade animator.
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate settings the slideshow builder does not check itself.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.container.id.trim().is_empty(),
            "container.id must not be empty"
        );
        ensure!(
            !self.frame_interval.is_zero(),
            "frame-interval must be greater than zero"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            container: ContainerOptions::default(),
            slides: Vec::new(),
            default_duration: None,
            fade_duration: DEFAULT_FADE_DURATION,
            css_classes: String::new(),
            loading_indicator: DEFAULT_LOADING_INDICATOR.to_owned(),
            image_root: PathBuf::from("."),
            frame_interval: TweenAnimator::DEFAULT_FRAME_INTERVAL,
        }
    }
}
