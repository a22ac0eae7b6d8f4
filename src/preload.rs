use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use tracing::debug;

/// Fetches a slide's image ahead of the transition that shows it.
///
/// A preload whose future is already resolved on first poll counts as a
/// cache hit; the controller then fades without showing the loading
/// indicator.
pub trait Preloader: Send + Sync + 'static {
    fn preload(&self, src: &str) -> BoxFuture<'static, Result<()>>;
}

/// Treats every source as already loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediatePreloader;

impl Preloader for ImmediatePreloader {
    fn preload(&self, _src: &str) -> BoxFuture<'static, Result<()>> {
        future::ready(Ok(())).boxed()
    }
}

/// Decodes image files below `root` on the blocking pool and remembers the
/// sources that decoded successfully.
#[derive(Debug, Clone)]
pub struct FilePreloader {
    root: PathBuf,
    decoded: Arc<Mutex<HashSet<String>>>,
}

impl FilePreloader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            decoded: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_cached(&self, src: &str) -> bool {
        self.decoded.lock().contains(src)
    }
}

impl Preloader for FilePreloader {
    fn preload(&self, src: &str) -> BoxFuture<'static, Result<()>> {
        if self.is_cached(src) {
            return future::ready(Ok(())).boxed();
        }
        let path = self.root.join(src);
        let src = src.to_owned();
        let decoded = Arc::clone(&self.decoded);
        async move {
            let display = path.display().to_string();
            let (width, height) = tokio::task::spawn_blocking(move || decode_dimensions(&path))
                .await
                .context("image decode task failed")?
                .with_context(|| format!("failed to decode {display}"))?;
            debug!(src = %src, width, height, "preloaded");
            decoded.lock().insert(src);
            Ok(())
        }
        .boxed()
    }
}

fn decode_dimensions(path: &Path) -> Result<(u32, u32)> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok((img.width(), img.height()))
}
