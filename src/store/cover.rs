//! Cover image caches.
//!
//! Decoding a cover means a second pass over an archive, so importers keep
//! decoded covers in a [`CoverCache`] keyed by a string they choose.
//! [`DiskCoverCache`] writes PNG files into a directory; [`MemoryCoverCache`]
//! keeps images in memory.

use image::{DynamicImage, ImageFormat};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{download::sanitize_filename, error::Result};

/// Keyed store of decoded cover images.
///
/// Calls are synchronous; importers use the cache from blocking threads.
pub trait CoverCache: Send + Sync {
    fn get(&self, key: &str) -> Option<DynamicImage>;

    fn put(&self, key: &str, image: &DynamicImage) -> Result<()>;
}

/// Cover cache writing `"{key}.png"` files into a directory.
///
/// Keys are passed through [`sanitize_filename`]. The directory is created
/// on the first write.
#[derive(Debug, Clone)]
pub struct DiskCoverCache {
    dir: PathBuf,
}

impl DiskCoverCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a cover with `key` is stored in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize_filename(key)))
    }
}

impl CoverCache for DiskCoverCache {
    fn get(&self, key: &str) -> Option<DynamicImage> {
        let path = self.path_for(key);
        if !path.is_file() {
            return None;
        }
        match image::open(&path) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cached cover");
                None
            }
        }
    }

    fn put(&self, key: &str, image: &DynamicImage) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        image.save_with_format(self.path_for(key), ImageFormat::Png)?;
        Ok(())
    }
}

/// In-memory cover cache.
#[derive(Default)]
pub struct MemoryCoverCache {
    images: Mutex<HashMap<String, DynamicImage>>,
}

impl MemoryCoverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }
}

impl CoverCache for MemoryCoverCache {
    fn get(&self, key: &str) -> Option<DynamicImage> {
        self.images.lock().get(key).cloned()
    }

    fn put(&self, key: &str, image: &DynamicImage) -> Result<()> {
        self.images.lock().insert(key.to_string(), image.clone());
        Ok(())
    }
}
