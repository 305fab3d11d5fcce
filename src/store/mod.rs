//! Persistence collaborators.
//!
//! The library never owns a database. It talks to storage through two small
//! traits injected by the caller:
//!
//! - [`ChapterStore`] - chapter lists keyed by book URL
//! - [`NovelFileStore`] - imported local file records keyed by ID
//!
//! [`MemoryStore`] implements both in memory and [`JsonChapterStore`] keeps
//! one JSON file per book on disk. Cover images go through the separate
//! [`CoverCache`] trait in [`cover`].
//!
//! # Examples
//!
//! ```rust
//! use yomu::store::{ChapterStore, MemoryStore};
//! use yomu::types::{Chapter, ChapterMetadata};
//!
//! # async fn example() -> yomu::Result<()> {
//! let store = MemoryStore::new();
//! let book = "https://www.royalroad.com/fiction/21220";
//! let rows = Chapter::from_metadata(book, vec![
//!     ChapterMetadata::new("1. Good Morning Brother", format!("{}/chapter/1", book)),
//! ]);
//!
//! store.insert_chapters(rows).await?;
//! assert_eq!(store.chapters(book).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::{error::Result, import::NovelFileInfo, types::Chapter};

pub mod cover;

pub use cover::{CoverCache, DiskCoverCache, MemoryCoverCache};

/// Chapter persistence keyed by book URL.
///
/// Chapter URLs are unique within a store: inserting a chapter whose URL is
/// already stored leaves the stored row untouched.
#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Chapters of `book_url` ordered by position; empty when none are stored.
    async fn chapters(&self, book_url: &str) -> Result<Vec<Chapter>>;

    /// Inserts chapters, ignoring those whose URL is already stored.
    async fn insert_chapters(&self, chapters: Vec<Chapter>) -> Result<()>;
}

/// Persistence of imported local file records.
#[async_trait]
pub trait NovelFileStore: Send + Sync {
    /// Records whose `directory` equals `directory`.
    async fn get_for_directory(&self, directory: &str) -> Result<Vec<NovelFileInfo>>;

    async fn get(&self, id: &str) -> Result<Option<NovelFileInfo>>;

    async fn get_all(&self) -> Result<Vec<NovelFileInfo>>;

    /// Inserts `info` unless a record with the same ID exists. Returns whether
    /// it was inserted.
    async fn insert(&self, info: NovelFileInfo) -> Result<bool>;

    /// Inserts or replaces the record with the same ID.
    async fn upsert(&self, info: NovelFileInfo) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Default)]
struct MemoryState {
    chapters: HashMap<String, Vec<Chapter>>,
    chapter_urls: HashSet<String>,
    files: BTreeMap<String, NovelFileInfo>,
}

/// In-memory [`ChapterStore`] and [`NovelFileStore`].
///
/// # Thread Safety
///
/// All state sits behind one `Mutex`; the lock is never held across an
/// await point.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChapterStore for MemoryStore {
    async fn chapters(&self, book_url: &str) -> Result<Vec<Chapter>> {
        let mut chapters = self
            .state
            .lock()
            .chapters
            .get(book_url)
            .cloned()
            .unwrap_or_default();
        chapters.sort_by_key(|c| c.position);
        Ok(chapters)
    }

    async fn insert_chapters(&self, chapters: Vec<Chapter>) -> Result<()> {
        let mut state = self.state.lock();
        for chapter in chapters {
            if state.chapter_urls.insert(chapter.url.clone()) {
                state
                    .chapters
                    .entry(chapter.book_url.clone())
                    .or_default()
                    .push(chapter);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NovelFileStore for MemoryStore {
    async fn get_for_directory(&self, directory: &str) -> Result<Vec<NovelFileInfo>> {
        Ok(self
            .state
            .lock()
            .files
            .values()
            .filter(|f| f.directory == directory)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<NovelFileInfo>> {
        Ok(self.state.lock().files.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<NovelFileInfo>> {
        Ok(self.state.lock().files.values().cloned().collect())
    }

    async fn insert(&self, info: NovelFileInfo) -> Result<bool> {
        let mut state = self.state.lock();
        if state.files.contains_key(&info.id) {
            return Ok(false);
        }
        state.files.insert(info.id.clone(), info);
        Ok(true)
    }

    async fn upsert(&self, info: NovelFileInfo) -> Result<()> {
        self.state.lock().files.insert(info.id.clone(), info);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.state.lock().files.remove(id);
        Ok(())
    }
}

/// [`ChapterStore`] keeping one pretty-printed JSON file per book.
///
/// Files are named by the UUID v5 of the book URL, so any URL maps to a
/// valid file name. URL uniqueness is enforced per book.
#[derive(Debug, Clone)]
pub struct JsonChapterStore {
    dir: PathBuf,
}

impl JsonChapterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the chapters of `book_url`.
    pub fn path_for(&self, book_url: &str) -> PathBuf {
        let name = Uuid::new_v5(&Uuid::NAMESPACE_URL, book_url.as_bytes());
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl ChapterStore for JsonChapterStore {
    async fn chapters(&self, book_url: &str) -> Result<Vec<Chapter>> {
        let bytes = match tokio::fs::read(self.path_for(book_url)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut chapters: Vec<Chapter> = serde_json::from_slice(&bytes)?;
        chapters.sort_by_key(|c| c.position);
        Ok(chapters)
    }

    async fn insert_chapters(&self, chapters: Vec<Chapter>) -> Result<()> {
        let mut by_book: BTreeMap<String, Vec<Chapter>> = BTreeMap::new();
        for chapter in chapters {
            by_book.entry(chapter.book_url.clone()).or_default().push(chapter);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        for (book_url, new_chapters) in by_book {
            let mut stored = self.chapters(&book_url).await?;
            let mut urls: HashSet<String> = stored.iter().map(|c| c.url.clone()).collect();
            let before = stored.len();
            stored.extend(new_chapters.into_iter().filter(|c| urls.insert(c.url.clone())));

            let path = self.path_for(&book_url);
            debug!(book = %book_url, added = stored.len() - before, path = %path.display(), "writing chapters");
            tokio::fs::write(&path, serde_json::to_vec_pretty(&stored)?).await?;
        }
        Ok(())
    }
}
