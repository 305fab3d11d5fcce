//! Local file import.
//!
//! An [`Extractor`] reads the metadata and cover of one local file. EPUB
//! files get a full metadata and table-of-contents parse through
//! [`EpubExtractor`]; every other file is described from its name and
//! modification time by [`FileExtractor`]. [`extractor_for`] picks between
//! them by extension.
//!
//! [`scan_directory`] extracts every file of a directory and upserts the
//! results into a [`NovelFileStore`], while [`cached_directory`] returns what
//! the store already holds without touching the files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use yomu::import::{self, Extractor};
//! use yomu::store::{DiskCoverCache, MemoryStore};
//! use std::path::Path;
//!
//! # async fn example() -> yomu::Result<()> {
//! let store = MemoryStore::new();
//! let books = import::scan_directory(Path::new("/books"), &store).await?;
//!
//! let cache = DiskCoverCache::new("/tmp/yomu-covers");
//! for book in &books {
//!     let cover = import::extractor_for(Path::new(&book.path))?.cover(&cache);
//!     println!("{} ({:?})", book.title, cover.origin);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    store::{CoverCache, NovelFileStore},
};

pub mod cover;
pub mod epub;
pub mod file;
mod listing;

pub use epub::EpubExtractor;
pub use file::FileExtractor;
pub use listing::{DirectoryListing, FileEntry, FolderCounts, SortKey, Sorting, format_size, list_directory};

/// A table-of-contents entry of a local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    /// Label shown in the table of contents
    pub title: String,

    /// Archive-relative target of the entry
    pub src: String,
}

impl ChapterInfo {
    pub fn new(title: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            src: src.into(),
        }
    }
}

/// Metadata of an imported local file, as kept by a [`NovelFileStore`].
///
/// The reading-state fields (`progress`, `current_chapter`,
/// `chapter_progress`, `is_favorite`) are owned by the caller; directory
/// scans carry them over from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovelFileInfo {
    /// UUID v5 of the canonical absolute path
    pub id: String,

    /// Absolute path of the file
    pub path: String,

    /// Absolute path of the containing directory
    pub directory: String,

    /// Package identifier (ISBN, UUID, ...) when the format has one
    #[serde(default)]
    pub identifier: String,

    pub author: String,

    /// Publication date, or the file modification time
    pub date: DateTime<Utc>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub chapters: Vec<ChapterInfo>,

    #[serde(default)]
    pub progress: u32,

    #[serde(default)]
    pub current_chapter: usize,

    #[serde(default)]
    pub chapter_progress: u32,

    #[serde(default)]
    pub is_favorite: bool,
}

impl NovelFileInfo {
    /// A record with the location fields and modification time of `path` and
    /// everything else empty.
    pub fn for_path(path: &Path) -> Self {
        let absolute = canonical_path(path);
        let directory = absolute
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id: novel_id(&absolute),
            path: absolute.to_string_lossy().into_owned(),
            directory,
            identifier: String::new(),
            author: String::new(),
            date: modified_time(path),
            tags: Vec::new(),
            title: String::new(),
            description: String::new(),
            chapters: Vec::new(),
            progress: 0,
            current_chapter: 0,
            chapter_progress: 0,
            is_favorite: false,
        }
    }

    /// The date as `dd-mm-yyyy`.
    pub fn date_formatted(&self) -> String {
        self.date.format("%d-%m-%Y").to_string()
    }

    /// Copies the reading state of a previously stored record.
    pub fn keep_progress_of(&mut self, stored: &NovelFileInfo) {
        self.progress = stored.progress;
        self.current_chapter = stored.current_chapter;
        self.chapter_progress = stored.chapter_progress;
        self.is_favorite = stored.is_favorite;
    }
}

/// Where a [`Cover`] image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOrigin {
    /// Previously decoded cover read back from the cover cache
    Cache,
    /// Image referenced as the cover by the package manifest
    Manifest,
    /// Image entry whose name contains "cover"
    NamedImage,
    /// First image entry of the archive
    FirstImage,
    /// Rendered from the title
    Placeholder,
}

/// A cover image with its alternative text.
#[derive(Debug, Clone)]
pub struct Cover {
    pub image: DynamicImage,
    pub alt_text: String,
    pub origin: CoverOrigin,
}

impl Cover {
    /// Renders a placeholder cover showing `title`.
    pub fn placeholder(title: &str) -> Self {
        Self {
            image: cover::placeholder(title),
            alt_text: title.to_string(),
            origin: CoverOrigin::Placeholder,
        }
    }
}

/// Reads metadata and a cover from one local file.
///
/// Extraction is synchronous file I/O; run it on a blocking thread
/// (`tokio::task::spawn_blocking`) from async code.
pub trait Extractor: Send {
    fn path(&self) -> &Path;

    /// Builds the metadata record for the file.
    fn novel_info(&self) -> NovelFileInfo;

    /// Returns the cover, consulting and filling `cache`. Never fails: the
    /// last resort is a placeholder rendered from the title.
    fn cover(&self, cache: &dyn CoverCache) -> Cover;
}

/// Picks the extractor for `path` by its extension.
///
/// `.epub` (any case) opens an [`EpubExtractor`]; anything else a
/// [`FileExtractor`].
pub fn extractor_for(path: &Path) -> Result<Box<dyn Extractor>> {
    if has_extension(path, "epub") {
        Ok(Box::new(EpubExtractor::open(path)?))
    } else {
        Ok(Box::new(FileExtractor::open(path)?))
    }
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Extracts every file of `dir` and upserts the results into `store`.
///
/// Files are visited in name order. Reading state already stored for a file
/// is preserved. Files that cannot be extracted are logged and skipped.
pub async fn scan_directory(dir: &Path, store: &dyn NovelFileStore) -> Result<Vec<NovelFileInfo>> {
    let listing = list_directory(dir, Sorting::default()).await?;
    info!(directory = %dir.display(), files = listing.files.len(), "scanning directory");

    let mut books = Vec::with_capacity(listing.files.len());
    for entry in listing.files {
        let path = entry.path.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extractor_for(&path).map(|e| e.novel_info()))
                .await?;

        let mut book = match extracted {
            Ok(book) => book,
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "skipping file");
                continue;
            }
        };
        if let Some(stored) = store.get(&book.id).await? {
            book.keep_progress_of(&stored);
        }
        store.upsert(book.clone()).await?;
        books.push(book);
    }

    Ok(books)
}

/// Returns the records `store` holds for `dir`, sorted by title.
pub async fn cached_directory(dir: &Path, store: &dyn NovelFileStore) -> Result<Vec<NovelFileInfo>> {
    let directory = canonical_path(dir).to_string_lossy().into_owned();
    let mut books = store.get_for_directory(&directory).await?;
    books.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(books)
}

/// Maps a failed file system call to a crate error, keeping permission
/// failures apart.
pub(crate) fn io_error(path: &Path, error: std::io::Error) -> Error {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        Error::MissingPermission(path.display().to_string())
    } else {
        Error::Io(error)
    }
}

/// Last path component, or the whole path when there is none.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn canonical_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn novel_id(absolute: &Path) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, absolute.to_string_lossy().as_bytes()).to_string()
}

/// Modification time of `path`, or now when the file system cannot tell.
pub(crate) fn modified_time(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
