use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::io_error;
use crate::error::Result;

/// What a directory listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Type,
    Date,
}

/// Sort key and direction of a directory listing.
///
/// Directories have no meaningful size or type, so those keys order
/// directories by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub key: SortKey,
    pub ascending: bool,
}

impl Sorting {
    pub fn new(key: SortKey, ascending: bool) -> Self {
        Self { key, ascending }
    }

    fn compare(&self, a: &FileEntry, b: &FileEntry) -> Ordering {
        let ordering = match (self.key, a.is_dir) {
            (SortKey::Date, _) => a.modified.cmp(&b.modified),
            (SortKey::Size, false) => a.size.cmp(&b.size),
            (SortKey::Type, false) => a.extension().cmp(&b.extension()),
            _ => Ordering::Equal,
        }
        .then_with(|| a.name.cmp(&b.name));

        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl Default for Sorting {
    fn default() -> Self {
        Self::new(SortKey::Name, true)
    }
}

/// Number of sub-directories and files inside a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderCounts {
    pub folders: usize,
    pub files: usize,
}

/// One entry of a [`DirectoryListing`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Contents of a directory entry; `None` for files and unreadable directories
    pub counts: Option<FolderCounts>,
}

impl FileEntry {
    /// Lower-cased extension, empty when there is none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Short description for a file browser.
    ///
    /// ```rust
    /// use yomu::import::{FileEntry, FolderCounts};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let entry = FileEntry {
    ///     name: "Novels".into(),
    ///     path: "/books/Novels".into(),
    ///     is_dir: true,
    ///     size: 0,
    ///     modified: Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap(),
    ///     counts: Some(FolderCounts { folders: 2, files: 7 }),
    /// };
    /// assert_eq!(entry.summary(), "2 Folders, 7 Files");
    /// ```
    pub fn summary(&self) -> String {
        if self.is_dir {
            match self.counts {
                Some(c) => format!("{} Folders, {} Files", c.folders, c.files),
                None => "Empty Folder".to_string(),
            }
        } else {
            format!("{}, {}", format_size(self.size), self.modified.format("%d/%m/%Y"))
        }
    }
}

/// Contents of one directory: sub-directories first, then regular files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryListing {
    pub directories: Vec<FileEntry>,
    pub files: Vec<FileEntry>,
}

impl DirectoryListing {
    /// Directories followed by files.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.directories.iter().chain(self.files.iter())
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Lists `dir`, ordering both groups by `sorting`.
///
/// Entries that are neither directories nor regular files are left out.
/// A denied read is reported as [`Error::MissingPermission`](crate::Error::MissingPermission).
pub async fn list_directory(dir: &Path, sorting: Sorting) -> Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| io_error(dir, e))?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let path = entry.path();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let name = entry.file_name().to_string_lossy().into_owned();

        if metadata.is_dir() {
            let counts = count_children(&path).await;
            listing.directories.push(FileEntry {
                name,
                path,
                is_dir: true,
                size: 0,
                modified,
                counts,
            });
        } else if metadata.is_file() {
            listing.files.push(FileEntry {
                name,
                path,
                is_dir: false,
                size: metadata.len(),
                modified,
                counts: None,
            });
        }
    }

    listing.directories.sort_by(|a, b| sorting.compare(a, b));
    listing.files.sort_by(|a, b| sorting.compare(a, b));
    Ok(listing)
}

async fn count_children(dir: &Path) -> Option<FolderCounts> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut counts = FolderCounts::default();
    while let Ok(Some(entry)) = entries.next_entry().await {
        match entry.file_type().await {
            Ok(t) if t.is_dir() => counts.folders += 1,
            Ok(t) if t.is_file() => counts.files += 1,
            _ => {}
        }
    }
    Some(counts)
}

/// Formats a byte count with a binary unit.
///
/// ```rust
/// use yomu::import::format_size;
///
/// assert_eq!(format_size(512), "512 bytes");
/// assert_eq!(format_size(3 * 1024 * 1024 + 10), "3 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1 << 10;
    const MB: u64 = 1 << 20;
    const GB: u64 = 1 << 30;
    const TB: u64 = 1 << 40;

    match bytes {
        b if b > TB => format!("{} TB", b / TB),
        b if b > GB => format!("{} GB", b / GB),
        b if b > MB => format!("{} MB", b / MB),
        b if b > KB => format!("{} KB", b / KB),
        b => format!("{} bytes", b),
    }
}
