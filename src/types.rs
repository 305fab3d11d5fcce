//! Core data types shared by sources, databases and stores.
//!
//! - [`BookMetadata`] - A book as listed by a catalog, search or database
//! - [`ChapterMetadata`] - A chapter as listed on a book page
//! - [`Chapter`] - A persisted chapter row owned by a book
//! - [`PagedList`] - One page of a paginated listing
//! - [`Response`] - The success/error value every network entry point returns
//! - [`SearchEvent`] - One step of a lazy database search
//! - [`BookData`] - Structured metadata scraped from a database book page
//!
//! # Examples
//!
//! ```rust
//! use yomu::types::*;
//!
//! let book = BookMetadata::new("Mother of Learning", "https://www.royalroad.com/fiction/21220");
//! let page = PagedList::new(vec![book], 0, true);
//! assert!(page.is_last_page);
//! ```

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A book as listed by a catalog page, a search result or a database.
///
/// Two values are equal when their `url` is equal; the title and cover may
/// differ between listings of the same book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Display title
    pub title: String,

    /// Absolute URL of the book page, used as its identity
    pub url: String,

    /// Absolute cover image URL, when the listing exposes one
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl BookMetadata {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            cover_image_url: None,
        }
    }

    /// Sets the cover image URL, ignoring blank values.
    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        let cover = cover.into();
        self.cover_image_url = if cover.trim().is_empty() {
            None
        } else {
            Some(cover)
        };
        self
    }
}

impl PartialEq for BookMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for BookMetadata {}

impl Hash for BookMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// A chapter entry extracted from a book page, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMetadata {
    pub title: String,
    pub url: String,
}

impl ChapterMetadata {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A persisted chapter row.
///
/// Created the first time a book's chapter list is fetched and kept until
/// the list is explicitly refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter title
    pub title: String,

    /// Absolute chapter URL, unique within the store
    pub url: String,

    /// URL of the owning book
    pub book_url: String,

    /// Position among the book's chapters, starting at zero
    pub position: usize,
}

impl Chapter {
    /// Builds the persisted rows for a freshly extracted chapter list.
    pub fn from_metadata(book_url: &str, chapters: Vec<ChapterMetadata>) -> Vec<Chapter> {
        chapters
            .into_iter()
            .enumerate()
            .map(|(position, c)| Chapter {
                title: c.title,
                url: c.url,
                book_url: book_url.to_string(),
                position,
            })
            .collect()
    }
}

/// One page of a paginated catalog or search.
///
/// `is_last_page` is the only termination signal; there is no total count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub index: usize,
    pub is_last_page: bool,
}

impl<T> PagedList<T> {
    pub fn new(items: Vec<T>, index: usize, is_last_page: bool) -> Self {
        Self {
            items,
            index,
            is_last_page,
        }
    }

    /// A terminal page with no items.
    pub fn empty(index: usize) -> Self {
        Self {
            items: Vec::new(),
            index,
            is_last_page: true,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result value returned by every network-dependent entry point.
///
/// Errors are carried as human-readable text; formatting them for display is
/// left to the caller.
///
/// ```rust
/// use yomu::Response;
///
/// let ok: Response<u32> = Response::Success(2);
/// assert_eq!(ok.map(|n| n * 2).ok(), Some(4));
///
/// let err: Response<u32> = Response::Error("Timeout error.".into());
/// assert!(!err.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response<T> {
    Success(T),
    Error(String),
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        match self {
            Response::Success(data) => Response::Success(f(data)),
            Response::Error(message) => Response::Error(message),
        }
    }

    /// Returns the data of a successful response.
    pub fn ok(self) -> Option<T> {
        match self {
            Response::Success(data) => Some(data),
            Response::Error(_) => None,
        }
    }

    /// Returns the message of a failed response.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(message) => Some(message),
        }
    }

    /// Converts into a crate [`Result`](crate::Result), keeping the message as
    /// [`Error::Other`](crate::Error::Other).
    pub fn into_result(self) -> crate::Result<T> {
        match self {
            Response::Success(data) => Ok(data),
            Response::Error(message) => Err(crate::Error::Other(message)),
        }
    }
}

/// One step of a lazy, paginated database search.
///
/// `NoMoreEntries` is always the last value a search stream produces.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Entries { books: Vec<BookMetadata>, page: u32 },
    Error { message: String, page: u32 },
    NoMoreEntries,
}

impl SearchEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchEvent::NoMoreEntries)
    }
}

/// An author link on a database book page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAuthor {
    pub name: String,
    pub url: String,
}

/// Structured metadata scraped from a database book page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookData {
    pub title: String,
    pub description: String,
    pub alternative_titles: Vec<String>,
    pub authors: Vec<BookAuthor>,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    pub book_type: String,
    pub related_books: Vec<BookMetadata>,
    pub similar_recommended: Vec<BookMetadata>,
}

/// A genre a database can filter by, with the site's internal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genre {
    pub name: &'static str,
    pub code: &'static str,
}

/// Language of a source's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    English,
}

impl LanguageCode {
    /// ISO 639-1 code.
    pub fn iso639_1(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
        }
    }
}
