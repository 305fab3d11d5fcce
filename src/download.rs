//! High-level acquisition flows built on the registry.
//!
//! These functions tie the pieces together the way a reader application uses
//! them:
//!
//! - [`download_chapter`] - Follow a chapter link to whatever site hosts it and
//!   extract the text
//! - [`fetch_chapters_list`] - Load a book's chapter list, from the store when
//!   cached
//! - [`download_source_catalog`] - Fetch a source's fixed catalog page
//! - [`download_cover_image`] - Save a remote cover image to disk
//!
//! Every network flow returns a [`Response`]; nothing here returns early with
//! a propagated error.
//!
//! # Examples
//!
//! ```rust,no_run
//! use yomu::prelude::*;
//! use yomu::download;
//! use yomu::store::MemoryStore;
//!
//! # async fn example() -> yomu::Result<()> {
//! let client = HttpClient::new()?;
//! let registry = Registry::new(&client);
//! let store = MemoryStore::new();
//!
//! let book = "https://www.royalroad.com/fiction/21220/mother-of-learning";
//! if let Response::Success(chapters) = download::fetch_chapters_list(&registry, &store, book, true).await {
//!     let first = &chapters[0];
//!     match download::download_chapter(&registry, &client, &first.url).await {
//!         Response::Success(text) => println!("{}", text),
//!         Response::Error(message) => eprintln!("{}", message),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::{
    connect::try_connect,
    error::{Error, Result},
    net::{HttpClient, html},
    registry::Registry,
    source::CatalogSource,
    store::ChapterStore,
    types::{BookMetadata, Chapter, Response},
};

/// Downloads the text of the chapter at `chapter_url`.
///
/// Chapter links often point at an aggregator that redirects to the
/// translator's site, so the URL is resolved first and the source is chosen
/// by the final URL. That source's preferred URL form is then fetched and
/// its chapter text extracted.
pub async fn download_chapter(
    registry: &Registry,
    client: &HttpClient,
    chapter_url: &str,
) -> Response<String> {
    let real_url = match try_connect("", client.resolve_redirects(chapter_url)).await {
        Response::Success(url) => url,
        Response::Error(message) => return Response::Error(message),
    };

    let Some(source) = registry.find_source_for(&real_url) else {
        warn!(url = chapter_url, redirect = %real_url, "no source for chapter");
        return Response::Error(format!(
            "Unable to load chapter from url:\n{}\n\nRedirect url:\n{}\n\nSource not supported",
            chapter_url, real_url
        ));
    };

    let url = source.transform_chapter_url(&real_url);
    try_connect("", source.fetch_chapter_text(&url)).await
}

/// Returns the chapters of `book_url`.
///
/// With `use_cache`, a non-empty stored list is returned without any network
/// call. Otherwise the list is fetched from the compatible catalog source,
/// inserted into `store`, and read back so the result reflects what the
/// store holds.
pub async fn fetch_chapters_list(
    registry: &Registry,
    store: &dyn ChapterStore,
    book_url: &str,
    use_cache: bool,
) -> Response<Vec<Chapter>> {
    if use_cache {
        match store.chapters(book_url).await {
            Ok(chapters) if !chapters.is_empty() => return Response::Success(chapters),
            Ok(_) => {}
            Err(e) => warn!(book = book_url, error = %e, "chapter cache unreadable"),
        }
    }

    let Some(source) = registry.find_catalog_source_for(book_url) else {
        return Response::Error(Error::IncompatibleSource(book_url.to_string()).to_string());
    };

    let chapters = match source.get_chapter_list(book_url).await {
        Response::Success(chapters) => chapters,
        Response::Error(message) => return Response::Error(message),
    };
    info!(source = source.id(), book = book_url, count = chapters.len(), "chapter list fetched");

    try_connect("", async {
        store
            .insert_chapters(Chapter::from_metadata(book_url, chapters))
            .await?;
        store.chapters(book_url).await
    })
    .await
}

/// Fetches the source's fixed catalog page with the catalog timeout.
pub async fn download_source_catalog(source: &dyn CatalogSource) -> Response<Vec<BookMetadata>> {
    let url = source.catalog_url();
    try_connect(&format!("catalog: {}", url), async {
        let body = source.client().get_catalog_text(&url).await?;
        Ok(source.parse_catalog_page(&html::parse(&body), 0)?.items)
    })
    .await
}

/// Downloads an image into `dir`, naming it after `name`.
///
/// The extension is taken from the URL and defaults to `jpg`. Returns the
/// written path.
///
/// # Examples
///
/// ```rust,no_run
/// use yomu::download::download_cover_image;
/// use yomu::net::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> yomu::Result<()> {
/// let client = HttpClient::new()?;
/// let path = download_cover_image(
///     &client,
///     "https://www.royalroad.com/covers/21220.jpg",
///     Path::new("./covers"),
///     "Mother of Learning",
/// ).await?;
/// println!("Saved {}", path.display());
/// # Ok(())
/// # }
/// ```
pub async fn download_cover_image(
    client: &HttpClient,
    url: &str,
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    let bytes = client.get_bytes(url).await?;

    let extension = extract_extension(url).unwrap_or_else(|| "jpg".to_string());
    let path = dir.join(format!("{}.{}", sanitize_filename(name), extension));

    fs::create_dir_all(dir).await?;
    fs::write(&path, &bytes).await?;
    info!(url, path = %path.display(), bytes = bytes.len(), "cover downloaded");

    Ok(path)
}

/// Sanitizes a filename by replacing invalid characters.
///
/// Characters not allowed in file names on common file systems become `_`.
/// The result is trimmed, limited to 200 bytes on a character boundary, and
/// never empty.
///
/// # Examples
///
/// ```rust
/// use yomu::download::sanitize_filename;
///
/// let clean = sanitize_filename("Volume 1: The Beginning?");
/// assert_eq!(clean, "Volume 1_ The Beginning_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    let mut sanitized: String = name
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.len() > 200 {
        let mut end = 200;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
    }

    if sanitized.is_empty() {
        sanitized = "untitled".to_string();
    }

    sanitized
}

/// Extracts the file extension from a URL, ignoring query and fragment.
///
/// ```rust
/// use yomu::download::extract_extension;
///
/// assert_eq!(extract_extension("https://example.com/cover.jpg"), Some("jpg".to_string()));
/// assert_eq!(extract_extension("https://example.com/cover.png?v=123"), Some("png".to_string()));
/// assert_eq!(extract_extension("https://example.com/cover"), None);
/// ```
pub fn extract_extension(url: &str) -> Option<String> {
    let clean_url = url.split(['?', '#']).next()?;
    let path = clean_url.rsplit('/').next()?;

    let (_, ext) = path.rsplit_once('.')?;
    if !ext.is_empty() && ext.len() <= 10 {
        Some(ext.to_lowercase())
    } else {
        None
    }
}
