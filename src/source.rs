//! Source capability traits.
//!
//! A source is an adapter for one novel website. Every source implements
//! [`Source`], which is enough to extract chapter text from a page reached by
//! following a chapter link. Sources that can also be browsed implement
//! [`CatalogSource`] on top of it and expose themselves through
//! [`Source::as_catalog`].
//!
//! Page parsing is synchronous and takes a `&Html`; the provided async methods
//! fetch a page, parse it, and hand the document to those functions, wrapping
//! the outcome with [`try_connect`].
//!
//! # Examples
//!
//! ```rust
//! use yomu::net::{html, HttpClient};
//! use yomu::source::Source;
//! use yomu::text::TextExtractor;
//! use scraper::Html;
//!
//! struct Blog {
//!     client: HttpClient,
//! }
//!
//! impl Source for Blog {
//!     fn id(&self) -> &'static str { "blog" }
//!     fn name(&self) -> &'static str { "Blog" }
//!     fn base_url(&self) -> &str { "https://blog.example.com/" }
//!     fn client(&self) -> &HttpClient { &self.client }
//!
//!     fn get_chapter_text(&self, document: &Html) -> yomu::Result<String> {
//!         let content = html::select_required(document, ".entry-content")?;
//!         Ok(TextExtractor::skipping("script")?.extract(content))
//!     }
//! }
//! ```

use async_trait::async_trait;
use scraper::Html;

use crate::{
    connect::try_connect,
    error::Result,
    net::{self, HttpClient, RequestOptions, html},
    types::{BookMetadata, ChapterMetadata, LanguageCode, PagedList, Response},
};

/// What a source can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCapability {
    /// Chapter text extraction only
    Base,
    /// Chapter text plus chapter lists, catalog listing and search
    Catalog,
}

/// Base capability every source adapter implements.
///
/// # Required Methods
///
/// * [`id()`](Source::id) - Unique identifier for the source
/// * [`name()`](Source::name) - Human-readable name
/// * [`base_url()`](Source::base_url) - URL prefix the source answers for
/// * [`client()`](Source::client) - Injected HTTP client
/// * [`get_chapter_text()`](Source::get_chapter_text) - Prose extraction
///
/// # Implementation Guidelines
///
/// - Remove scripts, ads, navigation anchors and hidden blocks through a
///   [`TextExtractor`](crate::text::TextExtractor) skip list
/// - Return [`Error::Parse`](crate::Error::Parse) only when the chapter
///   container itself is missing
#[async_trait]
pub trait Source: Send + Sync {
    /// Returns the unique identifier for this source.
    fn id(&self) -> &'static str;

    /// Returns the human-readable name of this source.
    fn name(&self) -> &'static str;

    /// Returns the base URL of this source.
    ///
    /// A URL belongs to this source when it starts with this prefix.
    fn base_url(&self) -> &str;

    /// Language of the source's content.
    fn language(&self) -> LanguageCode {
        LanguageCode::English
    }

    /// The HTTP client this source fetches with.
    fn client(&self) -> &HttpClient;

    /// Rewrites a chapter URL to the form this source prefers to fetch.
    fn transform_chapter_url(&self, url: &str) -> String {
        url.to_string()
    }

    /// Optional chapter title shown alongside the text.
    fn get_chapter_title(&self, _document: &Html) -> Option<String> {
        None
    }

    /// Extracts the chapter prose from a fetched chapter page.
    fn get_chapter_text(&self, document: &Html) -> Result<String>;

    /// Returns this source as a catalog source when it supports browsing.
    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        None
    }

    fn capability(&self) -> SourceCapability {
        if self.as_catalog().is_some() {
            SourceCapability::Catalog
        } else {
            SourceCapability::Base
        }
    }

    /// Returns `true` when `url` starts with this source's base URL.
    fn is_compatible(&self, url: &str) -> bool {
        url.starts_with(self.base_url())
    }

    /// Fetches `url` and extracts its chapter text.
    async fn fetch_chapter_text(&self, url: &str) -> Result<String> {
        let body = self.client().get_text(url).await?;
        self.get_chapter_text(&html::parse(&body))
    }
}

/// Browsing capability: chapter lists, catalog pages and search.
///
/// Parsing hooks are synchronous and have defaults where a generic answer
/// exists (OpenGraph cover and description). Network entry points are provided
/// and return [`Response`] values; adapters whose chapter list needs a second
/// request override [`get_chapter_list`](CatalogSource::get_chapter_list).
#[async_trait]
pub trait CatalogSource: Source {
    /// URL of catalog page `index` (zero-based), or `None` when the catalog
    /// has no such page.
    fn catalog_page_url(&self, index: usize) -> Option<String>;

    /// Fixed catalog URL used for a one-shot catalog download.
    fn catalog_url(&self) -> String {
        self.catalog_page_url(0)
            .unwrap_or_else(|| self.base_url().to_string())
    }

    /// Extracts the books of one catalog page and whether it is the last one.
    fn parse_catalog_page(&self, document: &Html, index: usize) -> Result<PagedList<BookMetadata>>;

    /// Extracts chapter anchors in reading order.
    fn parse_chapter_list(&self, document: &Html) -> Result<Vec<ChapterMetadata>>;

    /// Extracts the cover image URL from a book page.
    fn parse_book_cover(&self, document: &Html) -> Option<String> {
        html::meta_property(document, "og:image")
    }

    /// Extracts the description from a book page.
    fn parse_book_description(&self, document: &Html) -> Option<String> {
        html::meta_property(document, "og:description")
    }

    /// Request issued for a search query.
    fn search_request(&self, query: &str) -> (String, RequestOptions);

    /// Extracts the books of a search result page.
    fn parse_search_results(&self, document: &Html) -> Result<Vec<BookMetadata>>;

    async fn get_book_cover_image_url(&self, book_url: &str) -> Response<Option<String>> {
        try_connect(book_url, async {
            let body = self.client().get_text(book_url).await?;
            let cover = self.parse_book_cover(&html::parse(&body));
            Ok(cover.map(|href| net::resolve_url(self.base_url(), &href)))
        })
        .await
    }

    async fn get_book_description(&self, book_url: &str) -> Response<Option<String>> {
        try_connect(book_url, async {
            let body = self.client().get_text(book_url).await?;
            Ok(self.parse_book_description(&html::parse(&body)))
        })
        .await
    }

    async fn get_chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        try_connect(book_url, async {
            let body = self.client().get_text(book_url).await?;
            self.parse_chapter_list(&html::parse(&body))
        })
        .await
    }

    async fn get_catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>> {
        let Some(url) = self.catalog_page_url(index) else {
            return Response::Success(PagedList::empty(index));
        };
        try_connect(&format!("index={}", index), async {
            let body = self.client().get_text(&url).await?;
            self.parse_catalog_page(&html::parse(&body), index)
        })
        .await
    }

    /// Searches the site.
    ///
    /// Only the first page is supported: a blank query or `index > 0` returns
    /// an empty terminal page without any request, and a real query returns
    /// all results as a single terminal page.
    async fn get_catalog_search(
        &self,
        index: usize,
        query: &str,
    ) -> Response<PagedList<BookMetadata>> {
        if query.trim().is_empty() || index > 0 {
            return Response::Success(PagedList::empty(index));
        }
        let (url, options) = self.search_request(query);
        try_connect(&format!("index={}\nquery={}", index, query), async {
            let body = self.client().fetch_text(&url, options).await?;
            let books = self.parse_search_results(&html::parse(&body))?;
            Ok(PagedList::new(books, index, true))
        })
        .await
    }
}
