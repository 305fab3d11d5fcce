//! Database adapters for metadata aggregator sites.
//!
//! A database lists and describes books but does not host chapters. Its
//! search is exposed as a lazy [`SearchStream`]: pages are fetched one at a
//! time, only when the consumer polls for the next event, and the stream
//! always ends with [`SearchEvent::NoMoreEntries`].
//!
//! # Examples
//!
//! ```rust
//! use futures::StreamExt;
//! use yomu::database::{paged_search, SearchPage};
//! use yomu::types::{BookMetadata, Response, SearchEvent};
//!
//! # async fn example() {
//! let mut events = paged_search(|page| async move {
//!     let book = BookMetadata::new(format!("Book {}", page), format!("https://x.test/{}", page));
//!     Response::Success(SearchPage { books: vec![book], last_page: 2 })
//! });
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         SearchEvent::Entries { books, page } => println!("page {}: {}", page, books.len()),
//!         SearchEvent::Error { message, .. } => eprintln!("{}", message),
//!         SearchEvent::NoMoreEntries => break,
//!     }
//! }
//! # }
//! ```

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use scraper::{ElementRef, Html};
use std::future::Future;

use crate::{
    connect::try_connect,
    error::Result,
    net::{self, HttpClient, html},
    types::{BookData, BookMetadata, Genre, Response, SearchEvent},
};

#[cfg(feature = "source-novel-updates")]
pub mod novel_updates;

#[cfg(feature = "source-novel-updates")]
pub use novel_updates::NovelUpdatesDatabase;

/// Lazy sequence of search events, ending with [`SearchEvent::NoMoreEntries`].
pub type SearchStream<'a> = BoxStream<'a, SearchEvent>;

/// One fetched search page: its books and the last page number it reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub books: Vec<BookMetadata>,
    pub last_page: u32,
}

/// Capability interface for aggregator databases.
#[async_trait]
pub trait Database: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn base_url(&self) -> &str;

    fn client(&self) -> &HttpClient;

    /// Genre names accepted by [`search_advanced`](Database::search_advanced),
    /// with the site's internal codes.
    fn search_genres(&self) -> &'static [Genre];

    fn genre_code(&self, name: &str) -> Option<&'static str> {
        self.search_genres()
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.code)
    }

    /// Searches by title. A blank query yields only `NoMoreEntries`.
    fn search(&self, query: &str) -> SearchStream<'static>;

    /// Searches by included and excluded genre names. Unknown names are ignored.
    fn search_advanced(&self, included: &[String], excluded: &[String]) -> SearchStream<'static>;

    /// Extracts structured metadata from a book page.
    fn get_book_data(&self, document: &Html) -> Result<BookData>;

    fn is_compatible(&self, url: &str) -> bool {
        url.starts_with(self.base_url())
    }

    async fn fetch_book_data(&self, book_url: &str) -> Response<BookData> {
        try_connect(book_url, async {
            let body = self.client().get_text(book_url).await?;
            self.get_book_data(&html::parse(&body))
        })
        .await
    }
}

enum PageState<F> {
    Fetch(F, u32),
    Finish,
    Done,
}

/// Builds a lazy paginated search from a page fetcher.
///
/// Pages are numbered from 1. The stream stops after a page with no books,
/// after the page whose number equals its reported last page, or after the
/// first failed page (reported once as [`SearchEvent::Error`]). Nothing is
/// fetched until the stream is polled, and each poll issues at most one
/// request.
pub fn paged_search<'a, F, Fut>(fetch_page: F) -> SearchStream<'a>
where
    F: FnMut(u32) -> Fut + Send + 'a,
    Fut: Future<Output = Response<SearchPage>> + Send + 'a,
{
    stream::unfold(PageState::Fetch(fetch_page, 1), |state| async move {
        match state {
            PageState::Fetch(mut fetch_page, page) => match fetch_page(page).await {
                Response::Error(message) => {
                    Some((SearchEvent::Error { message, page }, PageState::Finish))
                }
                Response::Success(result) if result.books.is_empty() => {
                    Some((SearchEvent::NoMoreEntries, PageState::Done))
                }
                Response::Success(result) => {
                    let next = if result.last_page == page {
                        PageState::Finish
                    } else {
                        PageState::Fetch(fetch_page, page + 1)
                    };
                    Some((
                        SearchEvent::Entries {
                            books: result.books,
                            page,
                        },
                        next,
                    ))
                }
            },
            PageState::Finish => Some((SearchEvent::NoMoreEntries, PageState::Done)),
            PageState::Done => None,
        }
    })
    .boxed()
}

/// A stream holding only the terminal event.
pub fn no_more_entries() -> SearchStream<'static> {
    stream::iter([SearchEvent::NoMoreEntries]).boxed()
}

/// Collects the links that follow a marker heading.
///
/// Finds the first element matching `marker` whose text equals `label`, then
/// walks its following siblings until the next element with the marker's tag
/// name, keeping `<a href>` elements. A missing marker yields an empty list.
pub fn links_after_marker(
    document: &Html,
    marker: &str,
    label: &str,
    base_url: &str,
) -> Vec<BookMetadata> {
    let Ok(sel) = html::selector(marker) else {
        return Vec::new();
    };
    let Some(heading) = document
        .select(&sel)
        .find(|h| html::element_text(*h) == label)
    else {
        return Vec::new();
    };
    let heading_tag = heading.value().name();

    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| el.value().name() != heading_tag)
        .filter(|el| el.value().name() == "a")
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some(BookMetadata::new(
                html::element_text(a),
                net::resolve_url(base_url, href),
            ))
        })
        .collect()
}
