//! # Yomu - Multi-source web novel acquisition library
//!
//! Yomu is an async library for getting novels onto a reader: it scrapes
//! chapter lists, chapter text, catalogs and search results from novel
//! websites, searches metadata aggregators page by page, and imports local
//! EPUB files with their table of contents and cover.
//!
//! ## Features
//!
//! - **Site Adapters**: One adapter per website behind the [`Source`] and
//!   [`CatalogSource`](source::CatalogSource) capability traits
//! - **URL Dispatch**: A [`Registry`] that finds the adapter for any URL
//! - **Lazy Database Search**: Paginated search as a pull-based stream that
//!   fetches one page per poll
//! - **Errors as Values**: Every network entry point returns a [`Response`];
//!   timeouts are told apart from other failures
//! - **EPUB Import**: Metadata, table of contents and a cover located through
//!   several fallbacks, with a rendered placeholder as the last resort
//! - **Parallel Processing**: Uses rayon for listing pages with many items
//!
//! ## Quick Start
//!
//! ### Reading a Chapter
//!
//! ```rust,no_run
//! use yomu::prelude::*;
//! use yomu::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> yomu::Result<()> {
//!     let client = HttpClient::new()?;
//!     let registry = Registry::new(&client);
//!     let store = MemoryStore::new();
//!
//!     let book = "https://www.royalroad.com/fiction/21220/mother-of-learning";
//!     let chapters = fetch_chapters_list(&registry, &store, book, true)
//!         .await
//!         .into_result()?;
//!
//!     let text = download_chapter(&registry, &client, &chapters[0].url)
//!         .await
//!         .into_result()?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ### Searching a Database
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use yomu::prelude::*;
//!
//! # async fn example() -> yomu::Result<()> {
//! let client = HttpClient::new()?;
//! let registry = Registry::new(&client);
//!
//! for database in registry.databases() {
//!     let mut events = database.search("sword");
//!     while let Some(event) = events.next().await {
//!         match event {
//!             SearchEvent::Entries { books, page } => println!("page {}: {} books", page, books.len()),
//!             SearchEvent::Error { message, .. } => eprintln!("{}", message),
//!             SearchEvent::NoMoreEntries => break,
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Importing Local Files
//!
//! ```rust,no_run
//! use yomu::import::{self, Extractor};
//! use yomu::store::{DiskCoverCache, MemoryStore};
//! use std::path::Path;
//!
//! # async fn example() -> yomu::Result<()> {
//! let store = MemoryStore::new();
//! let cache = DiskCoverCache::new("./covers");
//!
//! for book in import::scan_directory(Path::new("./library"), &store).await? {
//!     let cover = import::extractor_for(Path::new(&book.path))?.cover(&cache);
//!     println!("{} by {} ({} chapters, {:?} cover)", book.title, book.author, book.chapters.len(), cover.origin);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`source`] / [`sources`]: Capability traits and the site adapters
//! - [`database`]: Aggregator adapters and the paged search stream
//! - [`registry`]: Adapter collection and URL dispatch
//! - [`connect`]: The error-wrapping call layer
//! - [`download`]: Chapter, chapter list and catalog flows
//! - [`text`]: Prose reconstruction from HTML
//! - [`import`]: Local file extraction and directory scans
//! - [`store`]: Persistence collaborator traits and reference stores
//! - [`net`]: HTTP client, fetcher configuration and HTML helpers
//! - [`types`]: Core data structures
//! - [`error`]: Error handling

pub mod connect;
pub mod database;
pub mod download;
pub mod error;
pub mod import;
pub mod net;
pub mod registry;
pub mod source;
pub mod sources;
pub mod store;
pub mod text;
pub mod types;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use yomu::prelude::*;` statement.
///
/// # Example
///
/// ```rust
/// use yomu::prelude::*;
///
/// // Now you have access to:
/// // - Registry, Source, CatalogSource, Database
/// // - HttpClient, try_connect
/// // - BookMetadata, Chapter, PagedList, Response, SearchEvent
/// // - Download flows
/// ```
pub mod prelude {
    pub use crate::{
        connect::try_connect,
        database::{Database, SearchStream},
        download::{download_chapter, download_source_catalog, fetch_chapters_list},
        net::HttpClient,
        registry::Registry,
        source::{CatalogSource, Source},
        types::{BookMetadata, Chapter, ChapterMetadata, PagedList, Response, SearchEvent},
    };
}

// Re-export main types at crate root for direct access
pub use error::{Error, Result};
pub use registry::Registry;
pub use source::{CatalogSource, Source};
pub use types::{BookMetadata, Chapter, PagedList, Response, SearchEvent};
