//! Registry of source and database adapters with URL dispatch.
//!
//! The registry is built once from a fixed list and then shared (for example
//! behind an `Arc`). Dispatch is a linear scan in registration order: the
//! first adapter whose base URL is a prefix of the given URL wins.
//!
//! # Examples
//!
//! ```rust,no_run
//! use yomu::prelude::*;
//!
//! # fn example() -> yomu::Result<()> {
//! let client = HttpClient::new()?;
//! let registry = Registry::new(&client);
//!
//! let source = registry.find_source_for("https://www.royalroad.com/fiction/21220");
//! assert_eq!(source.map(|s| s.id()), Some("royal_road"));
//! assert!(registry.find_source_for("https://other.example/x").is_none());
//! # Ok(())
//! # }
//! ```

use futures::future;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    database::Database,
    net::HttpClient,
    source::{CatalogSource, Source},
    sources,
    types::{BookMetadata, PagedList, Response},
};

/// A collection of source and database adapters.
///
/// # Features
///
/// - **URL Dispatch**: Find the adapter responsible for a URL
/// - **Source Management**: Add and retrieve adapters by ID
/// - **Aggregated Search**: Search every catalog source concurrently
pub struct Registry {
    sources: Vec<Arc<dyn Source>>,
    databases: Vec<Arc<dyn Database>>,
    by_id: HashMap<&'static str, usize>,
}

impl Registry {
    /// Creates a registry holding every built-in adapter.
    ///
    /// All adapters share `client`.
    pub fn new(client: &HttpClient) -> Self {
        let mut registry = Self::empty();
        registry
            .add(sources::LightNovelTranslations::new(client))
            .add(sources::ReadLightNovel::new(client))
            .add(sources::ReadNovelFull::new(client));
        #[cfg(feature = "source-royal-road")]
        registry.add(sources::RoyalRoad::new(client));
        registry.add(sources::DivineDaoLibrary::new(client));
        #[cfg(feature = "source-novel-updates")]
        registry.add(sources::NovelUpdates::new(client));
        registry
            .add(sources::Reddit::new(client))
            .add(sources::RaisingTheDead::new(client))
            .add(sources::Hoopla2017::new(client));

        #[cfg(feature = "source-novel-updates")]
        registry.add_database(crate::database::NovelUpdatesDatabase::new(client));

        registry
    }

    /// Creates a registry with no adapters.
    ///
    /// ```rust
    /// use yomu::registry::Registry;
    ///
    /// let registry = Registry::empty();
    /// assert_eq!(registry.len(), 0);
    /// assert!(registry.is_empty());
    /// ```
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            databases: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Adds a source after the ones already registered.
    pub fn add(&mut self, source: impl Source + 'static) -> &mut Self {
        let index = self.sources.len();
        self.by_id.entry(source.id()).or_insert(index);
        self.sources.push(Arc::new(source));
        self
    }

    /// Adds a database after the ones already registered.
    pub fn add_database(&mut self, database: impl Database + 'static) -> &mut Self {
        self.databases.push(Arc::new(database));
        self
    }

    /// Retrieves a source by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn Source> {
        self.by_id
            .get(id)
            .and_then(|&index| self.sources.get(index))
            .map(|s| s.as_ref())
    }

    /// Returns the IDs of all registered sources in registration order.
    pub fn list_ids(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn Source> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn catalog_sources(&self) -> impl Iterator<Item = &dyn CatalogSource> {
        self.sources.iter().filter_map(|s| s.as_catalog())
    }

    pub fn databases(&self) -> impl Iterator<Item = &dyn Database> {
        self.databases.iter().map(|d| d.as_ref())
    }

    /// First source whose base URL prefixes `url`.
    pub fn find_source_for(&self, url: &str) -> Option<&dyn Source> {
        self.sources().find(|s| s.is_compatible(url))
    }

    /// First catalog source whose base URL prefixes `url`.
    ///
    /// Base-only sources are skipped, so a catalog source registered after a
    /// base source with the same prefix is still found.
    pub fn find_catalog_source_for(&self, url: &str) -> Option<&dyn CatalogSource> {
        self.catalog_sources().find(|s| s.is_compatible(url))
    }

    /// First database whose base URL prefixes `url`.
    pub fn find_database_for(&self, url: &str) -> Option<&dyn Database> {
        self.databases().find(|d| d.is_compatible(url))
    }

    /// Searches every catalog source concurrently.
    ///
    /// Returns each source's ID with its first search page, in registration
    /// order. Failures stay inside their own [`Response`].
    pub async fn search_catalogs(&self, query: &str) -> Vec<(&'static str, Response<PagedList<BookMetadata>>)> {
        let searches = self.catalog_sources().map(|source| async move {
            (source.id(), source.get_catalog_search(0, query).await)
        });
        future::join_all(searches).await
    }

    /// Returns the number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}
