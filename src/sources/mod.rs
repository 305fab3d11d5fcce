//! Novel source implementations with conditional compilation support.
//!
//! Every adapter takes the shared [`HttpClient`](crate::net::HttpClient) in
//! its constructor and holds no other state, so adapters can be called
//! concurrently without locking.
//!
//! # Feature Flags
//!
//! Sources with a large surface are behind their own feature flag:
//! - `source-royal-road` - Enables the Royal Road source
//! - `source-novel-updates` - Enables the Novel Updates source and database
//! - `all-sources` - Enables all sources (default)
//!
//! ```bash
//! cargo build --no-default-features --features source-royal-road
//! ```
//!
//! # Available Sources
//!
//! Catalog sources (browsable and searchable):
//! - [`LightNovelTranslations`]
//! - [`ReadLightNovel`]
//! - [`ReadNovelFull`]
//! - [`RoyalRoad`] (requires `source-royal-road`)
//! - [`NovelUpdates`] (requires `source-novel-updates`)
//!
//! Base sources (chapter text only, reached through chapter redirects):
//! - [`DivineDaoLibrary`]
//! - [`Reddit`]
//! - [`RaisingTheDead`]
//! - [`Hoopla2017`]

pub mod divine_dao_library;
pub mod hoopla2017;
pub mod light_novel_translations;
pub mod raising_the_dead;
pub mod read_light_novel;
pub mod read_novel_full;
pub mod reddit;

#[cfg(feature = "source-novel-updates")]
pub mod novel_updates;

#[cfg(feature = "source-royal-road")]
pub mod royal_road;

pub use divine_dao_library::DivineDaoLibrary;
pub use hoopla2017::Hoopla2017;
pub use light_novel_translations::LightNovelTranslations;
pub use raising_the_dead::RaisingTheDead;
pub use read_light_novel::ReadLightNovel;
pub use read_novel_full::ReadNovelFull;
pub use reddit::Reddit;

#[cfg(feature = "source-novel-updates")]
pub use novel_updates::NovelUpdates;

#[cfg(feature = "source-royal-road")]
pub use royal_road::RoyalRoad;
