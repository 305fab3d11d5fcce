use scraper::Html;

use crate::{
    error::Result,
    net::{self, HttpClient, RequestOptions, html},
    source::{CatalogSource, Source},
    text::TextExtractor,
    types::{BookMetadata, ChapterMetadata, PagedList},
};

const BASE_URL: &str = "https://www.readlightnovel.org";

/// Source implementation for Read Light Novel.
///
/// Book page: `https://www.readlightnovel.org/goat-of-all-ghouls-1`
/// Chapter: `https://www.readlightnovel.org/goat-of-all-ghouls-1/chapter-1`
pub struct ReadLightNovel {
    client: HttpClient,
}

impl ReadLightNovel {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("read_light_novel"),
        }
    }
}

impl Source for ReadLightNovel {
    fn id(&self) -> &'static str {
        "read_light_novel"
    }

    fn name(&self) -> &'static str {
        "Read Light Novel"
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let content = html::select_required(document, ".chapter-content3 > .desc")?;
        Ok(TextExtractor::skipping("script, a, .ads-title, .hidden")?.extract(content))
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }
}

impl CatalogSource for ReadLightNovel {
    fn catalog_page_url(&self, index: usize) -> Option<String> {
        (index == 0).then(|| format!("{}/novel-list", BASE_URL))
    }

    fn parse_catalog_page(&self, document: &Html, index: usize) -> Result<PagedList<BookMetadata>> {
        html::select_required(document, ".list-by-word-body")?;
        let link = html::selector("a")?;
        let books = html::parse_items(document, ".list-by-word-body > :first-child > *", |root| {
            let a = root.select(&link).next()?;
            let href = a.value().attr("href")?;
            Some(BookMetadata::new(
                html::element_text(a),
                net::resolve_url(BASE_URL, href),
            ))
        });
        Ok(PagedList::new(books, index, true))
    }

    fn parse_chapter_list(&self, document: &Html) -> Result<Vec<ChapterMetadata>> {
        Ok(anchors(document, ".chapter-chs a[href]")
            .into_iter()
            .map(|(title, url)| ChapterMetadata::new(title, url))
            .collect())
    }

    fn search_request(&self, query: &str) -> (String, RequestOptions) {
        (
            format!("{}/search/autocomplete", BASE_URL),
            RequestOptions::post().xhr().form("q", query),
        )
    }

    fn parse_search_results(&self, document: &Html) -> Result<Vec<BookMetadata>> {
        Ok(anchors(document, "a[href]")
            .into_iter()
            .map(|(title, url)| BookMetadata::new(title, url))
            .collect())
    }
}

fn anchors(document: &Html, selector: &str) -> Vec<(String, String)> {
    let Ok(sel) = html::selector(selector) else {
        return Vec::new();
    };
    document
        .select(&sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some((html::element_text(a), net::resolve_url(BASE_URL, href)))
        })
        .collect()
}
