use scraper::{ElementRef, Html};

use crate::{
    error::Result,
    net::{self, HttpClient, RequestOptions, html},
    source::{CatalogSource, Source},
    text::{self, TextExtractor},
    types::{BookMetadata, ChapterMetadata, PagedList},
};

const BASE_URL: &str = "https://www.royalroad.com/";

/// Source implementation for Royal Road.
///
/// Book page: `https://www.royalroad.com/fiction/21220/mother-of-learning`
/// Chapter: `https://www.royalroad.com/fiction/21220/mother-of-learning/chapter/301778/1-good-morning-brother`
pub struct RoyalRoad {
    client: HttpClient,
}

impl RoyalRoad {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("royal_road"),
        }
    }
}

impl Source for RoyalRoad {
    fn id(&self) -> &'static str {
        "royal_road"
    }

    fn name(&self) -> &'static str {
        "Royal Road"
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_title(&self, document: &Html) -> Option<String> {
        html::select_text(document, ".fic-headers h4")
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let content = html::select_required(document, ".chapter-content")?;
        Ok(TextExtractor::skipping("script, a, .ads-title, .hidden")?.extract(content))
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }
}

impl CatalogSource for RoyalRoad {
    fn catalog_url(&self) -> String {
        format!("{}fictions/latest-updates?page=1", BASE_URL)
    }

    fn catalog_page_url(&self, index: usize) -> Option<String> {
        Some(format!("{}fictions/best-rated?page={}", BASE_URL, index + 1))
    }

    fn parse_catalog_page(&self, document: &Html, index: usize) -> Result<PagedList<BookMetadata>> {
        let books = parse_fiction_list(document)?;
        let is_last_page = match html::select_first(document.root_element(), "ul.pagination") {
            None => true,
            Some(nav) => nav
                .children()
                .filter_map(ElementRef::wrap)
                .last()
                .is_none_or(|li| html::has_class(li, "active")),
        };
        Ok(PagedList::new(books, index, is_last_page))
    }

    fn parse_chapter_list(&self, document: &Html) -> Result<Vec<ChapterMetadata>> {
        let rows = html::selector(".chapter-row")?;
        Ok(document
            .select(&rows)
            .filter_map(|row| {
                let a = html::select_first(row, "a[href]")?;
                let href = a.value().attr("href")?;
                Some(ChapterMetadata::new(
                    html::element_text(a),
                    net::resolve_url(BASE_URL, href),
                ))
            })
            .collect())
    }

    fn parse_book_cover(&self, document: &Html) -> Option<String> {
        html::select_attr(document, ".cover-art-container img[src]", "src")
    }

    fn parse_book_description(&self, document: &Html) -> Option<String> {
        let description = html::select_first(document.root_element(), ".description")?;
        Some(text::extract(description))
    }

    fn search_request(&self, query: &str) -> (String, RequestOptions) {
        let url = format!(
            "{}fictions/search?title={}",
            BASE_URL,
            urlencoding::encode(query)
        );
        let options = RequestOptions::get()
            .header("accept", "*/*")
            .header(
                "accept-language",
                "en-GB,en-US;q=0.9,en;q=0.8,ca;q=0.7,es-ES;q=0.6,es;q=0.5,de;q=0.4",
            )
            .header("cache-control", "no-cache")
            .header(
                "content-type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .header("origin", "https://www.royalroad.com")
            .header("pragma", "no-cache")
            .header("referer", "https://www.royalroad.com")
            .header("sec-ch-ua-platform", "Windows")
            .header("sec-fetch-dest", "empty")
            .header("sec-fetch-mode", "cors")
            .header("sec-fetch-site", "same-origin")
            .xhr();
        (url, options)
    }

    fn parse_search_results(&self, document: &Html) -> Result<Vec<BookMetadata>> {
        parse_fiction_list(document)
    }
}

/// Parses `.fiction-list-item` entries; the second link holds the title.
fn parse_fiction_list(document: &Html) -> Result<Vec<BookMetadata>> {
    let link = html::selector("a[href]")?;
    let cover = html::selector("img[src]")?;
    Ok(html::parse_items(document, ".fiction-list-item", |root| {
        let a = root.select(&link).nth(1)?;
        let href = a.value().attr("href")?;
        let book = BookMetadata::new(html::element_text(a), net::resolve_url(BASE_URL, href));
        Some(match root.select(&cover).next().and_then(|img| img.value().attr("src")) {
            Some(src) => book.with_cover(net::resolve_url(BASE_URL, src)),
            None => book,
        })
    }))
}
