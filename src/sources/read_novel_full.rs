use async_trait::async_trait;
use scraper::Html;

use crate::{
    connect::try_connect,
    error::{Error, Result},
    net::{self, HttpClient, RequestOptions, html},
    source::{CatalogSource, Source},
    text::TextExtractor,
    types::{BookMetadata, ChapterMetadata, PagedList, Response},
};

const BASE_URL: &str = "https://readnovelfull.com";

/// Source implementation for Read Novel Full.
///
/// Book page: `https://readnovelfull.com/i-was-a-sword-when-i-reincarnated.html`
///
/// The book page only carries the novel id; chapters come from the
/// `ajax/chapter-archive` endpoint.
pub struct ReadNovelFull {
    client: HttpClient,
}

impl ReadNovelFull {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("read_novel_full"),
        }
    }

    /// Reads the novel id the chapter archive is keyed by.
    pub fn parse_novel_id(document: &Html) -> Result<String> {
        html::select_attr(document, "#rating", "data-novel-id")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::parse("Missing #rating[data-novel-id]"))
    }
}

impl Source for ReadNovelFull {
    fn id(&self) -> &'static str {
        "read_novel_full"
    }

    fn name(&self) -> &'static str {
        "Read Novel Full"
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_title(&self, document: &Html) -> Option<String> {
        html::select_text(document, ".chr-title, .chr-text")
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let content = html::select_required(document, "#chr-content")?;
        Ok(TextExtractor::skipping("script, .ads, .hidden")?.extract(content))
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }
}

#[async_trait]
impl CatalogSource for ReadNovelFull {
    fn catalog_page_url(&self, index: usize) -> Option<String> {
        Some(format!("{}/most-popular-novel?page={}", BASE_URL, index + 1))
    }

    fn parse_catalog_page(&self, document: &Html, index: usize) -> Result<PagedList<BookMetadata>> {
        let title = html::selector(".novel-title a[href]")?;
        let cover = html::selector("img.cover")?;
        let books = html::parse_items(document, ".list-novel .row", |root| {
            let a = root.select(&title).next()?;
            let href = a.value().attr("href")?;
            let book = BookMetadata::new(html::element_text(a), net::resolve_url(BASE_URL, href));
            Some(match root.select(&cover).next().and_then(|img| {
                img.value().attr("data-src").or_else(|| img.value().attr("src"))
            }) {
                Some(src) => book.with_cover(net::resolve_url(BASE_URL, src)),
                None => book,
            })
        });

        let is_last_page = match html::select_first(document.root_element(), "ul.pagination") {
            None => true,
            Some(nav) => nav
                .children()
                .filter_map(scraper::ElementRef::wrap)
                .last()
                .is_none_or(|li| html::has_class(li, "active") || html::has_class(li, "disabled")),
        };
        Ok(PagedList::new(books, index, is_last_page))
    }

    /// Parses the chapter archive fragment.
    fn parse_chapter_list(&self, document: &Html) -> Result<Vec<ChapterMetadata>> {
        let link = html::selector("a[href]")?;
        Ok(document
            .select(&link)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let title = a
                    .value()
                    .attr("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| html::element_text(a));
                Some(ChapterMetadata::new(title, net::resolve_url(BASE_URL, href)))
            })
            .collect())
    }

    fn parse_book_cover(&self, document: &Html) -> Option<String> {
        html::select_attr(document, ".book img[src]", "src")
            .or_else(|| html::meta_property(document, "og:image"))
    }

    fn parse_book_description(&self, document: &Html) -> Option<String> {
        let description = html::select_first(document.root_element(), "#tab-description .desc-text")?;
        Some(crate::text::extract(description))
    }

    fn search_request(&self, query: &str) -> (String, RequestOptions) {
        (
            format!("{}/search?keyword={}", BASE_URL, urlencoding::encode(query)),
            RequestOptions::get(),
        )
    }

    fn parse_search_results(&self, document: &Html) -> Result<Vec<BookMetadata>> {
        let Some(main) = html::select_first(document.root_element(), ".col-novel-main, .archive")
        else {
            return Ok(Vec::new());
        };
        Ok(html::select_within(main, ".novel-title")
            .into_iter()
            .filter_map(|title| {
                let a = html::select_first(title, "a[href]")?;
                let href = a.value().attr("href")?;
                Some(BookMetadata::new(
                    html::element_text(a),
                    net::resolve_url(BASE_URL, href),
                ))
            })
            .collect())
    }

    async fn get_chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        try_connect(book_url, async {
            let body = self.client.get_text(book_url).await?;
            let novel_id = Self::parse_novel_id(&html::parse(&body))?;
            let archive = self
                .client
                .fetch_text(
                    &format!("{}/ajax/chapter-archive", BASE_URL),
                    RequestOptions::get().xhr().query("novelId", novel_id),
                )
                .await?;
            self.parse_chapter_list(&html::parse(&archive))
        })
        .await
    }
}
