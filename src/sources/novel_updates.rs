use async_trait::async_trait;
use scraper::Html;

use crate::{
    connect::try_connect,
    error::{Error, Result},
    net::{self, HttpClient, RequestOptions, html},
    source::{CatalogSource, Source},
    text,
    types::{BookMetadata, ChapterMetadata, PagedList, Response},
};

const BASE_URL: &str = "https://www.novelupdates.com/";

/// Source implementation for Novel Updates.
///
/// Book page: `https://www.novelupdates.com/series/mushoku-tensei-old-dragons-tale/`
///
/// Novel Updates only links out to translator sites. Its chapter URLs
/// redirect elsewhere, so chapter text is never extracted here; the chapter
/// download resolves the redirect and dispatches on the target instead.
pub struct NovelUpdates {
    client: HttpClient,
}

/// Form fields the chapter archive request needs, read from the book page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterArchiveKey {
    pub group: String,
    pub post_id: String,
}

impl NovelUpdates {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("novel_updates"),
        }
    }

    pub fn parse_archive_key(document: &Html) -> Result<ChapterArchiveKey> {
        let group = html::select_attr(document, "#grr_groups", "value").unwrap_or_default();
        let post_id = html::select_attr(document, "#mypostid", "value")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::parse("Missing #mypostid"))?;
        Ok(ChapterArchiveKey { group, post_id })
    }
}

impl Source for NovelUpdates {
    fn id(&self) -> &'static str {
        "novel_updates"
    }

    fn name(&self) -> &'static str {
        "Novel Updates"
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_text(&self, _document: &Html) -> Result<String> {
        Err(Error::source(
            self.id(),
            "Chapters are hosted on translator sites; resolve the chapter redirect first",
        ))
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }
}

#[async_trait]
impl CatalogSource for NovelUpdates {
    fn catalog_url(&self) -> String {
        format!("{}novelslisting/?sort=7&order=1&status=1", BASE_URL)
    }

    fn catalog_page_url(&self, index: usize) -> Option<String> {
        Some(format!(
            "{}novelslisting/?sort=7&order=1&status=1&pg={}",
            BASE_URL,
            index + 1
        ))
    }

    fn parse_catalog_page(&self, document: &Html, index: usize) -> Result<PagedList<BookMetadata>> {
        let title = html::selector(".search_title a[href]")?;
        let cover = html::selector(".search_img_nu img[src]")?;
        let books = html::parse_items(document, ".search_main_box_nu", |root| {
            let a = root.select(&title).next()?;
            let href = a.value().attr("href")?;
            let book = BookMetadata::new(html::element_text(a), net::resolve_url(BASE_URL, href));
            Some(match root.select(&cover).next().and_then(|img| img.value().attr("src")) {
                Some(src) => book.with_cover(net::resolve_url(BASE_URL, src)),
                None => book,
            })
        });
        let is_last_page = html::select_first(
            document.root_element(),
            ".digg_pagination a.next_page",
        )
        .is_none();
        Ok(PagedList::new(books, index, is_last_page))
    }

    /// Parses the `nd_getchapters` archive, which lists newest chapters
    /// first, and returns it in reading order.
    fn parse_chapter_list(&self, document: &Html) -> Result<Vec<ChapterMetadata>> {
        let link = html::selector("a[data-id][href]")?;
        let mut chapters: Vec<ChapterMetadata> = document
            .select(&link)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let title = html::select_first(a, "span[title]")
                    .and_then(|span| span.value().attr("title"))
                    .map(str::to_string)
                    .unwrap_or_else(|| html::element_text(a));
                Some(ChapterMetadata::new(title, net::resolve_url(BASE_URL, href)))
            })
            .collect();
        chapters.reverse();
        Ok(chapters)
    }

    fn parse_book_cover(&self, document: &Html) -> Option<String> {
        html::select_attr(document, ".seriesimg img[src], .serieseditimg img[src]", "src")
    }

    fn parse_book_description(&self, document: &Html) -> Option<String> {
        let description = html::select_first(document.root_element(), "#editdescription")?;
        Some(text::extract(description))
    }

    fn search_request(&self, query: &str) -> (String, RequestOptions) {
        (
            format!("{}?s={}", BASE_URL, urlencoding::encode(query)),
            RequestOptions::get(),
        )
    }

    fn parse_search_results(&self, document: &Html) -> Result<Vec<BookMetadata>> {
        let link = html::selector(".search_body_nu .search_title a[href]")?;
        Ok(document
            .select(&link)
            .filter_map(|a| {
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
            let key = Self::parse_archive_key(&html::parse(&body))?;
            let archive = self
                .client
                .fetch_text(
                    &format!("{}wp-admin/admin-ajax.php", BASE_URL),
                    RequestOptions::post()
                        .xhr()
                        .form("action", "nd_getchapters")
                        .form("mygrr", key.group)
                        .form("mygroupfilter", "")
                        .form("mypostid", key.post_id),
                )
                .await?;
            self.parse_chapter_list(&html::parse(&archive))
        })
        .await
    }
}
