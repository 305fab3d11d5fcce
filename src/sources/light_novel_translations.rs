use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::{
    error::Result,
    net::{self, HttpClient, RequestOptions, html},
    source::{CatalogSource, Source},
    text::TextExtractor,
    types::{BookMetadata, ChapterMetadata, PagedList},
};

static SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r".+/(.+)$").expect("valid slug regex"));
static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+) (\d+) (\S.*)$").expect("valid numbered title regex"));
static CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*category_name=(.*)$").expect("valid category regex"));

const BASE_URL: &str = "https://lightnovelstranslations.com/";

/// Source implementation for Light Novel Translations.
///
/// Book page: `https://lightnovelstranslations.com/the-sage-summoned-to-another-world/`
///
/// Chapter titles are not listed on the book page; they are rebuilt from the
/// chapter URL slug.
pub struct LightNovelTranslations {
    client: HttpClient,
}

impl LightNovelTranslations {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("light_novel_translations"),
        }
    }
}

impl Source for LightNovelTranslations {
    fn id(&self) -> &'static str {
        "light_novel_translations"
    }

    fn name(&self) -> &'static str {
        "Light Novel Translations"
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let page = html::select_required(document, ".page, .type-page, .status-publish, .hentry")?;
        let content = html::select_first(page, ".entry-content")
            .ok_or_else(|| crate::Error::parse("Missing element .entry-content"))?;
        Ok(TextExtractor::skipping("#textbox")?.extract(content))
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }
}

impl CatalogSource for LightNovelTranslations {
    fn catalog_page_url(&self, index: usize) -> Option<String> {
        (index == 0).then(|| BASE_URL.to_string())
    }

    fn parse_catalog_page(&self, document: &Html, index: usize) -> Result<PagedList<BookMetadata>> {
        let nav = html::select_required(document, "#prime_nav")?;
        let books = nav
            .children()
            .filter_map(scraper::ElementRef::wrap)
            .skip(1)
            .take(3)
            .flat_map(|menu| html::select_within(menu, "a"))
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let title = html::element_text(a);
                is_novel_link(href, &title)
                    .then(|| BookMetadata::new(title, net::resolve_url(BASE_URL, href)))
            })
            .collect();
        Ok(PagedList::new(books, index, true))
    }

    fn parse_chapter_list(&self, document: &Html) -> Result<Vec<ChapterMetadata>> {
        Ok(html::select_all_attr(
            document,
            ".su-spoiler-content.su-u-clearfix.su-u-trim a[href]",
            "href",
        )
        .into_iter()
        .map(|href| {
            let url = net::resolve_url(BASE_URL, &href);
            ChapterMetadata::new(chapter_title_from_url(&url), url)
        })
        .collect())
    }

    fn search_request(&self, query: &str) -> (String, RequestOptions) {
        let url = format!(
            "{}?s={}&orderby=relevance&order=DESC",
            BASE_URL,
            urlencoding::encode(query)
        );
        (url, RequestOptions::get())
    }

    fn parse_search_results(&self, document: &Html) -> Result<Vec<BookMetadata>> {
        let Some(filters) = html::select_first(
            document.root_element(),
            ".jetpack-search-filters-widget__filter-list",
        ) else {
            return Ok(Vec::new());
        };
        Ok(html::select_within(filters, "a")
            .into_iter()
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let name = CATEGORY.captures(href)?.get(1)?.as_str();
                Some(BookMetadata::new(
                    html::element_text(a),
                    format!("{}{}/", BASE_URL, name),
                ))
            })
            .collect())
    }
}

fn is_novel_link(href: &str, title: &str) -> bool {
    href != "#"
        && !href.ends_with("-illustrations/")
        && !href.ends_with("-illustration/")
        && !href.ends_with("-illustration-page/")
        && title != "Novel Illustrations"
        && title != "Novels Illustrations"
}

/// Rebuilds a chapter title from the last path segment of its URL.
///
/// `.../volume-2-chapter-3/` becomes `"Volume 2 - Chapter 3"`; slugs that do
/// not start with a word followed by a number are only de-hyphenated.
pub fn chapter_title_from_url(url: &str) -> String {
    let decoded = urlencoding::decode(url)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| url.to_string());
    let decoded = decoded.trim_end_matches('/');

    let Some(slug) = SLUG.captures(decoded).and_then(|c| c.get(1)) else {
        return "** Can't get chapter title :(".to_string();
    };
    let title = capitalize(&slug.as_str().replace('-', " "));

    match NUMBERED.captures(&title) {
        Some(m) => format!("{} {} - {}", &m[1], &m[2], capitalize(&m[3])),
        None => title,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
