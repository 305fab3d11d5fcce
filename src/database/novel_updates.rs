use scraper::Html;

use super::{Database, SearchPage, SearchStream, links_after_marker, no_more_entries, paged_search};
use crate::{
    connect::try_connect,
    error::{Error, Result},
    net::{self, HttpClient, html},
    text,
    types::{BookAuthor, BookData, BookMetadata, Genre},
};

const BASE_URL: &str = "https://www.novelupdates.com/";

static GENRES: &[Genre] = &[
    Genre { name: "Action", code: "8" },
    Genre { name: "Adult", code: "280" },
    Genre { name: "Adventure", code: "13" },
    Genre { name: "Comedy", code: "17" },
    Genre { name: "Drama", code: "9" },
    Genre { name: "Ecchi", code: "292" },
    Genre { name: "Fantasy", code: "5" },
    Genre { name: "Gender Bender", code: "168" },
    Genre { name: "Harem", code: "3" },
    Genre { name: "Historical", code: "330" },
    Genre { name: "Horror", code: "343" },
    Genre { name: "Josei", code: "324" },
    Genre { name: "Martial Arts", code: "14" },
    Genre { name: "Mature", code: "4" },
    Genre { name: "Mecha", code: "10" },
    Genre { name: "Mystery", code: "245" },
    Genre { name: "Psychological", code: "486" },
    Genre { name: "Romance", code: "15" },
    Genre { name: "School Life", code: "6" },
    Genre { name: "Sci-fi", code: "11" },
    Genre { name: "Seinen", code: "18" },
    Genre { name: "Shoujo", code: "157" },
    Genre { name: "Shoujo Ai", code: "851" },
    Genre { name: "Shounen", code: "12" },
    Genre { name: "Shounen Ai", code: "1692" },
    Genre { name: "Slice of Life", code: "7" },
    Genre { name: "Smut", code: "281" },
    Genre { name: "Sports", code: "1357" },
    Genre { name: "Supernatural", code: "16" },
    Genre { name: "Tragedy", code: "132" },
    Genre { name: "Wuxia", code: "479" },
    Genre { name: "Xianxia", code: "480" },
    Genre { name: "Xuanhuan", code: "3954" },
    Genre { name: "Yaoi", code: "560" },
    Genre { name: "Yuri", code: "922" },
];

/// Database implementation for Novel Updates.
///
/// Book page: `https://www.novelupdates.com/series/mushoku-tensei/`
pub struct NovelUpdatesDatabase {
    client: HttpClient,
}

impl NovelUpdatesDatabase {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("novel_updates_database"),
        }
    }

    /// URL of title search page `page` (1-based).
    pub fn search_url(query: &str, page: u32) -> String {
        let page_path = if page > 1 {
            format!("page/{}/", page)
        } else {
            String::new()
        };
        format!(
            "{}{}?s={}&post_type=seriesplans",
            BASE_URL,
            page_path,
            urlencoding::encode(query)
        )
    }

    /// URL of series-finder page `page` (1-based) for the given genre names.
    pub fn advanced_search_url(included: &[String], excluded: &[String], page: u32) -> String {
        let mut url = format!("{}series-finder/?sf=1", BASE_URL);
        let included = genre_codes(included);
        if !included.is_empty() {
            url.push_str(&format!("&gi={}&mgi=and", included));
        }
        let excluded = genre_codes(excluded);
        if !excluded.is_empty() {
            url.push_str(&format!("&ge={}", excluded));
        }
        url.push_str("&sort=sdate&order=desc");
        if page > 1 {
            url.push_str(&format!("&pg={}", page));
        }
        url
    }

    /// Parses one search result page and the highest page number it links to.
    pub fn parse_search_page(document: &Html) -> SearchPage {
        let link = html::selector(".search_title a[href]");
        let books = match link {
            Ok(link) => document
                .select(&link)
                .filter_map(|a| {
                    let href = a.value().attr("href")?;
                    Some(BookMetadata::new(
                        html::element_text(a),
                        net::resolve_url(BASE_URL, href),
                    ))
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        let last_page = html::select_all_text(document, ".page-numbers, .digg_pagination a")
            .iter()
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(1);
        SearchPage { books, last_page }
    }

    fn stream_pages<U>(&self, page_url: U) -> SearchStream<'static>
    where
        U: Fn(u32) -> String + Send + 'static,
    {
        let client = self.client.clone();
        paged_search(move |page| {
            let client = client.clone();
            let url = page_url(page);
            async move {
                try_connect(&format!("page: {}\nurl: {}", page, url), async {
                    let body = client.get_text(&url).await?;
                    Ok(Self::parse_search_page(&html::parse(&body)))
                })
                .await
            }
        })
    }
}

impl Database for NovelUpdatesDatabase {
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

    fn search_genres(&self) -> &'static [Genre] {
        GENRES
    }

    fn search(&self, query: &str) -> SearchStream<'static> {
        if query.trim().is_empty() {
            return no_more_entries();
        }
        let query = query.to_string();
        self.stream_pages(move |page| Self::search_url(&query, page))
    }

    fn search_advanced(&self, included: &[String], excluded: &[String]) -> SearchStream<'static> {
        let included = included.to_vec();
        let excluded = excluded.to_vec();
        self.stream_pages(move |page| Self::advanced_search_url(&included, &excluded, page))
    }

    fn get_book_data(&self, document: &Html) -> Result<BookData> {
        let title = html::select_text(document, ".seriestitlenu")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::parse("Missing .seriestitlenu"))?;

        let root = document.root_element();
        let description = html::select_first(root, "#editdescription")
            .map(text::extract)
            .unwrap_or_default();
        let alternative_titles = html::select_first(root, "#editassociated")
            .map(text::collect_text)
            .unwrap_or_default();
        let authors = html::select_first(root, "#showauthors")
            .map(|authors| {
                html::select_within(authors, "a")
                    .into_iter()
                    .map(|a| BookAuthor {
                        name: html::element_text(a),
                        url: a
                            .value()
                            .attr("href")
                            .map(|href| net::resolve_url(BASE_URL, href))
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(BookData {
            title,
            description,
            alternative_titles,
            authors,
            tags: html::select_all_text(document, "#showtags a"),
            genres: html::select_all_text(document, "#seriesgenre a"),
            book_type: html::select_text(document, "#showtype a, .genre.type")
                .unwrap_or_default(),
            related_books: links_after_marker(document, "h5.seriesother", "Related Series", BASE_URL),
            similar_recommended: links_after_marker(
                document,
                "h5.seriesother",
                "Recommendations",
                BASE_URL,
            ),
        })
    }
}

/// Joins the codes of known genre names with commas, dropping unknown names.
fn genre_codes(names: &[String]) -> String {
    names
        .iter()
        .filter_map(|name| GENRES.iter().find(|g| g.name == name.as_str()))
        .map(|g| g.code)
        .collect::<Vec<_>>()
        .join(",")
}
