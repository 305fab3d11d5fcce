use scraper::Html;

use crate::{
    error::{Error, Result},
    net::{HttpClient, html},
    source::Source,
    text::TextExtractor,
};

const BASE_URL: &str = "https://www.reddit.com/";
const OLD_REDDIT_URL: &str = "https://old.reddit.com/";

/// Source implementation for translations posted on Reddit.
///
/// Only reached through chapter redirects, e.g.
/// `https://www.reddit.com/r/mushokutensei/comments/g50ry7/translation_old_dragons_tale_chapter_1_dragon_and/`.
/// Pages are fetched from old.reddit.com, which renders posts without scripts.
pub struct Reddit {
    client: HttpClient,
}

impl Reddit {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("reddit"),
        }
    }
}

impl Source for Reddit {
    fn id(&self) -> &'static str {
        "reddit"
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn transform_chapter_url(&self, url: &str) -> String {
        url.replacen(BASE_URL, OLD_REDDIT_URL, 1)
    }

    fn get_chapter_title(&self, document: &Html) -> Option<String> {
        html::select_text(document, ".linklisting a.title")
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let listing = html::select_required(document, ".linklisting")?;
        let post = html::select_first(listing, ".usertext-body, .may-blank-within, .md-container")
            .ok_or_else(|| Error::parse("Missing post body in .linklisting"))?;
        Ok(TextExtractor::skipping("table, blockquote")?.extract(post))
    }
}
