use scraper::Html;

use crate::{error::Result, net::HttpClient, net::html, source::Source, text::TextExtractor};

/// Source implementation for Raising The Dead.
///
/// Only reached through chapter redirects, e.g.
/// `https://rtd.moe/kumo-desu-ga/kumo-desu-ga-nani-ka-final-battle-%E2%91%A3/`.
pub struct RaisingTheDead {
    client: HttpClient,
}

impl RaisingTheDead {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("raising_the_dead"),
        }
    }
}

impl Source for RaisingTheDead {
    fn id(&self) -> &'static str {
        "raising_the_dead"
    }

    fn name(&self) -> &'static str {
        "Raising The Dead"
    }

    fn base_url(&self) -> &str {
        "https://rtd.moe/"
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    // Text sits directly under #content; nested divs hold share buttons and navigation.
    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let content = html::select_required(document, "#content")?;
        Ok(TextExtractor::skipping("div")?.extract(content))
    }
}
