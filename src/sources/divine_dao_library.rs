use scraper::Html;

use crate::{error::Result, net::HttpClient, net::html, source::Source, text::TextExtractor};

/// Source implementation for Divine Dao Library.
///
/// Chapter: `https://www.divinedaolibrary.com/the-undead-king-of-the-palace-of-darkness-chapter-22-the-merciful-grim-reaper/`
pub struct DivineDaoLibrary {
    client: HttpClient,
}

impl DivineDaoLibrary {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("divine_dao_library"),
        }
    }
}

impl Source for DivineDaoLibrary {
    fn id(&self) -> &'static str {
        "divine_dao_library"
    }

    fn name(&self) -> &'static str {
        "Divine Dao Library"
    }

    fn base_url(&self) -> &str {
        "https://www.divinedaolibrary.com/"
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_title(&self, document: &Html) -> Option<String> {
        html::select_text(document, ".entry-title")
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let content = html::select_required(document, ".entry-content")?;
        Ok(TextExtractor::skipping("a, script")?.extract(content))
    }
}
