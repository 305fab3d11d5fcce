use scraper::Html;

use crate::{
    error::Result,
    net::{HttpClient, html},
    source::Source,
    text::{self, PARAGRAPH_SEPARATOR},
};

/// Source implementation for the hoopla2017 WordPress blog.
///
/// The chapter heading is part of the returned text.
pub struct Hoopla2017 {
    client: HttpClient,
}

impl Hoopla2017 {
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.scoped("hoopla2017"),
        }
    }
}

impl Source for Hoopla2017 {
    fn id(&self) -> &'static str {
        "hoopla2017"
    }

    fn name(&self) -> &'static str {
        "hoopla2017"
    }

    fn base_url(&self) -> &str {
        "https://hoopla2017.wordpress.com/"
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_title(&self, document: &Html) -> Option<String> {
        html::select_text(document, ".entry-title")
    }

    fn get_chapter_text(&self, document: &Html) -> Result<String> {
        let title = html::select_required(document, ".entry-title")?;
        let body = html::select_required(document, ".entry-content")?;

        let mut pieces = text::collect_text(title);
        pieces.extend(text::collect_text(body));
        Ok(pieces.join(PARAGRAPH_SEPARATOR))
    }
}
