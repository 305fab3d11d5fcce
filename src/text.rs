//! Prose reconstruction from parsed HTML.
//!
//! Every adapter turns a chapter container into plain text the same way:
//! walk the subtree depth-first, keep each non-blank text node (trimmed, inner
//! whitespace collapsed) and join the pieces with a blank line.
//!
//! ```rust
//! use yomu::net::html;
//! use yomu::text::TextExtractor;
//!
//! let document = html::parse(r#"
//!     <div class="chapter-content">
//!         <p>First paragraph.</p>
//!         <script>track()</script>
//!         <p>Second <a href="/next">next</a> paragraph.</p>
//!     </div>
//! "#);
//! let content = html::select_required(&document, ".chapter-content").unwrap();
//! let text = TextExtractor::skipping("script, a").unwrap().extract(content);
//! assert_eq!(text, "First paragraph.\n\nSecond\n\nparagraph.");
//! ```

use scraper::{ElementRef, Selector};

use crate::error::Result;
use crate::net::html;

/// Separator placed between text pieces to restore paragraph breaks.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Collects the non-blank text nodes under `element` in document order.
///
/// A subtree holding only whitespace yields an empty vector.
pub fn collect_text(element: ElementRef) -> Vec<String> {
    TextExtractor::new().collect(element)
}

/// [`collect_text`] joined with [`PARAGRAPH_SEPARATOR`].
pub fn extract(element: ElementRef) -> String {
    TextExtractor::new().extract(element)
}

/// Text walker with an optional list of subtrees to leave out.
///
/// The skip selector stands in for deleting scripts, ads, navigation anchors
/// and hidden blocks before extraction; the document itself is never mutated.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    skip: Option<Selector>,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips every descendant matching the selector group, e.g. `"script, .hidden"`.
    pub fn skipping(selectors: &str) -> Result<Self> {
        Ok(Self {
            skip: Some(html::selector(selectors)?),
        })
    }

    pub fn collect(&self, element: ElementRef) -> Vec<String> {
        let mut pieces = Vec::new();
        self.walk(element, &mut pieces);
        pieces
    }

    pub fn extract(&self, element: ElementRef) -> String {
        self.collect(element).join(PARAGRAPH_SEPARATOR)
    }

    fn walk(&self, element: ElementRef, pieces: &mut Vec<String>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    pieces.push(collapsed);
                }
            } else if let Some(child) = ElementRef::wrap(child) {
                if self.skip.as_ref().is_some_and(|s| s.matches(&child)) {
                    continue;
                }
                self.walk(child, pieces);
            }
        }
    }
}
