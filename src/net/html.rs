//! HTML parsing utilities for novel sources.
//!
//! This module provides convenient functions for parsing HTML pages fetched
//! from novel websites. It uses the `scraper` crate for CSS selector-based
//! parsing and `rayon` for parallel processing of listing items.
//!
//! `scraper::Html` is neither `Send` nor `Sync`, so adapters parse and extract
//! inside a synchronous block and only carry owned values across an `.await`.
//!
//! # Examples
//!
//! ```rust
//! use yomu::net::html;
//!
//! let html_content = r#"
//!     <div class="fiction-list-item">
//!         <h2 class="title"><a href="/fiction/1">Mother of Learning</a></h2>
//!         <img src="cover.jpg">
//!     </div>
//! "#;
//!
//! let document = html::parse(html_content);
//! let title = html::select_text(&document, ".title").unwrap();
//! let cover_url = html::select_attr(&document, "img", "src").unwrap();
//! assert_eq!(title, "Mother of Learning");
//! assert_eq!(cover_url, "cover.jpg");
//! ```

use rayon::prelude::*;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// Parses an HTML document from a string.
pub fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

/// Parses a CSS selector, reporting invalid selectors as parse errors.
pub fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::parse(format!("Invalid selector {:?}: {}", selector, e)))
}

/// Returns the first element matching `selector`.
///
/// # Errors
///
/// [`Error::Parse`] naming the selector when nothing matches. Adapters use
/// this for containers they cannot proceed without.
pub fn select_required<'a>(html: &'a Html, selector: &str) -> Result<ElementRef<'a>> {
    let sel = self::selector(selector)?;
    html.select(&sel)
        .next()
        .ok_or_else(|| Error::parse(format!("Missing element {}", selector)))
}

/// Extracts text content from the first element matching a CSS selector.
///
/// # Returns
///
/// * `Some(String)` - The trimmed text content if an element was found
/// * `None` - If no element matches the selector or the selector is invalid
///
/// ```rust
/// use yomu::net::html;
///
/// let document = html::parse(r#"<h1 class="title">Overgeared</h1>"#);
/// assert_eq!(html::select_text(&document, ".title"), Some("Overgeared".to_string()));
/// ```
pub fn select_text(html: &Html, selector: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    })
}

/// Extracts an attribute value from the first element matching a CSS selector.
pub fn select_attr(html: &Html, selector: &str, attr: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr).map(String::from))
    })
}

/// Extracts text content from all elements matching a CSS selector.
///
/// ```rust
/// use yomu::net::html;
///
/// let document = html::parse(r#"
///     <div id="seriesgenre">
///         <a class="genre">Action</a>
///         <a class="genre">Fantasy</a>
///     </div>
/// "#);
/// assert_eq!(html::select_all_text(&document, ".genre"), vec!["Action", "Fantasy"]);
/// ```
pub fn select_all_text(html: &Html, selector: &str) -> Vec<String> {
    Selector::parse(selector)
        .ok()
        .map(|sel| {
            html.select(&sel)
                .map(|el| el.text().collect::<String>().trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts attribute values from all elements matching a CSS selector.
pub fn select_all_attr(html: &Html, selector: &str, attr: &str) -> Vec<String> {
    Selector::parse(selector)
        .ok()
        .map(|sel| {
            html.select(&sel)
                .filter_map(|el| el.value().attr(attr).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the first descendant of `element` matching `selector`.
pub fn select_first<'a>(element: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    Selector::parse(selector)
        .ok()
        .and_then(|sel| element.select(&sel).next())
}

/// Returns every descendant of `element` matching `selector`.
pub fn select_within<'a>(element: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(selector)
        .ok()
        .map(|sel| element.select(&sel).collect())
        .unwrap_or_default()
}

pub fn has_class(element: ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Trimmed text of an element and its descendants, whitespace collapsed.
pub fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads an OpenGraph `<meta property=... content=...>` value.
///
/// ```rust
/// use yomu::net::html;
///
/// let document = html::parse(r#"<head><meta property="og:image" content="https://x.test/c.jpg"></head>"#);
/// assert_eq!(html::meta_property(&document, "og:image"), Some("https://x.test/c.jpg".to_string()));
/// ```
pub fn meta_property(html: &Html, property: &str) -> Option<String> {
    select_attr(html, &format!(r#"meta[property="{}"]"#, property), "content")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses listing items from HTML in parallel using rayon.
///
/// Every element matching `selector` is serialised to an HTML string and
/// re-parsed as a fragment on the rayon pool. The parser receives the root of
/// that fragment, so it should query descendants rather than read the item's
/// own attributes. Items for which the parser returns `None` are dropped and
/// document order is preserved.
///
/// ```rust
/// use yomu::net::html;
///
/// let document = html::parse(r#"
///     <div class="item"><a href="/a">A</a></div>
///     <div class="item"><span>no link</span></div>
///     <div class="item"><a href="/b">B</a></div>
/// "#);
/// let link = html::selector("a").unwrap();
/// let titles = html::parse_items(&document, ".item", |root| {
///     root.select(&link).next().map(html::element_text)
/// });
/// assert_eq!(titles, vec!["A", "B"]);
/// ```
pub fn parse_items<T, F>(html: &Html, selector: &str, parser: F) -> Vec<T>
where
    T: Send,
    F: Fn(ElementRef) -> Option<T> + Sync,
{
    Selector::parse(selector)
        .ok()
        .map(|sel| {
            // Convert ElementRef to HTML strings which can be processed in parallel
            let elements: Vec<String> = html.select(&sel).map(|el| el.html()).collect();

            elements
                .into_par_iter()
                .filter_map(|html_str| {
                    let doc = Html::parse_fragment(&html_str);
                    parser(doc.root_element())
                })
                .collect()
        })
        .unwrap_or_default()
}
