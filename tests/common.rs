//! Common test utilities and fixtures
//!
//! Shared functionality used across all test modules: EPUB archives built on
//! the fly, encoded images, offline source adapters and a loopback HTTP
//! responder.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use scraper::Html;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use yomu::net::{HttpClient, RequestOptions, html};
use yomu::source::{CatalogSource, Source};
use yomu::text::TextExtractor;
use yomu::types::{BookMetadata, ChapterMetadata, PagedList, Response};

#[allow(dead_code)]
pub const TEST_BASE_URL: &str = "https://example.com/";
#[allow(dead_code)]
pub const TEST_BOOK_URL: &str = "https://example.com/book/the-wandering-inn";

/// Encodes a solid `width` x `height` PNG.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Writes a zip archive holding `entries` at `path`.
#[allow(dead_code)]
pub fn write_epub(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, bytes) in entries {
        zip.start_file(*name, stored).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Package document with the usual Dublin Core fields.
///
/// `manifest` is inserted verbatim inside `<manifest>`, `head_meta` inside
/// `<metadata>`.
#[allow(dead_code)]
pub fn package_opf(
    title: &str,
    author: &str,
    date: &str,
    identifier: &str,
    head_meta: &str,
    manifest: &str,
) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="bookid">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{author}</dc:creator>
    <dc:date>{date}</dc:date>
    <dc:description>A test book.</dc:description>
    {head_meta}
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    {manifest}
  </manifest>
</package>"#
    )
    .into_bytes()
}

/// Navigation document with one flat navPoint per `(title, src)`.
#[allow(dead_code)]
pub fn toc_ncx(points: &[(&str, &str)]) -> Vec<u8> {
    let nav_points: String = points
        .iter()
        .enumerate()
        .map(|(i, (title, src))| {
            format!(
                r#"<navPoint id="np-{i}" playOrder="{i}"><navLabel><text>{title}</text></navLabel><content src="{src}"/></navPoint>"#
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>{nav_points}</navMap>
</ncx>"#
    )
    .into_bytes()
}

/// Creates a directory inside `root` and returns its path.
#[allow(dead_code)]
pub fn subdir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Offline catalog source answering for `https://example.com/`.
///
/// Its chapter list is canned, so flows built on it never touch the network.
#[allow(dead_code)]
pub struct TestSource {
    client: HttpClient,
    chapters: Vec<ChapterMetadata>,
}

#[allow(dead_code)]
impl TestSource {
    pub fn new(chapters: Vec<ChapterMetadata>) -> Self {
        Self {
            client: HttpClient::new().unwrap(),
            chapters,
        }
    }
}

impl Source for TestSource {
    fn id(&self) -> &'static str {
        "example"
    }

    fn name(&self) -> &'static str {
        "Example"
    }

    fn base_url(&self) -> &str {
        TEST_BASE_URL
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn get_chapter_text(&self, document: &Html) -> yomu::Result<String> {
        let content = html::select_required(document, ".chapter")?;
        Ok(TextExtractor::skipping("script")?.extract(content))
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }
}

#[async_trait]
impl CatalogSource for TestSource {
    fn catalog_page_url(&self, index: usize) -> Option<String> {
        (index == 0).then(|| format!("{}catalog", TEST_BASE_URL))
    }

    fn parse_catalog_page(&self, _document: &Html, index: usize) -> yomu::Result<PagedList<BookMetadata>> {
        Ok(PagedList::empty(index))
    }

    fn parse_chapter_list(&self, _document: &Html) -> yomu::Result<Vec<ChapterMetadata>> {
        Ok(self.chapters.clone())
    }

    fn search_request(&self, query: &str) -> (String, RequestOptions) {
        (format!("{}search?q={}", TEST_BASE_URL, query), RequestOptions::get())
    }

    fn parse_search_results(&self, _document: &Html) -> yomu::Result<Vec<BookMetadata>> {
        Ok(Vec::new())
    }

    async fn get_chapter_list(&self, _book_url: &str) -> Response<Vec<ChapterMetadata>> {
        Response::Success(self.chapters.clone())
    }
}

/// Chapters `1..=count` of [`TEST_BOOK_URL`].
#[allow(dead_code)]
pub fn sample_chapters(count: usize) -> Vec<ChapterMetadata> {
    (1..=count)
        .map(|i| ChapterMetadata::new(format!("Chapter {}", i), format!("{}/chapter-{}", TEST_BOOK_URL, i)))
        .collect()
}

/// Serves HTTP/1.1 on a loopback port until the test's runtime shuts down.
///
/// `respond` receives the server origin (`http://127.0.0.1:port`) and the
/// request path and returns the raw response. Returns the origin.
#[allow(dead_code)]
pub async fn serve_http<F>(respond: F) -> String
where
    F: Fn(&str, &str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let respond = Arc::new(respond);
    let server_origin = origin.clone();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let respond = respond.clone();
            let origin = server_origin.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let _ = stream.write_all(respond(&origin, &path).as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    origin
}

/// `200 OK` carrying an HTML body.
#[allow(dead_code)]
pub fn http_ok(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// `302 Found` pointing at `location`.
#[allow(dead_code)]
pub fn http_redirect(location: &str) -> String {
    format!(
        "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        location
    )
}

/// `404 Not Found` with an empty body.
#[allow(dead_code)]
pub fn http_not_found() -> String {
    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
}

/// Base source answering for `{origin}/raw/`.
///
/// Its preferred chapter form lives under `/reader/`, so a fetch of the
/// untransformed URL is distinguishable from one of the transformed URL.
#[allow(dead_code)]
pub struct ReaderSource {
    client: HttpClient,
    base_url: String,
}

#[allow(dead_code)]
impl ReaderSource {
    pub fn new(origin: &str) -> Self {
        Self {
            client: HttpClient::new().unwrap(),
            base_url: format!("{}/raw/", origin),
        }
    }
}

impl Source for ReaderSource {
    fn id(&self) -> &'static str {
        "reader"
    }

    fn name(&self) -> &'static str {
        "Reader"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> &HttpClient {
        &self.client
    }

    fn transform_chapter_url(&self, url: &str) -> String {
        url.replacen("/raw/", "/reader/", 1)
    }

    fn get_chapter_text(&self, document: &Html) -> yomu::Result<String> {
        let content = html::select_required(document, ".chapter")?;
        Ok(TextExtractor::skipping("script")?.extract(content))
    }
}
