//! EPUB metadata, table of contents and cover extraction.
//!
//! The archive is read with `zip` and its XML with the `quick-xml` pull
//! reader. Entries are always visited in sorted name order so that repeated
//! passes over the same file see the same sequence.
//!
//! Metadata comes from every `.opf` entry (title, identifier, creator, date,
//! description) and the table of contents from every `.ncx` entry. A corrupt
//! entry is logged and skipped; whatever was read before it is kept.
//!
//! The cover is looked up in this order:
//!
//! 1. the cover cache, keyed by `"{identifier}-{title}"`;
//! 2. the manifest item named by `<meta name="cover">` or carrying the
//!    `cover-image` property (SVG covers are rejected);
//! 3. the first image entry whose name contains `cover`;
//! 4. the first image entry;
//! 5. a placeholder rendered from the title.

use chrono::{DateTime, NaiveDate, Utc};
use image::DynamicImage;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use super::{ChapterInfo, Cover, CoverOrigin, Extractor, NovelFileInfo, file_name, has_extension};
use crate::{
    error::{Error, Result},
    store::CoverCache,
};

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Metadata read from the package and navigation documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Raw `dc:date` value
    pub date: Option<String>,
    pub chapters: Vec<ChapterInfo>,
}

/// Extractor for `.epub` files.
///
/// Metadata is parsed once by [`open`](EpubExtractor::open); the cover is
/// located lazily by [`Extractor::cover`] with a second pass over the
/// archive.
#[derive(Debug)]
pub struct EpubExtractor {
    path: PathBuf,
    metadata: PackageMetadata,
}

impl EpubExtractor {
    /// Opens `path` and reads its metadata.
    ///
    /// Fails with [`Error::InvalidFile`] only when the file does not exist or
    /// its extension is not `epub`. An unreadable archive yields empty
    /// metadata.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() || !has_extension(path, "epub") {
            return Err(Error::invalid_file(format!(
                "File {} is not a valid epub",
                file_name(path)
            )));
        }

        info!(path = %path.display(), "parsing epub metadata");
        let metadata = match read_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable epub archive");
                PackageMetadata::default()
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
        })
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Title used for display, falling back to the file name.
    pub fn display_title(&self) -> String {
        if self.metadata.title.is_empty() {
            file_name(&self.path)
        } else {
            self.metadata.title.clone()
        }
    }

    /// Key under which the decoded cover is cached.
    pub fn cover_key(&self) -> String {
        format!("{}-{}", self.metadata.identifier, self.metadata.title)
    }

    /// Searches the archive for a cover image, skipping the cache and the
    /// placeholder.
    pub fn locate_cover(&self) -> Option<(DynamicImage, CoverOrigin)> {
        let mut archive = match open_archive(&self.path) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot open epub for cover");
                return None;
            }
        };
        let names = sorted_names(&archive);

        if let Some(entry) = manifest_cover_entry(&mut archive, &names)
            && let Some(image) = decode_image(&mut archive, &entry)
        {
            return Some((image, CoverOrigin::Manifest));
        }

        let images: Vec<&String> = names.iter().filter(|n| is_image_name(n)).collect();

        let named = images
            .iter()
            .filter(|n| n.to_lowercase().contains("cover"))
            .find_map(|n| decode_image(&mut archive, n));
        if let Some(image) = named {
            return Some((image, CoverOrigin::NamedImage));
        }

        images
            .iter()
            .find_map(|n| decode_image(&mut archive, n))
            .map(|image| (image, CoverOrigin::FirstImage))
    }
}

impl Extractor for EpubExtractor {
    fn path(&self) -> &Path {
        &self.path
    }

    fn novel_info(&self) -> NovelFileInfo {
        let base = NovelFileInfo::for_path(&self.path);
        let date = self
            .metadata
            .date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(base.date);

        NovelFileInfo {
            identifier: self.metadata.identifier.clone(),
            author: self.metadata.author.clone(),
            date,
            title: self.metadata.title.clone(),
            description: self.metadata.description.clone(),
            chapters: self.metadata.chapters.clone(),
            ..base
        }
    }

    fn cover(&self, cache: &dyn CoverCache) -> Cover {
        let title = self.display_title();
        let key = self.cover_key();

        if let Some(image) = cache.get(&key) {
            return Cover {
                image,
                alt_text: title,
                origin: CoverOrigin::Cache,
            };
        }

        match self.locate_cover() {
            Some((image, origin)) => {
                debug!(path = %self.path.display(), ?origin, "cover found");
                if let Err(e) = cache.put(&key, &image) {
                    warn!(key = %key, error = %e, "failed to cache cover");
                }
                Cover {
                    image,
                    alt_text: title,
                    origin,
                }
            }
            None => Cover::placeholder(&title),
        }
    }
}

/// Parses the date part of an EPUB date, before any time component.
///
/// Accepts `yyyy-mm-dd` with or without zero padding, and the reduced
/// `yyyy-mm` and `yyyy` forms, which start at the first day of the period.
///
/// ```rust
/// use yomu::import::epub::parse_date;
///
/// assert!(parse_date("2015-04-01T00:00:00Z").is_some());
/// assert_eq!(parse_date("2015-4-1"), parse_date("2015-04-01"));
/// assert_eq!(parse_date("2015"), parse_date("2015-01-01"));
/// assert!(parse_date("April 2015").is_none());
/// ```
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let day = value.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", day), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01-01", day), "%Y-%m-%d"))
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

fn read_metadata(path: &Path) -> Result<PackageMetadata> {
    let mut archive = open_archive(path)?;
    let mut metadata = PackageMetadata::default();

    for name in sorted_names(&archive) {
        let lower = name.to_lowercase();
        let parsed = if lower.ends_with(".opf") {
            read_xml(&mut archive, &name).and_then(|xml| parse_package(&xml, &mut metadata))
        } else if lower.ends_with(".ncx") {
            read_xml(&mut archive, &name).and_then(|xml| {
                let mut chapters = Vec::new();
                parse_nav_map(&xml, &mut chapters)?;
                metadata.chapters = chapters;
                Ok(())
            })
        } else {
            continue;
        };

        if let Err(e) = parsed {
            warn!(path = %path.display(), entry = %name, error = %e, "skipping corrupt epub entry");
        }
    }

    Ok(metadata)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataField {
    Title,
    Identifier,
    Creator,
    Date,
    Description,
}

impl MetadataField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"identifier" => Some(Self::Identifier),
            b"creator" => Some(Self::Creator),
            b"date" => Some(Self::Date),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }
}

impl PackageMetadata {
    fn apply(&mut self, field: MetadataField, value: &str) {
        if value.is_empty() {
            return;
        }
        match field {
            MetadataField::Title => append(&mut self.title, value, " - "),
            MetadataField::Identifier => append(&mut self.identifier, value, " - "),
            MetadataField::Creator => append(&mut self.author, value, " - "),
            MetadataField::Description => append(&mut self.description, value, ", "),
            MetadataField::Date => {
                if self.date.is_none() {
                    self.date = Some(value.to_string());
                }
            }
        }
    }
}

fn append(target: &mut String, value: &str, separator: &str) {
    if !target.is_empty() {
        target.push_str(separator);
    }
    target.push_str(value);
}

/// Accumulates `<metadata>` fields of a package document into `metadata`.
///
/// Markup nested inside a field, such as paragraphs in a description, is
/// flattened into its text.
fn parse_package(xml: &str, metadata: &mut PackageMetadata) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut field: Option<MetadataField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if field.is_some() {
                    text.push(' ');
                    continue;
                }
                field = MetadataField::from_local_name(local_name(e.name().as_ref()));
                text.clear();
            }
            Event::Text(e) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) if field.is_some() => {
                text.push_str(&resolve_entity(&String::from_utf8_lossy(e.as_ref())));
            }
            Event::End(e) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name == b"metadata" {
                    break;
                }
                match field {
                    Some(current) if MetadataField::from_local_name(name) == Some(current) => {
                        let value = text.split_whitespace().collect::<Vec<_>>().join(" ");
                        metadata.apply(current, &value);
                        field = None;
                    }
                    Some(_) => text.push(' '),
                    None => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

#[derive(Default)]
struct PendingNavPoint {
    title: String,
    src: String,
    emitted: bool,
}

impl PendingNavPoint {
    fn emit_into(&mut self, chapters: &mut Vec<ChapterInfo>) {
        if !self.emitted && !self.title.is_empty() && !self.src.is_empty() {
            chapters.push(ChapterInfo::new(self.title.clone(), self.src.clone()));
            self.emitted = true;
        }
    }
}

/// Appends one [`ChapterInfo`] per `navPoint` of an NCX document, in document
/// order, stopping at `</navMap>`.
fn parse_nav_map(xml: &str, chapters: &mut Vec<ChapterInfo>) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut open_points: Vec<PendingNavPoint> = Vec::new();
    let mut in_text = false;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"navPoint" => open_points.push(PendingNavPoint::default()),
                b"text" => {
                    in_text = true;
                    text.clear();
                }
                b"content" => set_nav_src(&e, &mut open_points, chapters),
                _ => {}
            },
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"content" {
                    set_nav_src(&e, &mut open_points, chapters);
                }
            }
            Event::Text(e) if in_text => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) if in_text => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) if in_text => {
                text.push_str(&resolve_entity(&String::from_utf8_lossy(e.as_ref())));
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"text" => {
                    in_text = false;
                    if let Some(point) = open_points.last_mut()
                        && point.title.is_empty()
                    {
                        point.title = text.trim().to_string();
                        point.emit_into(chapters);
                    }
                }
                b"navPoint" => {
                    open_points.pop();
                }
                b"navMap" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn set_nav_src(e: &BytesStart, open_points: &mut [PendingNavPoint], chapters: &mut Vec<ChapterInfo>) {
    let Some(point) = open_points.last_mut() else {
        return;
    };
    if !point.src.is_empty() {
        return;
    }
    if let Some(src) = attribute(e, b"src") {
        point.src = src;
        point.emit_into(chapters);
    }
}

struct ManifestItem {
    id: String,
    href: String,
    is_cover_image: bool,
}

/// Returns the manifest `href` of the cover image, or `None` when the
/// package names no raster cover. SVG items are passed over.
fn manifest_cover_href(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut cover_id: Option<String> = None;
    let mut items: Vec<ManifestItem> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match local_name(e.name().as_ref()) {
                b"meta" => {
                    if attribute(&e, b"name").as_deref() == Some("cover") {
                        cover_id = attribute(&e, b"content");
                    }
                }
                b"item" => items.push(ManifestItem {
                    id: attribute(&e, b"id").unwrap_or_default(),
                    href: attribute(&e, b"href").unwrap_or_default(),
                    is_cover_image: attribute(&e, b"properties")
                        .is_some_and(|p| p.split_ascii_whitespace().any(|p| p == "cover-image")),
                }),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items
        .into_iter()
        .filter(|item| item.is_cover_image || cover_id.as_deref() == Some(item.id.as_str()))
        .map(|item| item.href)
        .find(|href| !href.is_empty() && !href.to_lowercase().ends_with(".svg")))
}

/// Finds the archive entry the manifest names as the cover.
fn manifest_cover_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, names: &[String]) -> Option<String> {
    for opf in names.iter().filter(|n| n.to_lowercase().ends_with(".opf")) {
        let href = match read_xml(archive, opf).and_then(|xml| manifest_cover_href(&xml)) {
            Ok(Some(href)) => href,
            Ok(None) => continue,
            Err(e) => {
                warn!(entry = %opf, error = %e, "skipping corrupt package document");
                continue;
            }
        };

        let decoded = urlencoding::decode(&href)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| href.clone());
        let resolved = resolve_entry_path(opf, &decoded);

        if let Some(name) = names.iter().find(|n| **n == resolved) {
            return Some(name.clone());
        }
        if let Some(name) = names.iter().find(|n| n.contains(decoded.as_str())) {
            return Some(name.clone());
        }
        debug!(href = %href, "manifest cover not present in archive");
    }
    None
}

/// Resolves `href` against the directory of the entry `base`.
fn resolve_entry_path(base: &str, href: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').collect();
    segments.pop();
    for part in href.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            part => segments.push(part),
        }
    }
    segments.retain(|s| !s.is_empty());
    segments.join("/")
}

fn decode_image<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<DynamicImage> {
    let decoded = read_entry(archive, name)
        .and_then(|bytes| image::load_from_memory(&bytes).map_err(Error::from));
    match decoded {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(entry = %name, error = %e, "skipping undecodable image");
            None
        }
    }
}

fn is_image_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

fn sorted_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name)?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn read_xml<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let bytes = read_entry(archive, name)?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map_or(name, |i| &name[i + 1..])
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .and_then(|attr| attr.unescape_value().ok().map(Cow::into_owned))
}

/// Resolves a predefined or numeric XML entity name.
fn resolve_entity(entity: &str) -> String {
    match entity {
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        numeric => numeric
            .strip_prefix('#')
            .and_then(|n| match n.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => n.parse().ok(),
            })
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default(),
    }
}
