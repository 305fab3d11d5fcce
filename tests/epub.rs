//! Local file import tests
//!
//! EPUB archives are written into a temporary directory for each test.

use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use yomu::Error;
use yomu::import::cover::{COVER_HEIGHT, COVER_WIDTH};
use yomu::import::{
    ChapterInfo, CoverOrigin, EpubExtractor, Extractor, FileExtractor, extractor_for,
};
use yomu::store::{CoverCache, DiskCoverCache, MemoryCoverCache};

mod common;
use common::{package_opf, png_bytes, toc_ncx, write_epub};

const MANIFEST_COVER: &str = r#"<item id="cover-img" href="images/front.png" media-type="image/png" properties="cover-image"/>"#;

fn wandering_inn(dir: &Path) -> PathBuf {
    let path = dir.join("wandering-inn.epub");
    write_epub(
        &path,
        &[
            (
                "OEBPS/content.opf",
                package_opf(
                    "The Wandering Inn",
                    "pirateaba",
                    "2017-07-27T00:00:00Z",
                    "urn:uuid:1234",
                    "",
                    MANIFEST_COVER,
                ),
            ),
            (
                "OEBPS/toc.ncx",
                toc_ncx(&[("Prologue", "text/ch0.xhtml"), ("Chapter 1.00", "text/ch1.xhtml")]),
            ),
            ("OEBPS/images/cover-decoy.png", png_bytes(7, 7)),
            ("OEBPS/images/front.png", png_bytes(3, 5)),
        ],
    );
    path
}

fn mtime(path: &Path) -> DateTime<Utc> {
    DateTime::<Utc>::from(std::fs::metadata(path).unwrap().modified().unwrap())
}

#[cfg(test)]
mod metadata_tests {
    use super::*;

    #[test]
    fn test_epub_metadata_and_chapters() {
        let dir = TempDir::new().unwrap();
        let path = wandering_inn(dir.path());

        let extractor = EpubExtractor::open(&path).unwrap();
        let info = extractor.novel_info();

        assert_eq!(info.title, "The Wandering Inn");
        assert_eq!(info.author, "pirateaba");
        assert_eq!(info.identifier, "urn:uuid:1234");
        assert_eq!(info.description, "A test book.");
        assert_eq!(info.date, Utc.with_ymd_and_hms(2017, 7, 27, 0, 0, 0).unwrap());
        assert_eq!(info.date_formatted(), "27-07-2017");
        assert_eq!(
            info.chapters,
            vec![
                ChapterInfo::new("Prologue", "text/ch0.xhtml"),
                ChapterInfo::new("Chapter 1.00", "text/ch1.xhtml"),
            ]
        );
        assert!(info.tags.is_empty());
        assert_eq!(info.progress, 0);
        assert!(!info.is_favorite);
    }

    #[test]
    fn test_record_identity_follows_the_path() {
        let dir = TempDir::new().unwrap();
        let path = wandering_inn(dir.path());
        let copy = dir.path().join("copy.epub");
        std::fs::copy(&path, &copy).unwrap();

        let first = EpubExtractor::open(&path).unwrap().novel_info();
        let again = EpubExtractor::open(&path).unwrap().novel_info();
        let other = EpubExtractor::open(&copy).unwrap().novel_info();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
        assert_eq!(
            first.directory,
            std::fs::canonicalize(dir.path()).unwrap().to_string_lossy()
        );
        assert!(first.path.ends_with("wandering-inn.epub"));
    }

    #[test]
    fn test_unparseable_date_falls_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("undated.epub");
        write_epub(
            &path,
            &[(
                "content.opf",
                package_opf("Undated", "Anonymous", "sometime in spring", "id-1", "", ""),
            )],
        );

        let info = EpubExtractor::open(&path).unwrap().novel_info();
        assert_eq!(info.title, "Undated");
        assert_eq!(info.date, mtime(&path));
    }

    #[test]
    fn test_reduced_date_forms() {
        let dir = TempDir::new().unwrap();
        let unpadded = dir.path().join("unpadded.epub");
        write_epub(
            &unpadded,
            &[("content.opf", package_opf("Unpadded", "A", "2015-4-1", "id-u", "", ""))],
        );
        let year_only = dir.path().join("year.epub");
        write_epub(
            &year_only,
            &[("content.opf", package_opf("Year", "A", "2015", "id-y", "", ""))],
        );

        assert_eq!(
            EpubExtractor::open(&unpadded).unwrap().novel_info().date,
            Utc.with_ymd_and_hms(2015, 4, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            EpubExtractor::open(&year_only).unwrap().novel_info().date,
            Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_last_navigation_document_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("two-tocs.epub");
        write_epub(
            &path,
            &[
                ("OEBPS/a-old.ncx", toc_ncx(&[("Stale Chapter", "text/old.xhtml")])),
                (
                    "OEBPS/content.opf",
                    package_opf("Two Tocs", "A", "2020-01-01", "id-toc", "", ""),
                ),
                (
                    "OEBPS/toc.ncx",
                    toc_ncx(&[("Prologue", "text/ch0.xhtml"), ("Chapter 1", "text/ch1.xhtml")]),
                ),
            ],
        );

        let info = EpubExtractor::open(&path).unwrap().novel_info();
        assert_eq!(
            info.chapters,
            vec![
                ChapterInfo::new("Prologue", "text/ch0.xhtml"),
                ChapterInfo::new("Chapter 1", "text/ch1.xhtml"),
            ]
        );
    }

    #[test]
    fn test_missing_or_misnamed_files_are_rejected() {
        let dir = TempDir::new().unwrap();

        let missing = EpubExtractor::open(dir.path().join("missing.epub")).unwrap_err();
        assert!(matches!(missing, Error::InvalidFile(ref m) if m == "File missing.epub is not a valid epub"));

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "plain text").unwrap();
        assert!(matches!(
            EpubExtractor::open(&text),
            Err(Error::InvalidFile(_))
        ));

        assert!(matches!(
            FileExtractor::open(dir.path().join("gone.pdf")),
            Err(Error::InvalidFile(_))
        ));
    }

    #[test]
    fn test_corrupt_archive_yields_empty_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let extractor = EpubExtractor::open(&path).unwrap();
        assert!(extractor.metadata().title.is_empty());
        assert!(extractor.metadata().chapters.is_empty());
        assert_eq!(extractor.display_title(), "broken.epub");

        let cover = extractor.cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::Placeholder);
        assert_eq!(cover.alt_text, "broken.epub");
    }

    #[test]
    fn test_extractor_dispatch_by_extension() {
        let dir = TempDir::new().unwrap();
        let epub = wandering_inn(dir.path());
        let upper = dir.path().join("SHOUTING.EPUB");
        std::fs::copy(&epub, &upper).unwrap();
        let pdf = dir.path().join("Worm.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        assert_eq!(extractor_for(&epub).unwrap().novel_info().title, "The Wandering Inn");
        assert_eq!(extractor_for(&upper).unwrap().novel_info().title, "The Wandering Inn");

        let file = extractor_for(&pdf).unwrap();
        let info = file.novel_info();
        assert_eq!(info.title, "Worm.pdf");
        assert_eq!(info.author, "Worm.pdf");
        assert_eq!(info.description, "Worm.pdf");
        assert!(info.chapters.is_empty());
        assert_eq!(info.date, mtime(&pdf));
        assert_eq!(file.path(), pdf.as_path());
    }
}

#[cfg(test)]
mod cover_tests {
    use super::*;

    #[test]
    fn test_manifest_cover_wins_over_named_image() {
        let dir = TempDir::new().unwrap();
        let extractor = EpubExtractor::open(wandering_inn(dir.path())).unwrap();

        let cover = extractor.cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::Manifest);
        assert_eq!((cover.image.width(), cover.image.height()), (3, 5));
        assert_eq!(cover.alt_text, "The Wandering Inn");
    }

    #[test]
    fn test_meta_cover_with_encoded_href() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.epub");
        write_epub(
            &path,
            &[
                (
                    "OEBPS/content.opf",
                    package_opf(
                        "Meta Cover",
                        "A",
                        "2020-01-01",
                        "id-meta",
                        r#"<meta name="cover" content="art"/>"#,
                        r#"<item id="art" href="images/art%20work.png" media-type="image/png"/>"#,
                    ),
                ),
                ("OEBPS/images/a-cover.png", png_bytes(7, 7)),
                ("OEBPS/images/art work.png", png_bytes(4, 6)),
            ],
        );

        let cover = EpubExtractor::open(&path).unwrap().cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::Manifest);
        assert_eq!((cover.image.width(), cover.image.height()), (4, 6));
    }

    #[test]
    fn test_svg_manifest_cover_falls_back_to_named_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svg.epub");
        write_epub(
            &path,
            &[
                (
                    "content.opf",
                    package_opf(
                        "Vector",
                        "A",
                        "2020-01-01",
                        "id-svg",
                        "",
                        r#"<item id="c" href="cover.svg" media-type="image/svg+xml" properties="cover-image"/>"#,
                    ),
                ),
                ("images/00-map.png", png_bytes(2, 2)),
                ("images/Cover.png", png_bytes(6, 6)),
            ],
        );

        let cover = EpubExtractor::open(&path).unwrap().cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::NamedImage);
        assert_eq!(cover.image.width(), 6);
    }

    #[test]
    fn test_raster_manifest_cover_after_svg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.epub");
        write_epub(
            &path,
            &[
                (
                    "OEBPS/content.opf",
                    package_opf(
                        "Mixed Covers",
                        "A",
                        "2020-01-01",
                        "id-mixed",
                        "",
                        r#"<item id="v" href="images/title.svg" media-type="image/svg+xml" properties="cover-image"/>
    <item id="r" href="images/art.png" media-type="image/png" properties="cover-image"/>"#,
                    ),
                ),
                ("OEBPS/images/art.png", png_bytes(3, 4)),
                ("OEBPS/images/cover.png", png_bytes(7, 7)),
            ],
        );

        let cover = EpubExtractor::open(&path).unwrap().cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::Manifest);
        assert_eq!((cover.image.width(), cover.image.height()), (3, 4));
    }

    #[test]
    fn test_first_image_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.epub");
        write_epub(
            &path,
            &[
                ("content.opf", package_opf("Plain", "A", "2020-01-01", "id-plain", "", "")),
                ("images/b.jpg", b"not really a jpeg".to_vec()),
                ("images/c.png", png_bytes(5, 2)),
            ],
        );

        let cover = EpubExtractor::open(&path).unwrap().cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::FirstImage);
        assert_eq!((cover.image.width(), cover.image.height()), (5, 2));
    }

    #[test]
    fn test_placeholder_when_no_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.epub");
        write_epub(
            &path,
            &[("content.opf", package_opf("Bare Book", "A", "2020-01-01", "id-bare", "", ""))],
        );

        let cache = MemoryCoverCache::new();
        let cover = EpubExtractor::open(&path).unwrap().cover(&cache);
        assert_eq!(cover.origin, CoverOrigin::Placeholder);
        assert_eq!(cover.alt_text, "Bare Book");
        assert_eq!(
            (cover.image.width(), cover.image.height()),
            (COVER_WIDTH, COVER_HEIGHT)
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_second_lookup_hits_memory_cache() {
        let dir = TempDir::new().unwrap();
        let extractor = EpubExtractor::open(wandering_inn(dir.path())).unwrap();
        let cache = MemoryCoverCache::new();

        assert_eq!(extractor.cover(&cache).origin, CoverOrigin::Manifest);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("urn:uuid:1234-The Wandering Inn").is_some());

        let cached = extractor.cover(&cache);
        assert_eq!(cached.origin, CoverOrigin::Cache);
        assert_eq!(cached.image.width(), 3);
    }

    #[test]
    fn test_disk_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let extractor = EpubExtractor::open(wandering_inn(dir.path())).unwrap();
        let cache = DiskCoverCache::new(dir.path().join("covers"));

        assert_eq!(extractor.cover(&cache).origin, CoverOrigin::Manifest);
        let file = cache.path_for(&extractor.cover_key());
        assert!(file.is_file());
        assert_eq!(
            file.file_name().unwrap().to_string_lossy(),
            "urn_uuid_1234-The Wandering Inn.png"
        );

        let cached = extractor.cover(&cache);
        assert_eq!(cached.origin, CoverOrigin::Cache);
        assert_eq!((cached.image.width(), cached.image.height()), (3, 5));
    }

    #[test]
    fn test_file_extractor_cover_is_placeholder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Twig.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let cover = FileExtractor::open(&path).unwrap().cover(&MemoryCoverCache::new());
        assert_eq!(cover.origin, CoverOrigin::Placeholder);
        assert_eq!(cover.alt_text, "Twig.pdf");
    }
}
