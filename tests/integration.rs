//! Integration tests for Yomu
//!
//! End-to-end flows over the registry, stores and importers. Nothing here
//! needs a reachable website: sources are canned and paged searches are fed
//! by closures.

use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use yomu::database::{SearchPage, paged_search};
use yomu::import::{self, NovelFileInfo, SortKey, Sorting, list_directory};
use yomu::prelude::*;
use yomu::store::{ChapterStore, JsonChapterStore, MemoryStore, NovelFileStore};

mod common;
use common::{
    ReaderSource, TEST_BOOK_URL, TestSource, http_not_found, http_ok, http_redirect,
    package_opf, png_bytes, sample_chapters, serve_http, subdir, toc_ncx, write_epub,
};

fn book(n: u32) -> BookMetadata {
    BookMetadata::new(format!("Book {}", n), format!("https://x.test/book/{}", n))
}

#[cfg(test)]
mod chapter_list_tests {
    use super::*;

    #[tokio::test]
    async fn test_cached_chapters_skip_the_network() {
        let store = MemoryStore::new();
        let book_url = "https://unknown.test/book/1";
        store
            .insert_chapters(Chapter::from_metadata(
                book_url,
                vec![ChapterMetadata::new("Cached", "https://unknown.test/book/1/c1")],
            ))
            .await
            .unwrap();

        // No source answers for this URL, so only the cache can satisfy it.
        let registry = Registry::empty();
        let chapters = fetch_chapters_list(&registry, &store, book_url, true)
            .await
            .ok()
            .unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Cached");
    }

    #[tokio::test]
    async fn test_incompatible_source() {
        let store = MemoryStore::new();
        let registry = Registry::empty();

        let response =
            fetch_chapters_list(&registry, &store, "https://unknown.test/book/2", true).await;
        let message = response.error_message().unwrap();
        assert!(message.starts_with("Incompatible source"));
        assert!(message.ends_with("https://unknown.test/book/2"));
    }

    #[tokio::test]
    async fn test_fetched_chapters_are_stored_once() {
        let store = MemoryStore::new();
        let mut registry = Registry::empty();
        registry.add(TestSource::new(sample_chapters(3)));

        let first = fetch_chapters_list(&registry, &store, TEST_BOOK_URL, false)
            .await
            .ok()
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(
            first.iter().map(|c| c.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let again = fetch_chapters_list(&registry, &store, TEST_BOOK_URL, false)
            .await
            .ok()
            .unwrap();
        assert_eq!(again, first);
        assert_eq!(store.chapters(TEST_BOOK_URL).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_cache_falls_through_to_source() {
        let store = MemoryStore::new();
        let mut registry = Registry::empty();
        registry.add(TestSource::new(sample_chapters(2)));

        let chapters = fetch_chapters_list(&registry, &store, TEST_BOOK_URL, true)
            .await
            .ok()
            .unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].title, "Chapter 2");
    }

    #[tokio::test]
    async fn test_json_store_round_trip_and_dedupe() {
        let dir = TempDir::new().unwrap();
        let store = JsonChapterStore::new(dir.path().join("chapters"));

        assert!(store.chapters(TEST_BOOK_URL).await.unwrap().is_empty());

        store
            .insert_chapters(Chapter::from_metadata(TEST_BOOK_URL, sample_chapters(2)))
            .await
            .unwrap();
        store
            .insert_chapters(Chapter::from_metadata(TEST_BOOK_URL, sample_chapters(4)))
            .await
            .unwrap();

        let chapters = store.chapters(TEST_BOOK_URL).await.unwrap();
        assert_eq!(chapters.len(), 4);
        assert_eq!(chapters[3].title, "Chapter 4");
        assert!(store.path_for(TEST_BOOK_URL).is_file());

        let reopened = JsonChapterStore::new(dir.path().join("chapters"));
        assert_eq!(reopened.chapters(TEST_BOOK_URL).await.unwrap(), chapters);
    }

    #[tokio::test]
    async fn test_fetch_with_json_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonChapterStore::new(dir.path());
        let mut registry = Registry::empty();
        registry.add(TestSource::new(sample_chapters(5)));

        let fetched = fetch_chapters_list(&registry, &store, TEST_BOOK_URL, true)
            .await
            .ok()
            .unwrap();
        assert_eq!(fetched.len(), 5);

        let cached = fetch_chapters_list(&Registry::empty(), &store, TEST_BOOK_URL, true)
            .await
            .ok()
            .unwrap();
        assert_eq!(cached, fetched);
    }

    #[tokio::test]
    async fn test_unreachable_chapter_is_an_error_value() {
        let client = HttpClient::new().unwrap();
        let registry = Registry::new(&client);

        let response = download_chapter(&registry, &client, "http://127.0.0.1:9/chapter/1").await;
        assert!(response.is_error());
    }
}

#[cfg(test)]
mod download_tests {
    use super::*;

    async fn chapter_server() -> String {
        serve_http(|origin, path| match path {
            "/go/chapter-1" => http_redirect(&format!("{}/raw/chapter-1", origin)),
            "/away/chapter-1" => http_redirect(&format!("{}/elsewhere/chapter-1", origin)),
            "/raw/chapter-1" => http_ok(r#"<div class="chapter"><p>Unformatted copy.</p></div>"#),
            "/reader/chapter-1" => http_ok(
                r#"<html><body><div class="chapter">
                    <p>Erin Solstice walked into the inn.</p>
                    <script>track()</script>
                    <p>It was empty.</p>
                </div></body></html>"#,
            ),
            "/elsewhere/chapter-1" => http_ok(r#"<div class="chapter"><p>Elsewhere.</p></div>"#),
            _ => http_not_found(),
        })
        .await
    }

    #[tokio::test]
    async fn test_source_is_chosen_by_redirect_target() {
        let origin = chapter_server().await;
        let client = HttpClient::new().unwrap();
        let mut registry = Registry::empty();
        registry.add(ReaderSource::new(&origin));

        let chapter_url = format!("{}/go/chapter-1", origin);
        assert!(registry.find_source_for(&chapter_url).is_none());

        let text = download_chapter(&registry, &client, &chapter_url)
            .await
            .ok()
            .unwrap();
        assert_eq!(text, "Erin Solstice walked into the inn.\n\nIt was empty.");
    }

    #[tokio::test]
    async fn test_direct_link_is_transformed_before_fetch() {
        let origin = chapter_server().await;
        let client = HttpClient::new().unwrap();
        let mut registry = Registry::empty();
        registry.add(ReaderSource::new(&origin));

        let text = download_chapter(&registry, &client, &format!("{}/raw/chapter-1", origin))
            .await
            .ok()
            .unwrap();
        assert!(text.starts_with("Erin Solstice"));
        assert!(!text.contains("Unformatted"));
    }

    #[tokio::test]
    async fn test_unsupported_redirect_names_both_urls() {
        let origin = chapter_server().await;
        let client = HttpClient::new().unwrap();
        let mut registry = Registry::empty();
        registry.add(ReaderSource::new(&origin));

        let chapter_url = format!("{}/away/chapter-1", origin);
        let response = download_chapter(&registry, &client, &chapter_url).await;

        assert_eq!(
            response.error_message(),
            Some(
                format!(
                    "Unable to load chapter from url:\n{}/away/chapter-1\n\nRedirect url:\n{}/elsewhere/chapter-1\n\nSource not supported",
                    origin, origin
                )
                .as_str()
            )
        );
    }

    #[tokio::test]
    async fn test_http_error_status_is_an_error_value() {
        let origin = chapter_server().await;
        let client = HttpClient::new().unwrap();
        let mut registry = Registry::empty();
        registry.add(ReaderSource::new(&origin));

        let response =
            download_chapter(&registry, &client, &format!("{}/raw/missing", origin)).await;
        let message = response.error_message().unwrap();
        assert!(message.starts_with(yomu::connect::UNKNOWN_PREFIX));
        assert!(message.contains("404"));
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;

    fn counting_search(
        calls: Arc<AtomicU32>,
        respond: fn(u32) -> Response<SearchPage>,
    ) -> SearchStream<'static> {
        paged_search(move |page| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                respond(page)
            }
        })
    }

    #[tokio::test]
    async fn test_search_stops_at_last_page() {
        let calls = Arc::new(AtomicU32::new(0));
        let events: Vec<SearchEvent> = counting_search(calls.clone(), |page| {
            Response::Success(SearchPage {
                books: vec![book(page)],
                last_page: 3,
            })
        })
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                SearchEvent::Entries { books: vec![book(1)], page: 1 },
                SearchEvent::Entries { books: vec![book(2)], page: 2 },
                SearchEvent::Entries { books: vec![book(3)], page: 3 },
                SearchEvent::NoMoreEntries,
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_search_is_lazy() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut events = counting_search(calls.clone(), |page| {
            Response::Success(SearchPage {
                books: vec![book(page)],
                last_page: 100,
            })
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = events.next().await.unwrap();
        assert!(matches!(first, SearchEvent::Entries { page: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        events.next().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_stops_after_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let events: Vec<SearchEvent> = counting_search(calls.clone(), |page| {
            if page == 2 {
                Response::Error("Timeout error.".to_string())
            } else {
                Response::Success(SearchPage {
                    books: vec![book(page)],
                    last_page: 5,
                })
            }
        })
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                SearchEvent::Entries { books: vec![book(1)], page: 1 },
                SearchEvent::Error { message: "Timeout error.".to_string(), page: 2 },
                SearchEvent::NoMoreEntries,
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_stops_on_empty_page() {
        let calls = Arc::new(AtomicU32::new(0));
        let events: Vec<SearchEvent> = counting_search(calls.clone(), |page| {
            Response::Success(SearchPage {
                books: if page == 1 { vec![book(1)] } else { Vec::new() },
                last_page: 9,
            })
        })
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[cfg(feature = "source-novel-updates")]
    #[tokio::test]
    async fn test_blank_database_search_only_ends() {
        let client = HttpClient::new().unwrap();
        let database = yomu::database::NovelUpdatesDatabase::new(&client);

        let events: Vec<SearchEvent> = database.search("   ").collect().await;
        assert_eq!(events, vec![SearchEvent::NoMoreEntries]);
    }

    #[tokio::test]
    async fn test_blank_catalog_search_across_sources() {
        let client = HttpClient::new().unwrap();
        let registry = Registry::new(&client);

        let results = registry.search_catalogs("").await;
        assert_eq!(results.len(), registry.catalog_sources().count());
        for (id, response) in results {
            let page = response.ok().unwrap_or_else(|| panic!("{} failed", id));
            assert!(page.is_empty());
            assert!(page.is_last_page);
        }
    }
}

#[cfg(test)]
mod import_tests {
    use super::*;

    fn library() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_epub(
            &dir.path().join("wandering-inn.epub"),
            &[
                (
                    "OEBPS/content.opf",
                    package_opf("The Wandering Inn", "pirateaba", "2017-07-27", "inn", "", ""),
                ),
                ("OEBPS/toc.ncx", toc_ncx(&[("Prologue", "ch0.xhtml")])),
                ("OEBPS/images/cover.png", png_bytes(2, 3)),
            ],
        );
        std::fs::write(dir.path().join("notes.pdf"), b"%PDF-1.4").unwrap();
        subdir(dir.path(), "nested");
        dir
    }

    #[tokio::test]
    async fn test_scan_directory_upserts_files() {
        let dir = library();
        let store = MemoryStore::new();

        let books = import::scan_directory(dir.path(), &store).await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(store.get_all().await.unwrap().len(), 2);

        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert!(titles.contains(&"The Wandering Inn"));
        assert!(titles.contains(&"notes.pdf"));
    }

    #[tokio::test]
    async fn test_rescan_keeps_reading_progress() {
        let dir = library();
        let store = MemoryStore::new();

        let books = import::scan_directory(dir.path(), &store).await.unwrap();
        let inn = books.iter().find(|b| b.title == "The Wandering Inn").unwrap();

        let mut read: NovelFileInfo = inn.clone();
        read.progress = 40;
        read.current_chapter = 1;
        read.chapter_progress = 75;
        read.is_favorite = true;
        store.upsert(read).await.unwrap();

        import::scan_directory(dir.path(), &store).await.unwrap();
        let stored = store.get(&inn.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 40);
        assert_eq!(stored.current_chapter, 1);
        assert_eq!(stored.chapter_progress, 75);
        assert!(stored.is_favorite);
        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cached_directory_is_sorted_by_title() {
        let dir = library();
        let store = MemoryStore::new();
        import::scan_directory(dir.path(), &store).await.unwrap();

        let cached = import::cached_directory(dir.path(), &store).await.unwrap();
        let titles: Vec<&str> = cached.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["The Wandering Inn", "notes.pdf"]);

        let elsewhere = TempDir::new().unwrap();
        assert!(
            import::cached_directory(elsewhere.path(), &store)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_file_store_insert_and_delete() {
        let dir = library();
        let store = MemoryStore::new();
        let books = import::scan_directory(dir.path(), &store).await.unwrap();
        let first = books[0].clone();

        assert!(!store.insert(first.clone()).await.unwrap());
        store.delete(&first.id).await.unwrap();
        assert!(store.get(&first.id).await.unwrap().is_none());
        assert!(store.insert(first).await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_of_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        assert!(
            import::scan_directory(&dir.path().join("missing"), &store)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_list_directory_sorting_and_summary() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), vec![b'a'; 10]).unwrap();
        std::fs::write(dir.path().join("b.epub"), vec![b'b'; 300]).unwrap();
        std::fs::write(dir.path().join("c.txt"), vec![b'c'; 5]).unwrap();
        let zeta = subdir(dir.path(), "zeta");
        subdir(&zeta, "inner");
        std::fs::write(zeta.join("one.txt"), b"1").unwrap();
        subdir(dir.path(), "alpha");

        let listing = list_directory(dir.path(), Sorting::default()).await.unwrap();
        let names: Vec<&str> = listing.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta", "a.txt", "b.epub", "c.txt"]);
        assert_eq!(listing.len(), 5);

        assert_eq!(listing.directories[0].summary(), "0 Folders, 0 Files");
        assert_eq!(listing.directories[1].summary(), "1 Folders, 1 Files");
        assert!(listing.files[0].summary().starts_with("10 bytes, "));

        let by_size = list_directory(dir.path(), Sorting::new(SortKey::Size, false))
            .await
            .unwrap();
        let names: Vec<&str> = by_size.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "b.epub", "a.txt", "c.txt"]);

        let by_type = list_directory(dir.path(), Sorting::new(SortKey::Type, true))
            .await
            .unwrap();
        let files: Vec<&str> = by_type.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(files, vec!["b.epub", "a.txt", "c.txt"]);
    }
}
