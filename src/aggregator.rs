//! Runs every registered crawler over one workspace file listing.
//!
//! Each manifest path is read at most once, even when several crawlers claim
//! it. Reads run concurrently; the report is assembled afterwards in crawler
//! order and, within a crawler, in the order `identify` returned paths.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::crawler::PackageCrawler;
use crate::models::CrawlReport;

/// Source of file contents for the aggregator.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<String>;
}

/// Reads files from the local filesystem.
pub struct FsReader;

#[async_trait]
impl FileReader for FsReader {
    async fn read_file(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path))
    }
}

/// Build a [`CrawlReport`] for `file_names` using every crawler in `crawlers`.
///
/// Unreadable or empty files are logged and skipped. A language appears in
/// the report once at least one of its manifests had content.
pub async fn build_crawl_report(
    crawlers: &[Box<dyn PackageCrawler>],
    file_names: &[String],
    reader: &dyn FileReader,
) -> CrawlReport {
    let identified: Vec<Vec<String>> = crawlers
        .iter()
        .map(|crawler| {
            let files = crawler.identify(file_names);
            debug!(language = crawler.language(), count = files.len(), "identified package files");
            files
        })
        .collect();

    // Fixed before any read is issued, so no path can be read twice.
    let unique_paths: IndexSet<&str> = identified.iter().flatten().map(String::as_str).collect();

    let reads = unique_paths.iter().map(|&path| async move {
        match reader.read_file(path).await {
            Ok(contents) => (path, Some(contents)),
            Err(e) => {
                warn!(path, error = %format!("{:#}", e), "package file unavailable");
                (path, None)
            }
        }
    });
    let contents: HashMap<&str, Option<String>> = join_all(reads).await.into_iter().collect();

    let mut report = CrawlReport::new();
    for (crawler, files) in crawlers.iter().zip(&identified) {
        let files: IndexSet<&String> = files.iter().collect();
        for file in files {
            let Some(Some(text)) = contents.get(file.as_str()) else {
                continue;
            };
            if text.is_empty() {
                debug!(path = %file, "skipping empty package file");
                continue;
            }
            let records = crawler.parse(text, file);
            debug!(language = crawler.language(), path = %file, count = records.len(), "parsed package file");
            report.extend(crawler.language(), records);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;

    use crate::config::Config;
    use crate::crawler;
    use crate::models::{DependencyRecord, DocumentationResult};

    /// In-memory reader that counts reads per path.
    #[derive(Default)]
    struct MemReader {
        files: HashMap<String, String>,
        reads: Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
    }

    impl MemReader {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn reads_of(&self, path: &str) -> usize {
            self.reads.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl FileReader for MemReader {
        async fn read_file(&self, path: &str) -> Result<String> {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self.reads.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no such file: {}", path))
        }
    }

    /// Reader whose reads finish after a per-path delay, recording completion order.
    struct SlowReader {
        inner: MemReader,
        delays_ms: HashMap<String, u64>,
        finished: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileReader for SlowReader {
        async fn read_file(&self, path: &str) -> Result<String> {
            let delay = self.delays_ms.get(path).copied().unwrap_or(0);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            self.finished.lock().unwrap().push(path.to_string());
            self.inner.read_file(path).await
        }
    }

    type Seen = Arc<Mutex<Vec<(String, String)>>>;

    /// Crawler that claims `config.json` and records what it was asked to parse.
    struct ConfigCrawler {
        language: &'static str,
        seen: Seen,
    }

    impl ConfigCrawler {
        fn new(language: &'static str) -> (Self, Seen) {
            let seen = Seen::default();
            let crawler = Self {
                language,
                seen: Arc::clone(&seen),
            };
            (crawler, seen)
        }
    }

    #[async_trait]
    impl PackageCrawler for ConfigCrawler {
        fn language(&self) -> &'static str {
            self.language
        }

        fn is_package_file(&self, file_name: &str) -> bool {
            file_name == "config.json"
        }

        fn parse(&self, content: &str, file_path: &str) -> Vec<DependencyRecord> {
            self.seen
                .lock()
                .unwrap()
                .push((content.to_string(), file_path.to_string()));
            vec![DependencyRecord::new(self.language, "1.0.0", file_path)]
        }

        async fn resolve_documentation_link(&self, package_name: &str) -> Result<DocumentationResult> {
            Ok(DocumentationResult::error(package_name, "unsupported"))
        }
    }

    fn real_crawlers() -> Vec<Box<dyn PackageCrawler>> {
        crawler::all_crawlers(&Config::default(), &reqwest::Client::new(), &[])
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_package_json_scenario() {
        let reader = MemReader::with(&[
            ("package.json", r#"{"dependencies":{"lodash":"^4.17.21"}}"#),
            ("README.md", "# hello"),
        ]);
        let report = build_crawl_report(
            &real_crawlers(),
            &names(&["package.json", "README.md"]),
            &reader,
        )
        .await;

        assert_eq!(report.languages().collect::<Vec<_>>(), vec!["typescript"]);
        assert_eq!(
            report.get("typescript").unwrap(),
            &[DependencyRecord::new("lodash", "^4.17.21", "package.json")]
        );
        assert_eq!(reader.reads_of("README.md"), 0);
    }

    #[tokio::test]
    async fn test_shared_file_read_once() {
        let (alpha, alpha_seen) = ConfigCrawler::new("alpha");
        let (beta, beta_seen) = ConfigCrawler::new("beta");
        let crawlers: Vec<Box<dyn PackageCrawler>> = vec![Box::new(alpha), Box::new(beta)];
        let reader = MemReader::with(&[("config.json", "{\"k\": 1}")]);

        let report = build_crawl_report(&crawlers, &names(&["config.json"]), &reader).await;

        assert_eq!(reader.reads_of("config.json"), 1);
        assert_eq!(reader.total.load(Ordering::SeqCst), 1);
        assert_eq!(report.languages().collect::<Vec<_>>(), vec!["alpha", "beta"]);
        assert_eq!(report.total(), 2);

        let expected = vec![("{\"k\": 1}".to_string(), "config.json".to_string())];
        assert_eq!(*alpha_seen.lock().unwrap(), expected);
        assert_eq!(*beta_seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_duplicate_names_in_listing_are_read_and_parsed_once() {
        let reader = MemReader::with(&[("requirements.txt", "flask==2.0.1\n")]);
        let report = build_crawl_report(
            &real_crawlers(),
            &names(&["requirements.txt", "requirements.txt"]),
            &reader,
        )
        .await;

        assert_eq!(reader.reads_of("requirements.txt"), 1);
        assert_eq!(
            report.get("python").unwrap(),
            &[DependencyRecord::new("flask", "2.0.1", "requirements.txt")]
        );
    }

    #[tokio::test]
    async fn test_unreadable_and_empty_files_are_skipped() {
        let reader = MemReader::with(&[
            ("a/package.json", r#"{"dependencies":{"left-pad":"1.3.0"}}"#),
            ("b/requirements.txt", ""),
        ]);
        let report = build_crawl_report(
            &real_crawlers(),
            &names(&["missing/package.json", "a/package.json", "b/requirements.txt", "c/Cargo.toml"]),
            &reader,
        )
        .await;

        assert_eq!(reader.reads_of("missing/package.json"), 1);
        assert_eq!(reader.reads_of("c/Cargo.toml"), 1);
        assert_eq!(report.languages().collect::<Vec<_>>(), vec!["typescript"]);
        assert_eq!(
            report.get("typescript").unwrap(),
            &[DependencyRecord::new("left-pad", "1.3.0", "a/package.json")]
        );
    }

    #[tokio::test]
    async fn test_empty_listing_yields_empty_report() {
        let reader = MemReader::default();
        let report = build_crawl_report(&real_crawlers(), &[], &reader).await;
        assert!(report.is_empty());
        assert_eq!(reader.total.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_report_is_deterministic() {
        let reader = MemReader::with(&[
            ("x/package.json", r#"{"dependencies":{"a":"1","b":"2"}}"#),
            ("y/package.json", r#"{"dependencies":{"c":"3"}}"#),
            ("pyproject.toml", "[project]\ndependencies = [\"httpx>=0.24\"]\n"),
            ("Cargo.toml", "[dependencies]\nserde = \"1\"\n"),
        ]);
        let listing = names(&["y/package.json", "Cargo.toml", "x/package.json", "pyproject.toml"]);

        let first = build_crawl_report(&real_crawlers(), &listing, &reader).await;
        let second = build_crawl_report(&real_crawlers(), &listing, &reader).await;
        assert_eq!(first, second);

        assert_eq!(
            first.languages().collect::<Vec<_>>(),
            vec!["typescript", "python", "rust"]
        );
        let ts: Vec<&str> = first
            .get("typescript")
            .unwrap()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(ts, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_report_order_ignores_read_completion_order() {
        let files = [
            ("a/package.json", r#"{"dependencies":{"first":"1"}}"#),
            ("b/package.json", r#"{"dependencies":{"second":"2"}}"#),
            ("requirements.txt", "flask==2.0.1\n"),
            ("Cargo.toml", "[dependencies]\nserde = \"1\"\n"),
        ];
        let listing = names(&["a/package.json", "b/package.json", "requirements.txt", "Cargo.toml"]);

        // Later paths finish first.
        let slow = SlowReader {
            inner: MemReader::with(&files),
            delays_ms: listing
                .iter()
                .rev()
                .enumerate()
                .map(|(i, path)| (path.clone(), i as u64 * 40))
                .collect(),
            finished: Mutex::new(Vec::new()),
        };
        let report = build_crawl_report(&real_crawlers(), &listing, &slow).await;

        let finished = slow.finished.lock().unwrap().clone();
        assert_eq!(finished, vec!["Cargo.toml", "requirements.txt", "b/package.json", "a/package.json"]);

        let in_order = build_crawl_report(&real_crawlers(), &listing, &MemReader::with(&files)).await;
        assert_eq!(report, in_order);
        assert_eq!(
            report.languages().collect::<Vec<_>>(),
            vec!["typescript", "python", "rust"]
        );
        let ts: Vec<&str> = report
            .get("typescript")
            .unwrap()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(ts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fs_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();

        let ok = FsReader.read_file(&path.display().to_string()).await.unwrap();
        assert_eq!(ok, "{}");

        let missing = dir.path().join("nope").display().to_string();
        assert!(FsReader.read_file(&missing).await.is_err());
    }
}
