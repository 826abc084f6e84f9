//! Per-ecosystem package crawlers.
//!
//! A crawler knows three things about its ecosystem: which file names are
//! package manifests, how to turn a manifest's text into
//! [`DependencyRecord`]s, and where to look up a package's documentation.
//! Crawlers are stateless apart from their registry endpoint and HTTP client.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::models::{DependencyRecord, DocumentationResult};

pub mod python;
pub mod rust;
pub mod typescript;

#[async_trait]
pub trait PackageCrawler: Send + Sync {
    /// Language tag used as the report key, e.g. `"python"`.
    fn language(&self) -> &'static str;

    /// Whether a bare file name is a manifest for this ecosystem.
    fn is_package_file(&self, file_name: &str) -> bool;

    /// Filter `candidates` down to this ecosystem's manifest files.
    ///
    /// Candidates may be bare names or paths; only the last path segment is
    /// matched. Input order is preserved and nothing is added.
    fn identify(&self, candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .filter(|candidate| self.is_package_file(base_name(candidate)))
            .cloned()
            .collect()
    }

    /// Parse a manifest into dependency records.
    ///
    /// Malformed entries are skipped; an unparseable file yields no records.
    fn parse(&self, content: &str, file_path: &str) -> Vec<DependencyRecord>;

    /// Look up a package's documentation link in the ecosystem's registry.
    ///
    /// Missing packages, missing documentation fields and transport failures
    /// are reported as the error outcome, not as `Err`.
    async fn resolve_documentation_link(&self, package_name: &str) -> Result<DocumentationResult>;
}

/// Last path segment of `path`, or `path` itself when it has none.
pub fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

/// Value at `path` inside a parsed TOML manifest.
///
/// Walking stops with `None` when a key is absent or an intermediate value
/// is not a table; the latter is logged against `file_path`.
pub(crate) fn toml_value<'a>(doc: &'a toml::Table, path: &[&str], file_path: &str) -> Option<&'a toml::Value> {
    let (last, parents) = path.split_last()?;
    let mut table = doc;
    for key in parents {
        table = match table.get(*key)? {
            toml::Value::Table(inner) => inner,
            _ => {
                debug!(file_path, section = %path.join("."), "skipping mistyped manifest section");
                return None;
            }
        };
    }
    table.get(*last)
}

/// Table at `path`, or `None` when absent or not a table.
pub(crate) fn toml_table<'a>(doc: &'a toml::Table, path: &[&str], file_path: &str) -> Option<&'a toml::Table> {
    let value = toml_value(doc, path, file_path)?;
    if value.as_table().is_none() {
        debug!(file_path, section = %path.join("."), "expected a table, skipping section");
    }
    value.as_table()
}

/// Array at `path`, or `None` when absent or not an array.
pub(crate) fn toml_array<'a>(doc: &'a toml::Table, path: &[&str], file_path: &str) -> Option<&'a [toml::Value]> {
    let value = toml_value(doc, path, file_path)?;
    match value.as_array() {
        Some(items) => Some(items.as_slice()),
        None => {
            debug!(file_path, section = %path.join("."), "expected an array, skipping section");
            None
        }
    }
}

/// Every supported crawler, in report order, minus the excluded languages.
pub fn all_crawlers(config: &Config, client: &Client, excluded: &[String]) -> Vec<Box<dyn PackageCrawler>> {
    let all: Vec<Box<dyn PackageCrawler>> = vec![
        Box::new(typescript::TypeScriptCrawler::new(
            client.clone(),
            &config.registries.npm,
        )),
        Box::new(python::PythonCrawler::new(
            client.clone(),
            &config.registries.pypi,
        )),
        Box::new(rust::RustCrawler::new(
            client.clone(),
            &config.registries.crates_io,
        )),
    ];

    all.into_iter()
        .filter(|crawler| {
            !excluded
                .iter()
                .any(|lang| lang.eq_ignore_ascii_case(crawler.language()))
        })
        .collect()
}
