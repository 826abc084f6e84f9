use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One dependency declaration extracted from a manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    /// Declared version or range, empty when the manifest declares none.
    pub version: String,
    #[serde(rename = "foundInFilepath")]
    pub found_in_filepath: String,
}

impl DependencyRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        found_in_filepath: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            found_in_filepath: found_in_filepath.into(),
        }
    }
}

/// Outcome of a documentation lookup: exactly one of a link or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocsOutcome {
    Link(String),
    Error(String),
}

/// A dependency record extended with its documentation outcome.
///
/// Serializes flat, e.g. `{"name": "...", "version": "...", "foundInFilepath": "...", "link": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentationResult {
    #[serde(flatten)]
    pub package: DependencyRecord,
    #[serde(flatten)]
    pub outcome: DocsOutcome,
}

impl DocumentationResult {
    /// Result of a lookup by package name alone (no version or manifest path).
    pub fn link(name: &str, link: impl Into<String>) -> Self {
        Self {
            package: DependencyRecord::new(name, "", ""),
            outcome: DocsOutcome::Link(link.into()),
        }
    }

    pub fn error(name: &str, reason: impl Into<String>) -> Self {
        Self {
            package: DependencyRecord::new(name, "", ""),
            outcome: DocsOutcome::Error(reason.into()),
        }
    }

    /// Rebind this outcome onto a concrete record, keeping the record's version and path.
    pub fn for_record(&self, record: &DependencyRecord) -> Self {
        Self {
            package: record.clone(),
            outcome: self.outcome.clone(),
        }
    }

    pub fn link_str(&self) -> Option<&str> {
        match &self.outcome {
            DocsOutcome::Link(link) => Some(link),
            DocsOutcome::Error(_) => None,
        }
    }
}

/// Dependencies found in one crawl, grouped by ecosystem language tag.
///
/// Keys follow crawler registry order; records within a key follow manifest
/// processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CrawlReport {
    by_language: IndexMap<String, Vec<DependencyRecord>>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to a language bucket, creating the bucket if needed.
    pub fn extend(&mut self, language: &str, records: Vec<DependencyRecord>) {
        self.by_language
            .entry(language.to_string())
            .or_default()
            .extend(records);
    }

    pub fn get(&self, language: &str) -> Option<&[DependencyRecord]> {
        self.by_language.get(language).map(Vec::as_slice)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.by_language.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DependencyRecord])> {
        self.by_language
            .iter()
            .map(|(lang, records)| (lang.as_str(), records.as_slice()))
    }

    /// Total number of records across all languages.
    pub fn total(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }
}
