//! On-demand documentation lookups for selected dependencies.

use std::collections::HashMap;

use futures::future::join_all;
use indexmap::IndexSet;
use indicatif::ProgressBar;
use tracing::warn;

use crate::crawler::PackageCrawler;
use crate::models::{CrawlReport, DependencyRecord, DocumentationResult};

/// A dependency chosen for documentation lookup, tagged with its language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    pub language: String,
    pub record: DependencyRecord,
}

/// Pick the records whose name is in `names`, or every record when `names` is empty.
pub fn select(report: &CrawlReport, names: &[String]) -> Vec<Selected> {
    report
        .iter()
        .flat_map(|(language, records)| {
            records.iter().map(move |record| Selected {
                language: language.to_string(),
                record: record.clone(),
            })
        })
        .filter(|s| names.is_empty() || names.iter().any(|n| n == &s.record.name))
        .collect()
}

/// Resolve documentation links for `selected`, one result per selected record.
///
/// Each (language, name) pair is looked up once; lookups run concurrently in
/// batches of `batch_size`. A lookup that fails unexpectedly becomes an error
/// outcome for its records without affecting the others.
pub async fn resolve_all(
    crawlers: &[Box<dyn PackageCrawler>],
    selected: &[Selected],
    batch_size: usize,
    progress: Option<&ProgressBar>,
) -> Vec<DocumentationResult> {
    let by_language: HashMap<&str, &dyn PackageCrawler> = crawlers
        .iter()
        .map(|c| (c.language(), &**c))
        .collect();

    let lookups: Vec<(&str, &str)> = lookup_keys(selected).into_iter().collect();

    let mut resolved: HashMap<(&str, &str), DocumentationResult> = HashMap::new();
    for batch in lookups.chunks(batch_size.max(1)) {
        let futures: Vec<_> = batch
            .iter()
            .map(|&(language, name)| {
                let crawler = by_language.get(language).copied();
                async move {
                    let result = match crawler {
                        Some(crawler) => match crawler.resolve_documentation_link(name).await {
                            Ok(result) => result,
                            Err(e) => {
                                warn!(language, name, error = %format!("{:#}", e), "documentation lookup failed");
                                DocumentationResult::error(name, format!("{:#}", e))
                            }
                        },
                        None => DocumentationResult::error(name, format!("no crawler for language {}", language)),
                    };
                    ((language, name), result)
                }
            })
            .collect();

        for (key, result) in join_all(futures).await {
            resolved.insert(key, result);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
    }

    selected
        .iter()
        .filter_map(|s| {
            resolved
                .get(&(s.language.as_str(), s.record.name.as_str()))
                .map(|result| result.for_record(&s.record))
        })
        .collect()
}

/// Distinct (language, name) pairs in `selected`, in first-seen order.
fn lookup_keys(selected: &[Selected]) -> IndexSet<(&str, &str)> {
    selected
        .iter()
        .map(|s| (s.language.as_str(), s.record.name.as_str()))
        .collect()
}

/// Number of registry lookups [`resolve_all`] will issue for `selected`.
pub fn lookup_count(selected: &[Selected]) -> usize {
    lookup_keys(selected).len()
}
