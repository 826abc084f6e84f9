use anyhow::Result;
use serde::Serialize;

use crate::models::{CrawlReport, DocumentationResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    dependencies: &'a CrawlReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<&'a [DocumentationResult]>,
}

/// Serialize the crawl report, and documentation results when resolved, as pretty JSON.
pub fn to_string(report: &CrawlReport, documentation: Option<&[DocumentationResult]>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport {
        dependencies: report,
        documentation,
    })?)
}
