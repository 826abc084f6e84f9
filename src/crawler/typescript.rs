use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::models::{DependencyRecord, DocumentationResult};
use crate::registry::{self, Lookup};

/// Dependency sections of `package.json`, in the order they are reported.
const SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Crawler for TypeScript/JavaScript projects, backed by the npm registry.
pub struct TypeScriptCrawler {
    client: Client,
    registry_url: String,
}

impl TypeScriptCrawler {
    pub fn new(client: Client, registry_url: &str) -> Self {
        Self {
            client,
            registry_url: registry::trim_base(registry_url),
        }
    }
}

#[async_trait]
impl super::PackageCrawler for TypeScriptCrawler {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn is_package_file(&self, file_name: &str) -> bool {
        file_name == "package.json"
    }

    fn parse(&self, content: &str, file_path: &str) -> Vec<DependencyRecord> {
        parse_package_json(content, file_path)
    }

    async fn resolve_documentation_link(&self, package_name: &str) -> Result<DocumentationResult> {
        // Scoped packages need URL encoding: @scope/pkg → %40scope%2Fpkg
        let encoded_name = package_name.replace('@', "%40").replace('/', "%2F");
        let url = format!("{}/{}", self.registry_url, encoded_name);

        let data = match registry::fetch_json(&self.client, &url).await? {
            Lookup::Found(data) => data,
            Lookup::Missing(reason) => return Ok(DocumentationResult::error(package_name, reason)),
        };

        Ok(match homepage(&data) {
            Some(link) => DocumentationResult::link(package_name, link),
            None => DocumentationResult::error(package_name, registry::NO_DOCS_FIELD),
        })
    }
}

/// npm has no dedicated docs field; `homepage` is where packages point to their docs.
fn homepage(data: &Value) -> Option<String> {
    data.get("homepage")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse `package.json`, keeping version ranges exactly as declared.
fn parse_package_json(content: &str, file_path: &str) -> Vec<DependencyRecord> {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(e) => {
            debug!(file_path, error = %e, "unparseable package.json");
            return Vec::new();
        }
    };

    let mut deps = Vec::new();
    for section in SECTIONS {
        if let Some(pkgs) = json.get(section).and_then(Value::as_object) {
            for (name, version_range) in pkgs {
                match version_range.as_str() {
                    Some(version) if !name.is_empty() => {
                        deps.push(DependencyRecord::new(name.as_str(), version.trim(), file_path));
                    }
                    _ => debug!(file_path, name = %name, "skipping malformed dependency entry"),
                }
            }
        }
    }

    deps
}
