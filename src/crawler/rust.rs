use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::toml_table;
use crate::models::{DependencyRecord, DocumentationResult};
use crate::registry::{self, Lookup};

/// Crawler for Rust projects, backed by crates.io.
pub struct RustCrawler {
    client: Client,
    registry_url: String,
}

impl RustCrawler {
    pub fn new(client: Client, registry_url: &str) -> Self {
        Self {
            client,
            registry_url: registry::trim_base(registry_url),
        }
    }
}

#[async_trait]
impl super::PackageCrawler for RustCrawler {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn is_package_file(&self, file_name: &str) -> bool {
        file_name == "Cargo.toml"
    }

    fn parse(&self, content: &str, file_path: &str) -> Vec<DependencyRecord> {
        parse_cargo_toml(content, file_path)
    }

    async fn resolve_documentation_link(&self, package_name: &str) -> Result<DocumentationResult> {
        let url = format!("{}/api/v1/crates/{}", self.registry_url, package_name);

        let data = match registry::fetch_json(&self.client, &url).await? {
            Lookup::Found(data) => data,
            Lookup::Missing(reason) => return Ok(DocumentationResult::error(package_name, reason)),
        };

        // Every published crate gets docs.rs pages, so an existing crate always has a link.
        let link = data
            .get("crate")
            .and_then(|c| c.get("documentation"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://docs.rs/{}", package_name));

        Ok(DocumentationResult::link(package_name, link))
    }
}

const DEPENDENCY_KINDS: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Parse `Cargo.toml` dependency tables.
///
/// Reads the top-level tables, then every `[target.<cfg>.*]` variant, then
/// `[workspace.dependencies]`. A mistyped table is skipped on its own.
/// Table entries without a `version` (path, git, `workspace = true`) get an
/// empty version; a `package` key names the real crate behind a rename.
fn parse_cargo_toml(content: &str, file_path: &str) -> Vec<DependencyRecord> {
    let doc: toml::Table = match toml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(file_path, error = %e, "unparseable Cargo.toml");
            return Vec::new();
        }
    };

    let mut tables: Vec<&toml::Table> = DEPENDENCY_KINDS
        .iter()
        .filter_map(|kind| toml_table(&doc, &[*kind], file_path))
        .collect();

    if let Some(targets) = toml_table(&doc, &["target"], file_path) {
        for (cfg, target) in targets {
            let Some(target) = target.as_table() else {
                debug!(file_path, target = %cfg, "skipping mistyped target section");
                continue;
            };
            tables.extend(DEPENDENCY_KINDS.iter().filter_map(|kind| toml_table(target, &[*kind], file_path)));
        }
    }

    tables.extend(toml_table(&doc, &["workspace", "dependencies"], file_path));

    let mut deps = Vec::new();
    for table in tables {
        for (key, value) in table {
            let entry = match value {
                toml::Value::String(version) => Some((key.as_str(), version.as_str())),
                toml::Value::Table(t) => {
                    let name = t.get("package").and_then(toml::Value::as_str).unwrap_or(key.as_str());
                    let version = t.get("version").and_then(toml::Value::as_str).unwrap_or("");
                    Some((name, version))
                }
                _ => None,
            };
            match entry {
                Some((name, version)) => deps.push(DependencyRecord::new(name, version.trim(), file_path)),
                None => debug!(file_path, name = %key, "skipping malformed dependency entry"),
            }
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::PackageCrawler;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crawler(url: &str) -> RustCrawler {
        RustCrawler::new(Client::new(), url)
    }

    #[test]
    fn test_parse_cargo_toml() {
        let content = r#"
[package]
name = "my-app"
version = "0.1.0"

[dependencies]
serde = { version = "1", features = ["derive"] }
tokio = "1.25"
local = { path = "../local" }
renamed = { package = "reqwest", version = "0.12" }
broken = 7

[dev-dependencies]
tempfile = "3"

[workspace.dependencies]
anyhow = { version = "1.0" }
"#;
        let deps = crawler("http://localhost").parse(content, "Cargo.toml");
        let got: Vec<(&str, &str)> = deps
            .iter()
            .map(|d| (d.name.as_str(), d.version.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("serde", "1"),
                ("tokio", "1.25"),
                ("local", ""),
                ("reqwest", "0.12"),
                ("tempfile", "3"),
                ("anyhow", "1.0"),
            ]
        );
    }

    #[test]
    fn test_parse_target_specific_tables() {
        let content = r#"
[dependencies]
log = "0.4"

[target.'cfg(unix)'.dependencies]
libc = "0.2"

[target.'cfg(windows)'.dev-dependencies]
windows-sys = { version = "0.52", features = ["Win32_Foundation"] }

[target.x86_64-pc-windows-msvc.build-dependencies]
cc = "1.0"

[workspace.dependencies]
anyhow = "1"
"#;
        let deps = parse_cargo_toml(content, "Cargo.toml");
        let got: Vec<(&str, &str)> = deps
            .iter()
            .map(|d| (d.name.as_str(), d.version.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("log", "0.4"),
                ("libc", "0.2"),
                ("windows-sys", "0.52"),
                ("cc", "1.0"),
                ("anyhow", "1"),
            ]
        );
    }

    #[test]
    fn test_mistyped_table_does_not_hide_others() {
        let content = r#"
dependencies = 3

[dev-dependencies]
tempfile = "3"

[target]
bogus = "x"

[workspace]
dependencies = ["serde"]
"#;
        let deps = parse_cargo_toml(content, "Cargo.toml");
        assert_eq!(deps, vec![DependencyRecord::new("tempfile", "3", "Cargo.toml")]);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_cargo_toml("[dependencies\nserde=", "Cargo.toml").is_empty());
        assert!(parse_cargo_toml("", "Cargo.toml").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_documentation_field_and_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/crates/serde"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"crate": {"name": "serde", "documentation": "https://docs.rs/serde/"}}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/crates/tiny"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"crate": {"name": "tiny", "documentation": null}}"#),
            )
            .mount(&server)
            .await;

        let c = crawler(&server.uri());
        let result = c.resolve_documentation_link("serde").await.unwrap();
        assert_eq!(result.link_str(), Some("https://docs.rs/serde/"));

        let result = c.resolve_documentation_link("tiny").await.unwrap();
        assert_eq!(result.link_str(), Some("https://docs.rs/tiny"));

        let result = c.resolve_documentation_link("nonexistent-pkg-xyz").await.unwrap();
        assert_eq!(
            result,
            DocumentationResult::error("nonexistent-pkg-xyz", "package not found")
        );
    }
}
