use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{base_name, toml_array, toml_table};
use crate::models::{DependencyRecord, DocumentationResult};
use crate::registry::{self, Lookup};

/// Crawler for Python projects, backed by PyPI.
///
/// Recognizes `requirements*.txt`, `pyproject.toml` (PEP 621 and Poetry),
/// `Pipfile` and `Pipfile.lock`.
pub struct PythonCrawler {
    client: Client,
    registry_url: String,
}

impl PythonCrawler {
    pub fn new(client: Client, registry_url: &str) -> Self {
        Self {
            client,
            registry_url: registry::trim_base(registry_url),
        }
    }
}

#[async_trait]
impl super::PackageCrawler for PythonCrawler {
    fn language(&self) -> &'static str {
        "python"
    }

    fn is_package_file(&self, file_name: &str) -> bool {
        matches!(file_name, "pyproject.toml" | "Pipfile" | "Pipfile.lock")
            || (file_name.starts_with("requirements") && file_name.ends_with(".txt"))
    }

    fn parse(&self, content: &str, file_path: &str) -> Vec<DependencyRecord> {
        match base_name(file_path) {
            "pyproject.toml" => parse_pyproject_toml(content, file_path),
            "Pipfile" => parse_pipfile(content, file_path),
            "Pipfile.lock" => parse_pipfile_lock(content, file_path),
            _ => parse_requirements_txt(content, file_path),
        }
    }

    async fn resolve_documentation_link(&self, package_name: &str) -> Result<DocumentationResult> {
        let url = format!("{}/pypi/{}/json", self.registry_url, package_name);

        let data = match registry::fetch_json(&self.client, &url).await? {
            Lookup::Found(data) => data,
            Lookup::Missing(reason) => return Ok(DocumentationResult::error(package_name, reason)),
        };

        Ok(match documentation_url(&data) {
            Some(link) => DocumentationResult::link(package_name, link),
            None => DocumentationResult::error(package_name, registry::NO_DOCS_FIELD),
        })
    }
}

/// `info.project_urls.Documentation` (or `Docs`), falling back to `info.docs_url`.
fn documentation_url(data: &Value) -> Option<String> {
    let info = data.get("info")?;

    let from_project_urls = info
        .get("project_urls")
        .and_then(Value::as_object)
        .and_then(|urls| {
            urls.iter()
                .find(|(key, _)| {
                    let key = key.to_ascii_lowercase();
                    key == "documentation" || key == "docs"
                })
                .and_then(|(_, url)| url.as_str())
        });

    from_project_urls
        .or_else(|| info.get("docs_url").and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// name, optional [extras], then the rest of the line up to an environment marker
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._\-]*)\s*(?:\[[^\]]*\])?\s*([^;]*)")
        .expect("requirement pattern is valid")
});

// `#` at line start or after whitespace begins a comment
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#.*$").expect("comment pattern is valid"));

// per-requirement options such as `--hash=sha256:...`
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s--?[A-Za-z].*$").expect("option pattern is valid"));

/// Parse one PEP 508 requirement string into `(name, version)`.
///
/// An exact `==` pin yields the bare version; other specifiers are kept
/// without whitespace; a direct URL reference (`name @ url`) has no version.
fn parse_requirement(spec: &str) -> Option<(String, String)> {
    let caps = REQUIREMENT_RE.captures(spec.trim())?;
    let name = caps[1].to_string();
    let rest = caps.get(2).map_or("", |m| m.as_str()).trim();

    if !rest.is_empty() && !rest.starts_with(|c: char| "=<>!~@(".contains(c)) {
        return None;
    }

    Some((name, normalize_version(rest)))
}

/// Best-effort normalization of a Python version specifier for display.
fn normalize_version(spec: &str) -> String {
    let spec: String = spec
        .trim_start_matches('(')
        .trim_end_matches(')')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if spec.is_empty() || spec == "*" || spec.starts_with('@') {
        return String::new();
    }

    match spec.strip_prefix("===").or_else(|| spec.strip_prefix("==")) {
        Some(pinned) if !pinned.contains(',') => pinned.to_string(),
        _ => spec,
    }
}

/// Comment-free logical lines: a trailing `\` joins a line with the next one.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw in content.lines() {
        let line = COMMENT_RE.replace(raw, "");
        match line.trim_end().strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                current.push(' ');
            }
            None => {
                current.push_str(&line);
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }

    lines
}

/// Parse `requirements.txt`: one PEP 508 requirement per logical line.
fn parse_requirements_txt(content: &str, file_path: &str) -> Vec<DependencyRecord> {
    let mut deps = Vec::new();

    for line in logical_lines(content) {
        let line = OPTION_RE.replace(line.trim(), "");
        let line = line.trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        match parse_requirement(line) {
            Some((name, version)) => deps.push(DependencyRecord::new(name, version, file_path)),
            None => debug!(file_path, line, "skipping unparseable requirement"),
        }
    }

    deps
}

/// Push PEP 508 requirement strings, skipping non-strings and unparseable entries.
fn push_requirements(deps: &mut Vec<DependencyRecord>, entries: &[toml::Value], file_path: &str) {
    for entry in entries {
        match entry.as_str().and_then(parse_requirement) {
            Some((name, version)) => deps.push(DependencyRecord::new(name, version, file_path)),
            None => debug!(file_path, ?entry, "skipping malformed requirement"),
        }
    }
}

/// Parse `pyproject.toml`: PEP 621 `[project]` tables and Poetry's `[tool.poetry]`.
///
/// Each section is read on its own, so a mistyped section is skipped while
/// the rest of the file still contributes.
fn parse_pyproject_toml(content: &str, file_path: &str) -> Vec<DependencyRecord> {
    let doc: toml::Table = match toml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(file_path, error = %e, "unparseable pyproject.toml");
            return Vec::new();
        }
    };

    let mut deps = Vec::new();

    if let Some(reqs) = toml_array(&doc, &["project", "dependencies"], file_path) {
        push_requirements(&mut deps, reqs, file_path);
    }
    if let Some(extras) = toml_table(&doc, &["project", "optional-dependencies"], file_path) {
        for (extra, reqs) in extras {
            match reqs.as_array() {
                Some(reqs) => push_requirements(&mut deps, reqs, file_path),
                None => debug!(file_path, extra = %extra, "skipping mistyped optional dependency group"),
            }
        }
    }

    for key in ["dependencies", "dev-dependencies"] {
        if let Some(table) = toml_table(&doc, &["tool", "poetry", key], file_path) {
            push_table_deps(&mut deps, table, file_path);
        }
    }
    if let Some(groups) = toml_table(&doc, &["tool", "poetry", "group"], file_path) {
        for (group, value) in groups {
            match value.get("dependencies").and_then(toml::Value::as_table) {
                Some(table) => push_table_deps(&mut deps, table, file_path),
                None => debug!(file_path, group = %group, "skipping Poetry group without a dependency table"),
            }
        }
    }

    deps
}

/// Parse `Pipfile`: `[packages]` and `[dev-packages]` tables.
fn parse_pipfile(content: &str, file_path: &str) -> Vec<DependencyRecord> {
    let doc: toml::Table = match toml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(file_path, error = %e, "unparseable Pipfile");
            return Vec::new();
        }
    };

    let mut deps = Vec::new();
    for key in ["packages", "dev-packages"] {
        if let Some(table) = toml_table(&doc, &[key], file_path) {
            push_table_deps(&mut deps, table, file_path);
        }
    }
    deps
}

/// Push `name = "spec"` / `name = { version = "spec" }` entries, skipping the
/// interpreter constraint and anything that is neither.
fn push_table_deps(deps: &mut Vec<DependencyRecord>, table: &toml::Table, file_path: &str) {
    for (name, value) in table {
        if name.eq_ignore_ascii_case("python") {
            continue;
        }
        let version = match value {
            toml::Value::String(spec) => Some(spec.as_str()),
            toml::Value::Table(t) => Some(t.get("version").and_then(toml::Value::as_str).unwrap_or("")),
            _ => None,
        };
        match version {
            Some(spec) => deps.push(DependencyRecord::new(name.as_str(), normalize_version(spec), file_path)),
            None => debug!(file_path, name = %name, "skipping malformed dependency entry"),
        }
    }
}

/// Parse `Pipfile.lock` — JSON with `default` and `develop` sections.
fn parse_pipfile_lock(content: &str, file_path: &str) -> Vec<DependencyRecord> {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(e) => {
            debug!(file_path, error = %e, "unparseable Pipfile.lock");
            return Vec::new();
        }
    };

    let mut deps = Vec::new();
    for section in &["default", "develop"] {
        if let Some(pkgs) = json.get(section).and_then(Value::as_object) {
            for (name, info) in pkgs {
                if !info.is_object() {
                    continue;
                }
                let version = info.get("version").and_then(Value::as_str).unwrap_or("");
                deps.push(DependencyRecord::new(name.as_str(), normalize_version(version), file_path));
            }
        }
    }

    deps
}
