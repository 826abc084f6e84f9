use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration structure, deserialized from `.dep-docs/config.toml`.
///
/// Every section and field is optional; missing values fall back to the
/// built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URLs of the package registries queried for documentation links.
    pub registries: RegistryConfig,
    /// HTTP client behaviour for registry lookups.
    pub http: HttpConfig,
    /// Workspace crawling rules.
    pub crawl: CrawlConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub npm: String,
    pub pypi: String,
    pub crates_io: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm: "https://registry.npmjs.org".to_string(),
            pypi: "https://pypi.org".to_string(),
            crates_io: "https://crates.io".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Number of registry lookups in flight at once.
    pub batch_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("dep-docs/{}", env!("CARGO_PKG_VERSION")),
            batch_size: 75,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Directory names never descended into while walking a workspace.
    pub ignore_dirs: Vec<String>,
    /// Language tags (e.g. `"rust"`) whose crawlers are disabled.
    pub exclude_languages: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        let ignore_dirs = [
            ".git",
            "node_modules",
            "target",
            ".venv",
            "venv",
            "__pycache__",
            ".tox",
            "dist",
            "build",
        ];
        Self {
            ignore_dirs: ignore_dirs.iter().map(|s| s.to_string()).collect(),
            exclude_languages: Vec::new(),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.dep-docs/config.toml`
/// 3. `~/.config/dep-docs/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".dep-docs").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("dep-docs").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}
