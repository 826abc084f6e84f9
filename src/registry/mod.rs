//! Shared HTTP plumbing for package-registry lookups.
//!
//! Expected failures (package absent, HTTP error status, transport failure)
//! come back as [`Lookup::Missing`] with a human-readable reason. Only a
//! successful response whose body is not JSON is returned as `Err`.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Reason reported when a registry answers 404.
pub const NOT_FOUND: &str = "package not found";

/// Reason reported when registry metadata carries no documentation field.
pub const NO_DOCS_FIELD: &str = "no documentation link in registry metadata";

#[derive(Debug)]
pub enum Lookup {
    Found(serde_json::Value),
    Missing(String),
}

/// Issue one GET against `url` and decode the JSON body.
pub async fn fetch_json(client: &Client, url: &str) -> Result<Lookup> {
    debug!(url, "registry lookup");

    let response = match client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return Ok(Lookup::Missing(format!("request failed: {}", e))),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(Lookup::Missing(NOT_FOUND.to_string()));
    }
    if !status.is_success() {
        return Ok(Lookup::Missing(format!(
            "registry returned HTTP {}",
            status.as_u16()
        )));
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return Ok(Lookup::Missing(format!("request failed: {}", e))),
    };
    let json = serde_json::from_str(&body)
        .with_context(|| format!("registry response from {} is not valid JSON", url))?;

    Ok(Lookup::Found(json))
}

/// Build the HTTP client shared by every crawler.
pub fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()?)
}

/// Strip trailing slashes so endpoints can be joined with `/`.
pub fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
