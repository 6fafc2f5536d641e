//! Address search API client.

use anyhow::{Context, Result};
use serde_json::Value;

pub const DEFAULT_ADDRESS_API_URL: &str = "https://api-adresse.data.gouv.fr/search/?q=%s";

/// Substitute the trimmed, lower-cased query for `%s` in `template`.
pub fn search_url(template: &str, query: &str) -> String {
    template.replace("%s", &query.trim().to_lowercase())
}

/// Split a search response into raw records. An array yields its elements,
/// an object yields its `features`.
pub fn extract_features(body: Value) -> Result<Vec<String>> {
    let features = match body {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("features") {
            Some(Value::Array(items)) => items,
            Some(other) => anyhow::bail!("'features' is not an array: {other}"),
            None => anyhow::bail!("Response object has no 'features' member"),
        },
        other => anyhow::bail!("Unexpected response body: {other}"),
    };

    Ok(features.iter().map(Value::to_string).collect())
}

/// Fetch the address records matching `query`.
pub async fn fetch_addresses(api_url: &str, query: &str) -> Result<Vec<String>> {
    let url = search_url(api_url, query);
    tracing::info!("Searching french addresses matching the query '{query}'");

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .with_context(|| format!("Failed to fetch URL: {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP request failed with status {status} for URL: {url}");
    }

    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to read response body from: {url}"))?;

    let records = extract_features(body).with_context(|| format!("Bad response from: {url}"))?;
    tracing::debug!("Fetched {} address records from: {url}", records.len());
    Ok(records)
}
