use serde::Deserialize;
use thiserror::Error;

use crate::model::config::AppConfig;
use crate::net::{FetchError, Fetcher};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected skill listing: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Names of skills published on the remote host, sorted.
pub fn available_skills(config: &AppConfig, fetcher: &dyn Fetcher) -> Result<Vec<String>, CatalogError> {
    let url = &config.remote.skill_listing_url;
    let response = fetcher.get(url)?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.clone(),
            status: response.status,
        }
        .into());
    }

    let entries: Vec<ListingEntry> = serde_json::from_slice(&response.body)?;
    let mut names: Vec<String> = entries
        .into_iter()
        .filter(|entry| entry.kind == "dir")
        .map(|entry| entry.name)
        .collect();
    names.sort();
    tracing::debug!("{} skills available", names.len());
    Ok(names)
}
