//! Fallback lookup through a site-restricted web search.

use std::time::Duration;

use anyhow::{bail, Context};
use log::{info, warn};
use reqwest::Url;
use serde::Deserialize;
use tokio::time::sleep;

use crate::{
    api::PageFetcher,
    config::SearchCredentials,
    wiki::{is_valid_song_page, SongName},
};

const CUSTOM_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Returns result links in relevance order.
#[allow(async_fn_in_trait)]
pub trait SearchEngine {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<Url>>;
}

pub fn site_query(site: &str, song: &SongName) -> String {
    format!("site:{site} {song}")
}

/// Google Programmable Search (Custom Search JSON API).
pub struct CustomSearch {
    client: reqwest::Client,
    credentials: SearchCredentials,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    link: Url,
}

impl CustomSearch {
    pub fn new(client: reqwest::Client, credentials: SearchCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

impl SearchEngine for CustomSearch {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<Url>> {
        let response = self
            .client
            .get(CUSTOM_SEARCH_ENDPOINT)
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("cx", self.credentials.cse_id.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .context("Search request failed")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read search response")?;
        if !status.is_success() {
            bail!("Search API returned {status:?}: {body}");
        }
        let response: SearchResponse =
            serde_json::from_str(&body).context("Malformed search response")?;
        Ok(response.items.into_iter().map(|item| item.link).collect())
    }
}

/// Searches `site` for the song and returns the first result that is a valid song page.
///
/// Sleeps `cooldown` once after the search, whatever its outcome.
pub async fn find_song_page(
    fetcher: &impl PageFetcher,
    search: &impl SearchEngine,
    site: &str,
    song: &SongName,
    cooldown: Duration,
) -> anyhow::Result<Option<(Url, String)>> {
    let result = try_candidates(fetcher, search, site, song).await;
    sleep(cooldown).await;
    result
}

async fn try_candidates(
    fetcher: &impl PageFetcher,
    search: &impl SearchEngine,
    site: &str,
    song: &SongName,
) -> anyhow::Result<Option<(Url, String)>> {
    let query = site_query(site, song);
    let candidates = search
        .search(&query)
        .await
        .with_context(|| format!("Search for {query:?} failed"))?;
    info!("Search returned {} candidates", candidates.len());
    for url in candidates {
        let page = match fetcher.fetch_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping candidate: {e:#}");
                continue;
            }
        };
        if is_valid_song_page(&page) {
            info!("Found page for song: {url}");
            return Ok(Some((url, page)));
        }
    }
    Ok(None)
}
