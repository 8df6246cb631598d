use log::{debug, info};
use reqwest::Url;
use thiserror::Error;

use crate::retry::{Backoff, Exhausted};

/// Something that can download a page as text.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Gave up fetching {url} after {attempts} attempts")]
    RetryExhausted {
        url: Url,
        attempts: u32,
        #[source]
        last: reqwest::Error,
    },
}

pub struct WikiClient {
    client: reqwest::Client,
    backoff: Backoff,
}

impl WikiClient {
    pub fn new(backoff: Backoff) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, backoff })
    }

    pub fn reqwest(&self) -> &reqwest::Client {
        &self.client
    }

    async fn fetch_once(&self, url: &Url) -> reqwest::Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            // Missing wiki pages come back as 404 with the "no text" notice in the body
            debug!("Server returned {status:?} for {url}");
        }
        response.text().await
    }
}

impl PageFetcher for WikiClient {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        info!("Fetching {url}");
        self.backoff
            .run(|| self.fetch_once(url))
            .await
            .map_err(|Exhausted { attempts, last }| FetchError::RetryExhausted {
                url: url.clone(),
                attempts,
                last,
            })
    }
}
