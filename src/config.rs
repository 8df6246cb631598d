use std::{io, path::PathBuf, time::Duration};

use ddr_rating_scraping_utils::fs_util::read_toml;
use fs_err::File;
use log::{info, warn};
use serde::Deserialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use url::Url;

use crate::{
    retry::Backoff,
    wiki::{DEFAULT_BASE_URL, DEFAULT_SEARCH_SITE},
};

pub const DEFAULT_CREDENTIALS_PATH: &str = "./ignore/credentials_search.json";

#[serde_as]
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub wiki_base_url: String,
    pub search_site: String,
    pub retry: Backoff,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub search_cooldown: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wiki_base_url: DEFAULT_BASE_URL.to_owned(),
            search_site: DEFAULT_SEARCH_SITE.to_owned(),
            retry: Backoff::default(),
            search_cooldown: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Reads the TOML file if given, otherwise uses the built-in defaults.
    pub fn load(path: Option<impl Into<PathBuf> + std::fmt::Debug>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                info!("Loading config from {path:?}");
                read_toml(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn wiki_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.wiki_base_url)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchCredentials {
    pub api_key: ApiKey,
    pub cse_id: SearchEngineId,
}

#[derive(Clone, Debug, derive_more::From, Deserialize)]
pub struct ApiKey(String);

#[derive(Clone, Debug, derive_more::From, derive_more::Display, Deserialize)]
pub struct SearchEngineId(String);

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SearchEngineId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsLoadError {
    #[error("Search credentials were not found.")]
    NotFound,
    #[error("An I/O error occurred when loading the search credentials: {0:?}")]
    IOError(io::Error),
    #[error("The search credentials json file is corrupted and could not be loaded: {0:?}")]
    JsonError(#[from] serde_json::Error),
}

impl From<io::Error> for CredentialsLoadError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::IOError(e),
        }
    }
}

impl SearchCredentials {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CredentialsLoadError> {
        Ok(serde_json::from_reader(io::BufReader::new(File::open(
            path,
        )?))?)
    }

    /// Like [`Self::load`], but a missing file only disables the search.
    pub fn load_if_exists(path: impl Into<PathBuf>) -> Result<Option<Self>, CredentialsLoadError> {
        match Self::load(path) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(CredentialsLoadError::NotFound) => {
                warn!("Search credentials not found, fallback search is disabled");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
