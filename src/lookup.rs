use std::{str::FromStr, time::Duration};

use log::{info, warn};
use thiserror::Error;
use url::Url;

use crate::{
    api::{FetchError, PageFetcher},
    config::Config,
    difficulty::{DifficultySet, Rating, RatingMode, Ratings, Slot},
    reduce::reduce,
    search::{find_song_page, SearchEngine},
    wiki::{is_valid_song_page, parser::parse_game_table, song_page_url, SongName},
};

/// Where the new ratings of a song come from.
#[allow(async_fn_in_trait)]
pub trait RatingSource {
    async fn ratings(&self, song: &SongName) -> Result<Ratings, LookupError>;
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No valid wiki page was found for {0}")]
    NotFound(SongName),
    #[error("The wiki page of {0} has no usable difficulty rows")]
    NoData(SongName),
    #[error("Search for {song} failed: {error:#}")]
    Search { song: SongName, error: anyhow::Error },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Looks up ratings on the wiki, falling back to a web search when the direct page is missing.
pub struct WikiLookup<F, S> {
    fetcher: F,
    search: Option<S>,
    base_url: Url,
    search_site: String,
    search_cooldown: Duration,
    mode: RatingMode,
}

impl<F: PageFetcher, S: SearchEngine> WikiLookup<F, S> {
    pub fn new(
        fetcher: F,
        search: Option<S>,
        config: &Config,
        mode: RatingMode,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            fetcher,
            search,
            base_url: config.wiki_base_url()?,
            search_site: config.search_site.clone(),
            search_cooldown: config.search_cooldown,
            mode,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Text of a valid song page, either the direct one or the first search hit.
    pub async fn song_page(&self, song: &SongName) -> Result<String, LookupError> {
        let url = song_page_url(&self.base_url, song)?;
        let page = self.fetcher.fetch_page(&url).await?;
        if is_valid_song_page(&page) {
            return Ok(page);
        }

        let Some(search) = &self.search else {
            warn!("Failed to look up {song}, and search is not configured");
            return Err(LookupError::NotFound(song.clone()));
        };
        warn!("Failed to look up {song}, trying search");
        match find_song_page(
            &self.fetcher,
            search,
            &self.search_site,
            song,
            self.search_cooldown,
        )
        .await
        {
            Ok(Some((_, page))) => Ok(page),
            Ok(None) => Err(LookupError::NotFound(song.clone())),
            Err(error) => Err(LookupError::Search {
                song: song.clone(),
                error,
            }),
        }
    }
}

impl<F: PageFetcher, S: SearchEngine> RatingSource for WikiLookup<F, S> {
    async fn ratings(&self, song: &SongName) -> Result<Ratings, LookupError> {
        let page = self.song_page(song).await?;
        let table =
            parse_game_table(&page, song).ok_or_else(|| LookupError::NoData(song.clone()))?;
        info!("Reducing {} editions in {} mode", table.len(), self.mode);
        reduce(&table, self.mode).ok_or_else(|| LookupError::NoData(song.clone()))
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ManualRatingsError {
    #[error("Expected 8 or 9 comma-separated ratings, got {0}")]
    WrongCount(usize),
}

/// Ratings given on the command line, used for every chart instead of a lookup.
///
/// Eight values leave the single beginner chart untouched.
#[derive(Clone, Copy, PartialEq, Eq, Debug, derive_more::Display)]
pub struct ManualRatings(Ratings);

impl FromStr for ManualRatings {
    type Err = ManualRatingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut values = s.split(',').map(str::trim).map(parse_manual).collect::<Vec<_>>();
        match values.len() {
            9 => {}
            8 => values.insert(0, None),
            n => return Err(ManualRatingsError::WrongCount(n)),
        }
        DifficultySet::from_row(&values)
            .map(Self)
            .ok_or(ManualRatingsError::WrongCount(values.len()))
    }
}

fn parse_manual(value: &str) -> Option<Rating> {
    match value.parse() {
        Ok(rating) => Some(rating),
        Err(e) => {
            warn!("Ignoring manual rating {value:?}: {e}");
            None
        }
    }
}

impl ManualRatings {
    pub fn get(&self, slot: Slot) -> Option<Rating> {
        self.0[slot]
    }
}

impl RatingSource for ManualRatings {
    async fn ratings(&self, _song: &SongName) -> Result<Ratings, LookupError> {
        Ok(self.0)
    }
}
