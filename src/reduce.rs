use log::{debug, info};

use crate::{
    difficulty::{Rating, RatingMode, Ratings},
    wiki::parser::GameTable,
};

/// Releases that rate on the modern (1-19) scale.
const MODERN_TITLES: [&str; 8] = [
    "DanceDanceRevolution X",
    "DanceDanceRevolution X2",
    "DanceDanceRevolution X3 VS 2ndMIX",
    "DanceDanceRevolution (2013)",
    "DanceDanceRevolution (2014)",
    "DanceDanceRevolution A",
    "DanceDanceRevolution A20",
    "DanceDanceRevolution A20 PLUS",
];

/// Collapses every edition of a song into one rating per chart.
///
/// Returns `None` for an empty table.
pub fn reduce(table: &GameTable, mode: RatingMode) -> Option<Ratings> {
    if table.is_empty() {
        return None;
    }
    Some(match mode {
        RatingMode::Legacy => legacy_ratings(table),
        RatingMode::Modern => modern_ratings(table),
    })
}

/// Lowest numeric rating per chart.
pub fn legacy_ratings(table: &GameTable) -> Ratings {
    fold_ratings(table, Rating::min)
}

/// Highest numeric rating per chart, scaled up if no edition uses the modern scale.
pub fn modern_ratings(table: &GameTable) -> Ratings {
    let ratings = fold_ratings(table, Rating::max);
    if has_modern_title(table) {
        ratings
    } else {
        info!("No modern ratings, scaling by 1.5x");
        ratings.map(|_, rating| rating.map(Rating::scale_up))
    }
}

fn fold_ratings(table: &GameTable, pick: fn(Rating, Rating) -> Rating) -> Ratings {
    let mut result = Ratings::default();
    for entry in table.entries() {
        for (slot, cell) in entry.ratings().iter() {
            if let Some(candidate) = cell.rating() {
                result[slot] =
                    Some(result[slot].map_or(candidate, |current| pick(current, candidate)));
            }
        }
    }
    result
}

fn has_modern_title(table: &GameTable) -> bool {
    let found = table
        .editions()
        .find(|edition| MODERN_TITLES.iter().any(|title| edition.as_str().contains(title)));
    if let Some(edition) = found {
        debug!("Found modern game: {edition}");
    }
    found.is_some()
}
