//! Line-oriented scraping of the "Difficulty & Notecounts" table of a song page.
//!
//! The wiki renders one table row per game edition: a plain `<td>` cell with the
//! edition name followed by nine styled cells with the ratings (single
//! beginner to challenge, then double easy to challenge).  Pages for songs that
//! also have a separate "original" chart list them in another section with the
//! same layout, so rows are committed selectively.

use derive_more::{AsRef, Display, From};
use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use log::{debug, trace};

use crate::difficulty::{DifficultySet, RawRating, Slot};

use super::SongName;

const TABLE_PHRASE: &str = "Difficulty &amp; Notecounts";
const ORIGINALS_PHRASE: &str = "Original Charts";
const HEADING_SPAN: &str = r#"<span class="mw-headline""#;

/// Editions whose rows never count, even if they look like DDR rows.
const IGNORED_GAMES: [&str; 9] = [
    "Notecounts",
    "beatmania",
    "Dancing Stage",
    "PC",
    "S+",
    "pop'n",
    "GB",
    "DANCE WARS",
    "Solo",
];
const RELEVANT_GAMES: [&str; 3] = ["DDRMAX", "DanceDanceRevolution", "DDR"];

/// Rows with at most this many rated cells are treated as challenge-only.
const CHALLENGE_ONLY_MAX_RATED: usize = 3;

#[derive(Clone, PartialEq, Eq, Hash, Debug, From, AsRef, Display)]
#[as_ref(forward)]
pub struct EditionName(String);

impl From<&str> for EditionName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl EditionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn is_present(&self) -> bool {
        self.0.to_lowercase().contains("present")
    }
    fn is_relevant(&self) -> bool {
        RELEVANT_GAMES.iter().any(|game| self.0.contains(game))
    }
    fn is_ignored(&self) -> bool {
        IGNORED_GAMES.iter().any(|game| self.0.contains(game))
    }
}

/// Heading (`<h4>`) of the chart section a row belongs to, e.g. `ANOTHER MIX`.
#[derive(Clone, Default, PartialEq, Eq, Debug, From, AsRef, Display)]
#[as_ref(forward)]
pub struct ChartLabel(String);

impl From<&str> for ChartLabel {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl ChartLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// Whether the song title mentions this chart section.
    pub fn matches(&self, song: &SongName) -> bool {
        song.as_str().contains(self.0.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters)]
pub struct GameEntry {
    #[getset(get = "pub")]
    edition: EditionName,
    #[getset(get = "pub")]
    chart: ChartLabel,
    #[getset(get = "pub")]
    ratings: DifficultySet<RawRating>,
    #[getset(get_copy = "pub")]
    present: bool,
    #[getset(get_copy = "pub")]
    special: bool,
}

impl GameEntry {
    pub fn new(edition: EditionName, chart: ChartLabel, ratings: DifficultySet<RawRating>) -> Self {
        Self {
            present: edition.is_present(),
            edition,
            chart,
            ratings,
            special: false,
        }
    }

    /// Builds an entry from nine cells in [`Slot`] order.
    pub fn from_cells(edition: &str, chart: &str, cells: [&str; 9]) -> Self {
        let ratings = DifficultySet::from_fn(|slot: Slot| {
            RawRating::from(cells[enum_map::Enum::into_usize(slot)])
        });
        Self::new(edition.into(), chart.into(), ratings)
    }
}

/// Rows of one song page keyed by edition, in page order.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct GameTable(IndexMap<EditionName, GameEntry>);

impl GameTable {
    pub fn insert(&mut self, entry: GameEntry) {
        self.0.insert(entry.edition.clone(), entry);
    }
    pub fn retain(&mut self, mut keep: impl FnMut(&GameEntry) -> bool) {
        self.0.retain(|_, entry| keep(entry));
    }
    pub fn get(&self, edition: &str) -> Option<&GameEntry> {
        self.0.get(&EditionName::from(edition))
    }
    pub fn entries(&self) -> impl Iterator<Item = &GameEntry> {
        self.0.values()
    }
    pub fn editions(&self) -> impl Iterator<Item = &EditionName> {
        self.0.keys()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<GameEntry> for GameTable {
    fn from_iter<I: IntoIterator<Item = GameEntry>>(iter: I) -> Self {
        let mut table = Self::default();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// State of a single forward pass over a song page.
#[derive(Debug)]
pub struct TableScanner<'s> {
    song: &'s SongName,
    in_table: bool,
    has_originals: bool,
    chart: ChartLabel,
    edition: Option<EditionName>,
    cells: Vec<RawRating>,
    present_seen: bool,
    special_seen: bool,
    table: GameTable,
}

impl<'s> TableScanner<'s> {
    pub fn new(song: &'s SongName) -> Self {
        Self {
            song,
            in_table: false,
            has_originals: false,
            chart: ChartLabel::default(),
            edition: None,
            cells: vec![],
            present_seen: false,
            special_seen: false,
            table: GameTable::default(),
        }
    }

    pub fn feed(&mut self, line: &str) {
        let line = normalize_arrows(line);

        if line.contains(TABLE_PHRASE) {
            self.in_table = true;
        } else if line.contains(ORIGINALS_PHRASE) {
            self.has_originals = true;
        }
        if !self.in_table {
            return;
        }

        if let Some(chart) = parse_chart_heading(&line) {
            trace!("Chart section: {chart:?}");
            self.chart = chart;
        }

        if let Some(name) = parse_edition_cell(&line) {
            self.cells.clear();
            self.edition = Some(EditionName::from(name)).filter(|e| !e.is_ignored());
        }

        let Some(edition) = self.edition.as_ref().filter(|e| e.is_relevant()) else {
            return;
        };
        let Some(cell) = parse_rating_cell(&line) else {
            return;
        };
        if edition.is_present() {
            self.present_seen = true;
        }
        self.cells.push(cell);

        let Some(ratings) = DifficultySet::from_row(&self.cells) else {
            return;
        };
        let rated = self.cells.iter().filter(|c| c.is_rated()).count();
        let mut entry = GameEntry::new(edition.clone(), self.chart.clone(), ratings);
        if rated > CHALLENGE_ONLY_MAX_RATED || !self.has_originals {
            self.table.insert(entry);
        } else if self.chart.matches(self.song) {
            // A challenge-only row is still the right one when the song itself
            // is the "original" release the section is named after.
            entry.special = true;
            self.special_seen = true;
            self.table.insert(entry);
        }
    }

    /// Applies the special-chart and present-edition filters.
    ///
    /// Returns `None` if no row survives.
    pub fn finish(self) -> Option<GameTable> {
        let Self {
            song,
            present_seen,
            special_seen,
            mut table,
            ..
        } = self;
        if table.is_empty() {
            return None;
        }
        if special_seen {
            debug!("{song} is a special chart");
            table.retain(|entry| entry.chart.matches(song));
        }
        if present_seen {
            debug!("{song} has a present chart");
            table.retain(|entry| entry.edition.is_present());
        }
        (!table.is_empty()).then_some(table)
    }
}

/// Collects the DDR rows of a song page.
pub fn parse_game_table(page: &str, song: &SongName) -> Option<GameTable> {
    let mut scanner = TableScanner::new(song);
    for line in page.split('\n') {
        scanner.feed(line);
    }
    scanner.finish()
}

fn normalize_arrows(line: &str) -> String {
    line.replace("&#8594;", "->")
        .replace("&#8593;", "")
        .replace("&#8595;", "")
}

/// `<h4><span class="mw-headline" id="X">ANOTHER MIX</span></h4>`
fn parse_chart_heading(line: &str) -> Option<ChartLabel> {
    if !(line.contains(HEADING_SPAN) && line.contains("<h4>")) {
        return None;
    }
    let before_close = line.split("</span></h4>").next().unwrap_or_default();
    let label = before_close.rsplit('>').next().unwrap_or_default();
    Some(label.replace('"', "").into())
}

/// `<td>DanceDanceRevolution X2</td>`
fn parse_edition_cell(line: &str) -> Option<&str> {
    if !(line.contains("<td>") && line.contains("</td>")) {
        return None;
    }
    let (_, rest) = line.split_once("<td>")?;
    Some(rest.split_once("</td>").map_or(rest, |(name, _)| name))
}

/// `<td style="background:#ff9;"><b>12</b></td>`
fn parse_rating_cell(line: &str) -> Option<RawRating> {
    if !line.starts_with("<td style=") {
        return None;
    }
    let line = line.replace("<b>", "").replace("</b>", "");
    let value = line.split_once(";\">").map_or("", |(_, rest)| rest);
    Some(value.split('<').next().unwrap_or_default().into())
}
