use std::{
    fmt::Display,
    num::ParseIntError,
    ops::{Index, IndexMut},
    str::FromStr,
};

use derive_more::{AsRef, From, Into};
use enum_iterator::Sequence;
use enum_map::{Enum, EnumMap};
use strum::EnumString;
use thiserror::Error;

/// Play style of a chart.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Style {
    Single,
    Double,
}

/// Difficulty names as they appear in `.sm` files.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, EnumString, strum::Display)]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Challenge,
}

/// One of the nine rated charts of a song, in the column order of the wiki table.
///
/// Double play has no beginner chart, so there is no `DoubleBeginner`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Sequence, Enum)]
pub enum Slot {
    SingleBeginner,
    SingleEasy,
    SingleMedium,
    SingleHard,
    SingleChallenge,
    DoubleEasy,
    DoubleMedium,
    DoubleHard,
    DoubleChallenge,
}
impl Slot {
    pub fn new(style: Style, difficulty: Difficulty) -> Option<Self> {
        enum_iterator::all::<Slot>()
            .find(|slot| slot.style() == style && slot.difficulty() == difficulty)
    }
    pub fn style(self) -> Style {
        use Slot::*;
        match self {
            SingleBeginner | SingleEasy | SingleMedium | SingleHard | SingleChallenge => {
                Style::Single
            }
            DoubleEasy | DoubleMedium | DoubleHard | DoubleChallenge => Style::Double,
        }
    }
    pub fn difficulty(self) -> Difficulty {
        use Slot::*;
        match self {
            SingleBeginner => Difficulty::Beginner,
            SingleEasy | DoubleEasy => Difficulty::Easy,
            SingleMedium | DoubleMedium => Difficulty::Medium,
            SingleHard | DoubleHard => Difficulty::Hard,
            SingleChallenge | DoubleChallenge => Difficulty::Challenge,
        }
    }
}

/// A numeric difficulty rating ("foot" count).
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    From,
    Into,
    derive_more::Display,
)]
pub struct Rating(u32);

impl Rating {
    /// Converts an old-scale rating to the modern scale (x1.5, truncated).
    pub fn scale_up(self) -> Self {
        Self(self.0.saturating_add(self.0 / 2))
    }
}

#[derive(PartialEq, Eq, Debug, Error)]
pub enum RatingParseError {
    #[error("Rating is not a plain number: {0:?}")]
    NotNumeric(String),
    #[error("Rating is too large: {0}")]
    TooLarge(#[from] ParseIntError),
}

impl FromStr for Rating {
    type Err = RatingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `u32::from_str` would also take a leading `+`
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RatingParseError::NotNumeric(s.to_owned()));
        }
        Ok(Self(s.parse()?))
    }
}

/// Cell text from a wiki difficulty table, kept as-is.
///
/// Cells may hold `-` for a missing chart, or things like `8->10` for a re-rated one.
#[derive(Clone, Default, PartialEq, Eq, Debug, From, AsRef, derive_more::Display)]
#[as_ref(forward)]
pub struct RawRating(String);

impl From<&str> for RawRating {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl RawRating {
    pub fn rating(&self) -> Option<Rating> {
        self.0.parse().ok()
    }
    /// Whether the cell names a chart at all (anything except a lone `-`).
    pub fn is_rated(&self) -> bool {
        self.0 != "-"
    }
}

/// A value for every [`Slot`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct DifficultySet<V>(EnumMap<Slot, V>);

/// Ratings to be written into a chart file.
pub type Ratings = DifficultySet<Option<Rating>>;

impl<V> DifficultySet<V> {
    pub fn from_fn(f: impl FnMut(Slot) -> V) -> Self {
        Self(EnumMap::from_fn(f))
    }
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &V)> {
        self.0.iter()
    }
    pub fn map<U>(self, mut f: impl FnMut(Slot, V) -> U) -> DifficultySet<U> {
        DifficultySet(self.0.map(|slot, v| f(slot, v)))
    }
}

impl<V: Clone> DifficultySet<V> {
    /// Builds a set from a table row; the first nine values are used in [`Slot`] order.
    pub fn from_row(row: &[V]) -> Option<Self> {
        (row.len() >= Slot::LENGTH)
            .then(|| Self::from_fn(|slot: Slot| row[slot.into_usize()].clone()))
    }
}

impl<V> Index<Slot> for DifficultySet<V> {
    type Output = V;
    fn index(&self, slot: Slot) -> &V {
        &self.0[slot]
    }
}
impl<V> IndexMut<Slot> for DifficultySet<V> {
    fn index_mut(&mut self, slot: Slot) -> &mut V {
        &mut self.0[slot]
    }
}

impl Display for Ratings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (_, rating)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match rating {
                Some(rating) => write!(f, "{rating}")?,
                None => f.write_str("-")?,
            }
        }
        Ok(())
    }
}

/// Which of the historical ratings to keep.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RatingMode {
    /// Lowest rating ever assigned
    Legacy,
    /// Highest rating, converted to the modern scale if the song never got one
    #[default]
    Modern,
}
