//! Dance With Intensity `.dwi` charts: `#SINGLE:BASIC:7:<steps>;`

use ddr_rating_scraping_utils::regex;
use log::trace;
use strum::EnumString;

use crate::difficulty::{Difficulty, Slot, Style};

use super::Candidate;

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DwiDifficulty {
    Beginner,
    Basic,
    Another,
    Maniac,
    Smaniac,
}

impl From<DwiDifficulty> for Difficulty {
    fn from(difficulty: DwiDifficulty) -> Self {
        match difficulty {
            DwiDifficulty::Beginner => Difficulty::Beginner,
            DwiDifficulty::Basic => Difficulty::Easy,
            DwiDifficulty::Another => Difficulty::Medium,
            DwiDifficulty::Maniac => Difficulty::Hard,
            DwiDifficulty::Smaniac => Difficulty::Challenge,
        }
    }
}

pub fn candidates(lines: &[String]) -> Vec<Candidate> {
    let mut ret = vec![];
    for (i, line) in lines.iter().enumerate() {
        let Some(captures) =
            regex!(r"^\s*#(?P<style>SINGLE|DOUBLE):(?P<difficulty>[^:]*):(?P<rating>[^:]*):")
                .captures(line)
        else {
            continue;
        };
        let (Some(style), Some(difficulty), Some(rating)) = (
            captures.name("style"),
            captures.name("difficulty"),
            captures.name("rating"),
        ) else {
            continue;
        };
        let style = style.as_str().to_lowercase();
        let dwi_difficulty = difficulty.as_str().parse::<DwiDifficulty>().ok();
        if dwi_difficulty.is_none() {
            trace!("Unknown DWI difficulty {:?}", difficulty.as_str());
        }
        let slot = dwi_difficulty
            .zip(style.parse::<Style>().ok())
            .and_then(|(difficulty, style)| Slot::new(style, difficulty.into()));
        ret.push(Candidate {
            line: i,
            span: rating.range(),
            difficulty: dwi_difficulty.map_or_else(
                || difficulty.as_str().to_owned(),
                |d| Difficulty::from(d).to_string(),
            ),
            style,
            slot,
        });
    }
    ret
}
