//! StepMania `.sm` charts.
//!
//! ```text
//! #NOTES:
//!      dance-single:
//!      :
//!      Hard:
//!      9:
//!      0.5,0.5,0.5,0.5,0.5:
//! ```

use log::trace;

use crate::difficulty::{Difficulty, Slot, Style};

use super::Candidate;

const STYLE_PREFIX: &str = "dance-";

/// Labels that switch the current chart.  `Edit` charts have no rating to take.
const DIFFICULTY_LABELS: [&str; 6] = ["Beginner", "Easy", "Medium", "Hard", "Challenge", "Edit"];

/// Play styles without a counterpart on the wiki.
const UNRATED_STYLES: [&str; 2] = ["couple", "solo"];

#[derive(Default, Debug)]
struct Section {
    style: String,
    difficulty: String,
}

/// Finds the meter field of every `#NOTES` block.
pub fn candidates(lines: &[String]) -> Vec<Candidate> {
    let mut section: Option<Section> = None;
    let mut ret = vec![];
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let field = trimmed.split(':').next().unwrap_or_default();

        if let Some((_, style)) = field.split_once(STYLE_PREFIX) {
            if UNRATED_STYLES.iter().any(|s| style.contains(s)) {
                trace!("Skipping {style} section");
                section = None;
            } else {
                section = Some(Section {
                    style: style.to_owned(),
                    ..Default::default()
                });
            }
            continue;
        }
        let Some(section) = section.as_mut() else {
            continue;
        };
        if DIFFICULTY_LABELS.contains(&field) {
            section.difficulty = field.to_owned();
        } else if is_meter(field) {
            let start = line.len() - line.trim_start().len();
            ret.push(Candidate {
                line: i,
                span: start..start + field.len(),
                style: section.style.clone(),
                difficulty: section.difficulty.clone(),
                slot: slot(&section.style, &section.difficulty),
            });
        }
    }
    ret
}

fn is_meter(field: &str) -> bool {
    (1..=2).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit())
}

fn slot(style: &str, difficulty: &str) -> Option<Slot> {
    let style: Style = style.parse().ok()?;
    let difficulty: Difficulty = difficulty.parse().ok()?;
    Slot::new(style, difficulty)
}
