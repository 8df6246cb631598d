//! Rewriting the difficulty ratings stored in chart files.

pub mod dwi;
pub mod sm;

use std::{fmt::Display, ops::Range, path::Path};

use anyhow::{bail, Context};
use log::{debug, info};
use strum::EnumString;

use crate::difficulty::{Rating, Ratings, Slot};

/// Chart file format, decided once per file from its extension.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Dialect {
    /// StepMania: `#NOTES:` blocks with one field per line.
    Sm,
    /// Dance With Intensity: one `#STYLE:DIFFICULTY:RATING:...` line per chart.
    Dwi,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

/// A rating field found by a dialect scanner.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Candidate {
    pub line: usize,
    /// Byte range of the rating text within the line.
    pub span: Range<usize>,
    pub style: String,
    pub difficulty: String,
    pub slot: Option<Slot>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum SkipReason {
    #[strum(serialize = "no rating for this chart")]
    NoSlot,
    #[strum(serialize = "rating unknown")]
    Unrated,
    #[strum(serialize = "rating below 1")]
    BelowOne,
}

/// The rating to write for a slot, or why the existing one stays.
pub fn replacement_for(ratings: &Ratings, slot: Option<Slot>) -> Result<Rating, SkipReason> {
    let slot = slot.ok_or(SkipReason::NoSlot)?;
    let rating = ratings[slot].ok_or(SkipReason::Unrated)?;
    if rating < Rating::from(1) {
        return Err(SkipReason::BelowOne);
    }
    Ok(rating)
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Substitution {
    Replaced {
        style: String,
        difficulty: String,
        old: String,
        new: Rating,
    },
    Skipped {
        style: String,
        difficulty: String,
        old: String,
        reason: SkipReason,
    },
}

impl Substitution {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Substitution::Replaced { .. })
    }
}

impl Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Substitution::Replaced {
                style,
                difficulty,
                old,
                new,
            } => write!(f, "{style} | {difficulty:10} | {old}-->{new}"),
            Substitution::Skipped {
                style,
                difficulty,
                old,
                ..
            } => write!(f, "{style} | {difficulty:10} | {old} (skipped)"),
        }
    }
}

/// What happened to one chart file.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RewriteOutcome {
    pub substitutions: Vec<Substitution>,
    /// Whether the file contents differ from before.
    pub changed: bool,
}

impl RewriteOutcome {
    pub fn print(&self) {
        println!("Style  | Difficulty | Rating Change");
        println!("-------|------------|-------------");
        for substitution in &self.substitutions {
            println!("{substitution}");
        }
    }
}

/// Raw lines of a chart file, each with its original line terminator.
///
/// Charts are not required to be UTF-8; only the rating fields are ever touched.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChartFile {
    dialect: Dialect,
    lines: Vec<Vec<u8>>,
}

impl ChartFile {
    pub fn new(dialect: Dialect, bytes: impl AsRef<[u8]>) -> Self {
        Self {
            dialect,
            lines: bytes
                .as_ref()
                .split_inclusive(|&b| b == b'\n')
                .map(<[u8]>::to_vec)
                .collect(),
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lines.concat()
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        let lines = self.lines.iter().map(|line| scan_text(line)).collect::<Vec<_>>();
        match self.dialect {
            Dialect::Sm => sm::candidates(&lines),
            Dialect::Dwi => dwi::candidates(&lines),
        }
    }

    /// Substitutes every rating field that has a usable replacement.
    pub fn apply(&mut self, ratings: &Ratings) -> Vec<Substitution> {
        let mut substitutions = vec![];
        for candidate in self.candidates() {
            let line = &mut self.lines[candidate.line];
            let old = String::from_utf8_lossy(&line[candidate.span.clone()]).into_owned();
            let Candidate {
                style,
                difficulty,
                slot,
                span,
                ..
            } = candidate;
            match replacement_for(ratings, slot) {
                Ok(new) => {
                    *line = [
                        &line[..span.start],
                        new.to_string().as_bytes(),
                        &line[span.end..],
                    ]
                    .concat();
                    substitutions.push(Substitution::Replaced {
                        style,
                        difficulty,
                        old,
                        new,
                    });
                }
                Err(reason) => {
                    debug!("Skipping {style} {difficulty} ({old}): {reason}");
                    substitutions.push(Substitution::Skipped {
                        style,
                        difficulty,
                        old,
                        reason,
                    });
                }
            }
        }
        substitutions
    }
}

/// Text of a raw line for the scanners.  Each byte of an invalid UTF-8 sequence
/// becomes one `?`, so byte offsets into the text are also offsets into the line.
fn scan_text(line: &[u8]) -> String {
    let mut ret = String::with_capacity(line.len());
    for chunk in line.utf8_chunks() {
        ret.push_str(chunk.valid());
        ret.extend(std::iter::repeat('?').take(chunk.invalid().len()));
    }
    ret
}

/// Reads the chart, substitutes the ratings and writes it back if anything changed.
pub fn rewrite_chart(path: &Path, ratings: &Ratings) -> anyhow::Result<RewriteOutcome> {
    let Some(dialect) = Dialect::from_path(path) else {
        bail!("{path:?} is not a chart file");
    };
    let original = fs_err::read(path)?;
    let mut chart = ChartFile::new(dialect, &original);
    let substitutions = chart.apply(ratings);
    let contents = chart.contents();
    let changed = contents != original;
    if changed {
        fs_err::write(path, contents).with_context(|| format!("While rewriting {path:?}"))?;
        info!("Wrote {path:?}");
    } else {
        info!("{path:?} is already up to date");
    }
    Ok(RewriteOutcome {
        substitutions,
        changed,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use crate::difficulty::{Rating, Ratings, Slot};

    use super::{
        replacement_for, rewrite_chart, scan_text, ChartFile, Dialect, SkipReason, Substitution,
    };

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("a/B4U.sm")), Some(Dialect::Sm));
        assert_eq!(Dialect::from_path(Path::new("a/B4U.SM")), Some(Dialect::Sm));
        assert_eq!(Dialect::from_path(Path::new("B4U.dwi")), Some(Dialect::Dwi));
        assert_eq!(Dialect::from_path(Path::new("B4U.ssc")), None);
        assert_eq!(Dialect::from_path(Path::new("sm")), None);
    }

    #[test]
    fn test_replacement_for() {
        let mut ratings = Ratings::default();
        ratings[Slot::SingleHard] = Some(Rating::from(9));
        ratings[Slot::SingleEasy] = Some(Rating::from(0));
        assert_eq!(
            replacement_for(&ratings, Some(Slot::SingleHard)),
            Ok(Rating::from(9))
        );
        assert_eq!(
            replacement_for(&ratings, Some(Slot::SingleEasy)),
            Err(SkipReason::BelowOne)
        );
        assert_eq!(
            replacement_for(&ratings, Some(Slot::DoubleHard)),
            Err(SkipReason::Unrated)
        );
        assert_eq!(replacement_for(&ratings, None), Err(SkipReason::NoSlot));
    }

    #[test]
    fn test_substitution_rows() {
        let replaced = Substitution::Replaced {
            style: "single".into(),
            difficulty: "Hard".into(),
            old: "7".into(),
            new: Rating::from(10),
        };
        assert_eq!(replaced.to_string(), "single | Hard       | 7-->10");
        let skipped = Substitution::Skipped {
            style: "double".into(),
            difficulty: "Challenge".into(),
            old: "9".into(),
            reason: SkipReason::Unrated,
        };
        assert_eq!(skipped.to_string(), "double | Challenge  | 9 (skipped)");
    }

    #[test]
    fn test_rewrite_dwi_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("PARANOiA.dwi");
        let original = "#TITLE:PARANOiA;\r\n\
                        #SINGLE:BASIC:7:0000240000002400;\r\n\
                        #SINGLE:MANIAC:8:2468246824682468;\r\n\
                        #DOUBLE:SMANIAC:9:00000000;\r\n";
        fs_err::write(&path, original).unwrap();

        let mut ratings = Ratings::default();
        ratings[Slot::SingleEasy] = Some(Rating::from(9));
        ratings[Slot::SingleHard] = Some(Rating::from(0));
        let outcome = rewrite_chart(&path, &ratings).unwrap();
        assert!(outcome.changed);
        assert_eq!(
            fs_err::read_to_string(&path).unwrap(),
            "#TITLE:PARANOiA;\r\n\
             #SINGLE:BASIC:9:0000240000002400;\r\n\
             #SINGLE:MANIAC:8:2468246824682468;\r\n\
             #DOUBLE:SMANIAC:9:00000000;\r\n"
        );
        assert_eq!(
            outcome
                .substitutions
                .iter()
                .filter(|s| s.is_replaced())
                .count(),
            1
        );
        assert_eq!(outcome.substitutions.len(), 3);

        // Nothing left to change the second time
        let outcome = rewrite_chart(&path, &ratings).unwrap();
        assert!(!outcome.changed);
    }

    #[test]
    fn test_scan_text_keeps_offsets() {
        assert_eq!(scan_text(b"#TITLE:Caf\xe9;\n"), "#TITLE:Caf?;\n");
        assert_eq!(scan_text(b"\xe3\x81\x82:\xff\xfe:7"), "\u{3042}:??:7");
        assert_eq!(scan_text(b"\xe3\x81\x82:\xff\xfe:7").len(), 8);
    }

    #[test]
    fn test_non_utf8_chart_is_rewritten_byte_for_byte() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Caf\u{e9}.dwi");
        let original: &[u8] = b"#TITLE:Caf\xe9;\r\n#ARTIST:\x83e\x83X\x83g;\r\n\
                                #SINGLE:MANIAC:8:\xe9\xe9;\r\n";
        fs_err::write(&path, original).unwrap();

        let mut ratings = Ratings::default();
        ratings[Slot::SingleHard] = Some(Rating::from(11));
        let outcome = rewrite_chart(&path, &ratings).unwrap();
        assert!(outcome.changed);
        assert_eq!(
            fs_err::read(&path).unwrap(),
            b"#TITLE:Caf\xe9;\r\n#ARTIST:\x83e\x83X\x83g;\r\n\
              #SINGLE:MANIAC:11:\xe9\xe9;\r\n"
        );
    }

    #[test]
    fn test_invalid_bytes_around_the_meter() {
        let text: &[u8] = b"#TITLE:\x83e\x83X\x83g;\n#NOTES:\n  dance-single:\n  \xff:\n  Hard:\n  8:\n";
        let mut chart = ChartFile::new(Dialect::Sm, text);
        let mut ratings = Ratings::default();
        ratings[Slot::SingleHard] = Some(Rating::from(12));
        let substitutions = chart.apply(&ratings);
        assert_eq!(substitutions.len(), 1);
        assert_eq!(
            chart.contents(),
            b"#TITLE:\x83e\x83X\x83g;\n#NOTES:\n  dance-single:\n  \xff:\n  Hard:\n  12:\n"
        );
    }

    #[test]
    fn test_rewrite_rejects_other_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs_err::write(&path, "#SINGLE:BASIC:7:;\n").unwrap();
        assert!(rewrite_chart(&path, &Ratings::default()).is_err());
        assert!(rewrite_chart(&dir.path().join("missing.sm"), &Ratings::default()).is_err());
    }
}
