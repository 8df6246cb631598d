use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::Context;
use itertools::Itertools;
use joinery::JoinableIterator;
use log::{error, info};
use walkdir::WalkDir;

use crate::{
    chart::{rewrite_chart, Dialect, RewriteOutcome},
    lookup::RatingSource,
    wiki::SongName,
};

const RULE: &str = "------------------------------------";

pub fn is_chart_file(path: &Path) -> bool {
    Dialect::from_path(path).is_some()
}

/// Every chart file under `root`, sorted by the path string rather than by component.
pub fn collect_chart_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut ret = vec![];
    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("While walking {root:?}"))?;
        if entry.file_type().is_file() && is_chart_file(entry.path()) {
            ret.push(entry.into_path());
        }
    }
    Ok(ret
        .into_iter()
        .sorted_by(|a, b| a.as_os_str().cmp(b.as_os_str()))
        .collect())
}

/// Looks up the song of one chart and writes the new ratings into it.
pub async fn update_chart(
    path: &Path,
    source: &impl RatingSource,
) -> anyhow::Result<RewriteOutcome> {
    let song = SongName::from_chart_path(path)
        .with_context(|| format!("Cannot tell the song name of {path:?}"))?;
    let ratings = source
        .ratings(&song)
        .await
        .with_context(|| format!("Failed to update {song}"))?;
    info!("New ratings of {song}: {ratings}");
    let outcome = rewrite_chart(path, &ratings)?;
    outcome.print();
    println!("Updated {song} successfully");
    Ok(outcome)
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BatchSummary {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn print(&self) {
        println!("{self}");
    }
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "|             SUMMARY              |")?;
        writeln!(f, "{RULE}")?;
        for (label, names) in [
            ("Successfully updated", &self.updated),
            ("Failed to update", &self.failed),
        ] {
            writeln!(f, "{label} {} item(s):", names.len())?;
            for name in names {
                writeln!(f, "--> {name}")?;
            }
            writeln!(f, "{RULE}")?;
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}

/// Updates `root` itself if it is a chart file, otherwise every chart below it.
///
/// A chart that fails is recorded in the summary; the others are still processed.
pub async fn run(root: &Path, source: &impl RatingSource) -> anyhow::Result<BatchSummary> {
    let files = if is_chart_file(root) {
        vec![root.to_owned()]
    } else {
        collect_chart_files(root)?
    };
    info!(
        "Updating {} chart(s): {}",
        files.len(),
        files.iter().map(|path| file_name(path)).join_with(", ")
    );

    let mut summary = BatchSummary::default();
    for path in files {
        println!("Updating {}", path.display());
        match update_chart(&path, source).await {
            Ok(_) => summary.updated.push(file_name(&path)),
            Err(e) => {
                error!("{e:#}");
                summary.failed.push(file_name(&path));
            }
        }
        println!("{RULE}");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path};

    use tempfile::tempdir;

    use crate::{
        difficulty::{Rating, Ratings, Slot},
        lookup::{LookupError, RatingSource},
        wiki::SongName,
    };

    use super::{collect_chart_files, run, BatchSummary};

    #[derive(Default)]
    struct FakeSource(HashMap<String, Ratings>);

    impl FakeSource {
        fn with(mut self, song: &str, slot: Slot, rating: u32) -> Self {
            self.0.entry(song.to_owned()).or_default()[slot] = Some(Rating::from(rating));
            self
        }
    }

    impl RatingSource for FakeSource {
        async fn ratings(&self, song: &SongName) -> Result<Ratings, LookupError> {
            self.0
                .get(song.as_str())
                .copied()
                .ok_or_else(|| LookupError::NotFound(song.clone()))
        }
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs_err::create_dir_all(path.parent().unwrap()).unwrap();
        fs_err::write(path, contents).unwrap();
    }

    const SM: &str = "#NOTES:\n     dance-single:\n     :\n     Hard:\n     8:\n";
    const DWI: &str = "#SINGLE:MANIAC:8:00000000;\n";

    #[test]
    fn test_collect_chart_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "b/Song B.dwi", DWI);
        write(dir.path(), "a/Song A.sm", SM);
        write(dir.path(), "a/Song A.ogg", "");
        write(dir.path(), "a/banner.png", "");
        write(dir.path(), "c/Song C.SM", SM);
        write(dir.path(), "c (dwi)/Song C.dwi", DWI);
        let files = collect_chart_files(dir.path()).unwrap();
        let relative = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            relative,
            [
                Path::new("a/Song A.sm"),
                Path::new("b/Song B.dwi"),
                Path::new("c (dwi)/Song C.dwi"),
                Path::new("c/Song C.SM"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Song A/Song A.sm", SM);
        write(dir.path(), "Song B/Song B.dwi", DWI);
        write(dir.path(), "Unknown/Unknown.sm", SM);
        write(dir.path(), "Unknown/readme.txt", "hello");
        let source = FakeSource::default()
            .with("Song A", Slot::SingleHard, 12)
            .with("Song B", Slot::SingleHard, 13);

        let summary = run(dir.path(), &source).await.unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                updated: vec!["Song A.sm".to_owned(), "Song B.dwi".to_owned()],
                failed: vec!["Unknown.sm".to_owned()],
            }
        );
        assert_eq!(
            fs_err::read_to_string(dir.path().join("Song A/Song A.sm")).unwrap(),
            SM.replace("8:", "12:")
        );
        assert_eq!(
            fs_err::read_to_string(dir.path().join("Song B/Song B.dwi")).unwrap(),
            "#SINGLE:MANIAC:13:00000000;\n"
        );
        assert_eq!(
            fs_err::read_to_string(dir.path().join("Unknown/Unknown.sm")).unwrap(),
            SM
        );
    }

    #[tokio::test]
    async fn test_single_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Song A.sm", SM);
        let source = FakeSource::default().with("Song A", Slot::SingleHard, 9);
        let summary = run(&dir.path().join("Song A.sm"), &source).await.unwrap();
        assert_eq!(summary.updated, ["Song A.sm"]);
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn test_summary_text() {
        let summary = BatchSummary {
            updated: vec!["a.sm".to_owned(), "b.dwi".to_owned()],
            failed: vec!["c.sm".to_owned()],
        };
        let text = summary.to_string();
        assert!(text.contains("Successfully updated 2 item(s):\n--> a.sm\n--> b.dwi\n"));
        assert!(text.contains("Failed to update 1 item(s):\n--> c.sm\n"));
    }
}
