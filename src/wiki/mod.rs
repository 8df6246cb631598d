pub mod parser;

use std::path::Path;

use derive_more::{AsRef, Display, From};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://remywiki.com/";
pub const DEFAULT_SEARCH_SITE: &str = "remywiki.com";

const NO_TEXT_MARKER: &str = "There is currently no text";
const DIFFICULTY_MARKER: &str = "DanceDanceRevolution difficulty";

/// Song title as used for the wiki lookup, derived from a chart file name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, From, AsRef, Display)]
#[as_ref(forward)]
pub struct SongName(String);

impl From<&str> for SongName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl SongName {
    /// `charts/Max 300.sm` becomes `Max 300`.
    pub fn from_chart_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_string_lossy();
        (!stem.is_empty()).then(|| Self(stem.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wiki title: spaces become underscores, everything else is percent-encoded.
    pub fn page_title(&self) -> String {
        urlencoding::encode(&self.0.replace(' ', "_")).into_owned()
    }
}

pub fn song_page_url(base_url: &Url, song: &SongName) -> Result<Url, url::ParseError> {
    base_url.join(&song.page_title())
}

/// Whether the page exists and carries a DanceDanceRevolution difficulty table.
///
/// Lines are scanned in order and the first marker found decides.
pub fn is_valid_song_page(page: &str) -> bool {
    for line in page.split('\n') {
        if line.contains(NO_TEXT_MARKER) {
            return false;
        } else if line.contains(DIFFICULTY_MARKER) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use url::Url;

    use super::{is_valid_song_page, song_page_url, SongName, DEFAULT_BASE_URL};

    #[test]
    fn test_song_name_from_path() {
        assert_eq!(
            SongName::from_chart_path(Path::new("songs/DDR 5th/B4U.sm")),
            Some("B4U".into())
        );
        assert_eq!(
            SongName::from_chart_path(Path::new("PARANOiA (ANOTHER MIX).dwi")),
            Some("PARANOiA (ANOTHER MIX)".into())
        );
        assert_eq!(
            SongName::from_chart_path(Path::new("a/Dr. Love.sm")),
            Some("Dr. Love".into())
        );
        assert_eq!(SongName::from_chart_path(Path::new("/")), None);
    }

    #[test]
    fn test_song_page_url() {
        let base = Url::parse(DEFAULT_BASE_URL).unwrap();
        let url = |s: &str| song_page_url(&base, &s.into()).unwrap().to_string();
        assert_eq!(url("MAX 300"), "https://remywiki.com/MAX_300");
        assert_eq!(
            url("Don't Stop!"),
            "https://remywiki.com/Don%27t_Stop%21"
        );
        assert_eq!(url("A: B"), "https://remywiki.com/A%3A_B");
    }

    #[test]
    fn test_is_valid_song_page() {
        assert!(is_valid_song_page(
            "<html>\n<h3>DanceDanceRevolution difficulty &amp; Notecounts</h3>\n"
        ));
        assert!(!is_valid_song_page(
            "<p>There is currently no text in this page.</p>\n"
        ));
        assert!(!is_valid_song_page("<p>beatmania IIDX difficulty</p>\n"));
        assert!(!is_valid_song_page(""));
        // first marker wins
        assert!(!is_valid_song_page(
            "There is currently no text\nDanceDanceRevolution difficulty\n"
        ));
        assert!(is_valid_song_page(
            "DanceDanceRevolution difficulty\nThere is currently no text\n"
        ));
    }
}
