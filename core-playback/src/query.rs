//! # Query Variants
//!
//! Turns a track's metadata into the search strings sent to the lookup
//! service, most specific first:
//!
//! 1. `"{title} {primary artist} Audio"`
//! 2. `"{title} {album} Song"`, only when the album differs from the title
//! 3. `"{title} Song"`
//!
//! Titles lose parenthetical annotations ("(From \"Film\")", "(Remix)") and
//! every character outside `[A-Za-z0-9 ]`. Multi-artist credits are cut down
//! to the first credited artist.

use core_library::models::Track;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn parenthetical_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\([^()]*\)").expect("parenthetical pattern is valid"))
}

fn non_alphanumeric_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^A-Za-z0-9 ]").expect("alphanumeric pattern is valid"))
}

fn artist_separator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i),|&|\bfeat\.|\bft\.|\bwith\b").expect("separator pattern is valid")
    })
}

/// A normalized search string. Whitespace is collapsed and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionQuery(String);

impl ResolutionQuery {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(collapse_whitespace(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolutionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolutionQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `(...)` groups, innermost first, until none are left.
fn strip_parentheticals(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let next = parenthetical_regex().replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Normalize a title for searching. Idempotent.
pub fn clean_title(title: &str) -> String {
    let stripped = strip_parentheticals(title);
    let ascii = non_alphanumeric_regex().replace_all(&stripped, " ");
    collapse_whitespace(&ascii)
}

/// First artist of a credit like `"A, B & C feat. D"`.
pub fn primary_artist(artist: &str) -> String {
    let stripped = strip_parentheticals(artist);
    artist_separator_regex()
        .split(&stripped)
        .next()
        .map(collapse_whitespace)
        .unwrap_or_default()
}

/// Build the ordered query variants for `track`.
///
/// A title that cleans down to nothing yields no queries at all.
pub fn build_queries(track: &Track) -> Vec<ResolutionQuery> {
    let title = clean_title(&track.title);
    if title.is_empty() {
        return Vec::new();
    }

    let artist = primary_artist(&track.artist);
    let mut queries = vec![ResolutionQuery::new(format!("{title} {artist} Audio"))];

    if let Some(album) = track.album.as_deref().map(str::trim) {
        if !album.is_empty() && album != track.title.trim() {
            queries.push(ResolutionQuery::new(format!("{title} {album} Song")));
        }
    }

    queries.push(ResolutionQuery::new(format!("{title} Song")));
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(queries: Vec<ResolutionQuery>) -> Vec<String> {
        queries.into_iter().map(ResolutionQuery::into_string).collect()
    }

    #[test]
    fn test_three_variants_with_album() {
        let track = Track::new(
            "1",
            "Kesariya (From \"Brahmastra\")",
            "Arijit Singh, Pritam & Amitabh Bhattacharya",
        )
        .with_album("Brahmastra");

        assert_eq!(
            strings(build_queries(&track)),
            vec![
                "Kesariya Arijit Singh Audio",
                "Kesariya Brahmastra Song",
                "Kesariya Song",
            ]
        );
    }

    #[test]
    fn test_live_annotation_and_second_artist_dropped() {
        let track = Track::new("1", "Song (Live)", "A, B");
        assert_eq!(build_queries(&track)[0].as_str(), "Song A Audio");
    }

    #[test]
    fn test_album_variant_skipped_when_same_as_title() {
        let track = Track::new("1", "Believer", "Imagine Dragons").with_album("Believer");
        assert_eq!(
            strings(build_queries(&track)),
            vec!["Believer Imagine Dragons Audio", "Believer Song"]
        );

        let blank_album = Track::new("2", "Believer", "Imagine Dragons").with_album("  ");
        assert_eq!(build_queries(&blank_album).len(), 2);
    }

    #[test]
    fn test_title_punctuation_becomes_spaces() {
        assert_eq!(clean_title("Don't Stop Me Now!"), "Don t Stop Me Now");
        assert_eq!(clean_title("  Shape   of You  "), "Shape of You");
        assert_eq!(clean_title("Song (Live) (2019 Remaster)"), "Song");
        assert_eq!(clean_title("Outer (inner (nested)) tail"), "Outer tail");
        // Words between two groups survive
        assert_eq!(clean_title("A (x) B (y)"), "A B");
    }

    #[test]
    fn test_clean_title_is_idempotent() {
        for title in [
            "Tum Hi Ho (From \"Aashiqui 2\")",
            "Ça c'est Paris",
            "((weird)) spacing   here",
            "Unbalanced (paren",
        ] {
            let once = clean_title(title);
            assert_eq!(clean_title(&once), once, "not idempotent for {title:?}");
        }
    }

    #[test]
    fn test_primary_artist_separators() {
        assert_eq!(primary_artist("Arijit Singh, Pritam"), "Arijit Singh");
        assert_eq!(primary_artist("Simon & Garfunkel"), "Simon");
        assert_eq!(primary_artist("Drake feat. Rihanna"), "Drake");
        assert_eq!(primary_artist("Drake FT. Rihanna"), "Drake");
        assert_eq!(primary_artist("Calvin Harris with Dua Lipa"), "Calvin Harris");
        assert_eq!(primary_artist("Bill Withers"), "Bill Withers");
        assert_eq!(primary_artist("Pritam (Composer)"), "Pritam");
        assert_eq!(primary_artist(""), "");
    }

    #[test]
    fn test_empty_title_yields_no_queries() {
        assert!(build_queries(&Track::new("1", "", "Artist")).is_empty());
        assert!(build_queries(&Track::new("2", "(Intro)", "Artist")).is_empty());
    }

    #[test]
    fn test_missing_artist_still_builds() {
        let track = Track::new("1", "Lullaby", "");
        assert_eq!(
            strings(build_queries(&track)),
            vec!["Lullaby Audio", "Lullaby Song"]
        );
    }

    #[test]
    fn test_queries_are_deterministic() {
        let track = Track::new("1", "Levitating", "Dua Lipa feat. DaBaby").with_album("Future Nostalgia");
        assert_eq!(build_queries(&track), build_queries(&track));
    }

    #[test]
    fn test_query_normalizes_whitespace() {
        let query = ResolutionQuery::new("  a   b  ");
        assert_eq!(query.as_str(), "a b");
        assert_eq!(query.to_string(), "a b");
    }
}
