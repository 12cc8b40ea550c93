//! Client-side ordering of library listings.
//!
//! Sort keys use the same `field:direction` strings the server accepts in its
//! `sort` query parameter, so one stored value drives both.

use std::cmp::Ordering;
use std::str::FromStr;

use rand::seq::SliceRandom;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::UnknownOption;
use crate::models::MediaItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LibrarySort {
    #[default]
    TitleAsc,
    TitleDesc,
    AddedAtAsc,
    AddedAtDesc,
    YearAsc,
    YearDesc,
    UpdatedAsc,
    UpdatedDesc,
    Random,
}

impl LibrarySort {
    pub const ALL: &[LibrarySort] = &[
        Self::TitleAsc,
        Self::TitleDesc,
        Self::AddedAtAsc,
        Self::AddedAtDesc,
        Self::YearAsc,
        Self::YearDesc,
        Self::UpdatedAsc,
        Self::UpdatedDesc,
        Self::Random,
    ];

    /// Wire form, e.g. `year:desc`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TitleAsc => "title:asc",
            Self::TitleDesc => "title:desc",
            Self::AddedAtAsc => "addedAt:asc",
            Self::AddedAtDesc => "addedAt:desc",
            Self::YearAsc => "year:asc",
            Self::YearDesc => "year:desc",
            Self::UpdatedAsc => "updated:asc",
            Self::UpdatedDesc => "updated:desc",
            Self::Random => "random:desc",
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TitleAsc => "Title (A-Z)",
            Self::TitleDesc => "Title (Z-A)",
            Self::AddedAtAsc => "Date Added (Oldest)",
            Self::AddedAtDesc => "Date Added (Newest)",
            Self::YearAsc => "Year (Oldest)",
            Self::YearDesc => "Year (Newest)",
            Self::UpdatedAsc => "Date Updated (Oldest)",
            Self::UpdatedDesc => "Date Updated (Newest)",
            Self::Random => "Random",
        }
    }

    /// Parse a value read back from storage, falling back to `title:asc`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Self::UpdatedAsc | Self::UpdatedDesc)
    }
}

impl FromStr for LibrarySort {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownOption {
                kind: "sort",
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for LibrarySort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort `items` in place. Every order except `Random` is stable.
pub fn sort_metadata(items: &mut [MediaItem], sort: LibrarySort) {
    match sort {
        LibrarySort::TitleAsc => items.sort_by(|a, b| locale_cmp(&a.title, &b.title)),
        LibrarySort::TitleDesc => items.sort_by(|a, b| locale_cmp(&b.title, &a.title)),
        LibrarySort::AddedAtAsc => {
            items.sort_by(|a, b| a.added_at.to_string().cmp(&b.added_at.to_string()))
        }
        LibrarySort::AddedAtDesc => {
            items.sort_by(|a, b| b.added_at.to_string().cmp(&a.added_at.to_string()))
        }
        LibrarySort::YearAsc => items.sort_by_key(|i| i.year),
        LibrarySort::YearDesc => items.sort_by(|a, b| b.year.cmp(&a.year)),
        LibrarySort::UpdatedAsc => {
            items.sort_by(|a, b| a.updated_at.to_string().cmp(&b.updated_at.to_string()))
        }
        LibrarySort::UpdatedDesc => {
            items.sort_by(|a, b| b.updated_at.to_string().cmp(&a.updated_at.to_string()))
        }
        LibrarySort::Random => items.shuffle(&mut rand::rng()),
    }
}

/// Collation close to a browser's default `localeCompare`.
///
/// Compares base letters first (accents and case ignored), then accents,
/// then case with lowercase ordered before uppercase.
///
/// Base letters compare by code point after NFKD, with no locale tailoring or
/// punctuation weighting. Symbols such as `_` and `~` therefore sort by their
/// ASCII position, and `ß` sorts after `z` instead of beside `ss`.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(&tertiary_key(b)))
}

fn primary_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn secondary_key(s: &str) -> String {
    s.nfkd().flat_map(char::to_lowercase).collect()
}

fn tertiary_key(s: &str) -> String {
    s.nfkd()
        .map(|c| {
            if c.is_lowercase() {
                c.to_uppercase().next().unwrap_or(c)
            } else {
                c.to_lowercase().next().unwrap_or(c)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, title: &str, year: i32) -> MediaItem {
        MediaItem {
            rating_key: key.into(),
            title: title.into(),
            year,
            ..Default::default()
        }
    }

    fn keys(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.rating_key.as_str()).collect()
    }

    #[test]
    fn test_year_desc_is_stable() {
        let mut items = vec![
            item("a", "A", 2001),
            item("b", "B", 2010),
            item("c", "C", 2001),
            item("d", "D", 2010),
        ];
        sort_metadata(&mut items, LibrarySort::YearDesc);
        assert_eq!(keys(&items), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_title_asc_uses_locale_order() {
        let mut items = vec![
            item("1", "zebra", 0),
            item("2", "Émile", 0),
            item("3", "apple", 0),
            item("4", "Banana", 0),
        ];
        sort_metadata(&mut items, LibrarySort::TitleAsc);
        assert_eq!(keys(&items), vec!["3", "4", "2", "1"]);

        sort_metadata(&mut items, LibrarySort::TitleDesc);
        assert_eq!(keys(&items), vec!["1", "2", "4", "3"]);
    }

    #[test]
    fn test_locale_cmp_tie_breaks() {
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
        assert_eq!(locale_cmp("e", "é"), Ordering::Less);
        assert_eq!(locale_cmp("é", "f"), Ordering::Less);
        assert_eq!(locale_cmp("Same", "Same"), Ordering::Equal);
    }

    #[test]
    fn test_added_at_compares_string_forms() {
        let mut items = vec![item("new", "", 0), item("old", "", 0)];
        items[0].added_at = 1_700_000_000;
        items[1].added_at = 1_600_000_000;
        sort_metadata(&mut items, LibrarySort::AddedAtAsc);
        assert_eq!(keys(&items), vec!["old", "new"]);
        sort_metadata(&mut items, LibrarySort::AddedAtDesc);
        assert_eq!(keys(&items), vec!["new", "old"]);
    }

    #[test]
    fn test_random_keeps_items() {
        let mut items: Vec<_> = (0..20).map(|i| item(&i.to_string(), "", i)).collect();
        sort_metadata(&mut items, LibrarySort::Random);
        assert_eq!(items.len(), 20);
        sort_metadata(&mut items, LibrarySort::YearAsc);
        assert_eq!(items[0].year, 0);
        assert_eq!(items[19].year, 19);
    }

    #[test]
    fn test_parse_and_fallback() {
        assert_eq!("year:desc".parse::<LibrarySort>().unwrap(), LibrarySort::YearDesc);
        assert!("year".parse::<LibrarySort>().is_err());
        assert_eq!(LibrarySort::from_stored(Some("bogus")), LibrarySort::TitleAsc);
        assert_eq!(LibrarySort::from_stored(None), LibrarySort::TitleAsc);
        for sort in LibrarySort::ALL {
            assert_eq!(sort.as_str().parse::<LibrarySort>().unwrap(), *sort);
        }
    }

    #[test]
    fn test_locale_cmp_uses_code_points_past_letters() {
        assert_eq!(locale_cmp("_alpha", "alpha"), Ordering::Less);
        assert_eq!(locale_cmp("~alpha", "zeta"), Ordering::Greater);
        assert_eq!(locale_cmp("straße", "strasse"), Ordering::Greater);
    }
}
