//! Browse filters for a library section and the request they translate to.

use std::str::FromStr;

use crate::error::UnknownOption;
use crate::models::{MediaContainer, MediaType};
use crate::sort::LibrarySort;

/// First-level browse filter; most variants are server-side sub-listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimaryFilter {
    #[default]
    All,
    Unwatched,
    Watched,
    RecentlyAdded,
    OnDeck,
    Newest,
}

impl PrimaryFilter {
    pub const ALL: &[PrimaryFilter] = &[
        Self::All,
        Self::Unwatched,
        Self::Watched,
        Self::RecentlyAdded,
        Self::OnDeck,
        Self::Newest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unwatched => "unwatched",
            Self::Watched => "watched",
            Self::RecentlyAdded => "recentlyAdded",
            Self::OnDeck => "onDeck",
            Self::Newest => "newest",
        }
    }

    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for PrimaryFilter {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownOption {
                kind: "filter",
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for PrimaryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restrict an `all` listing to one media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    Any,
    Only(MediaType),
}

impl TypeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Only(t) => t.as_str(),
        }
    }

    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for TypeFilter {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "movie" => Ok(Self::Only(MediaType::Movie)),
            "show" => Ok(Self::Only(MediaType::Show)),
            "episode" => Ok(Self::Only(MediaType::Episode)),
            _ => Err(UnknownOption {
                kind: "type filter",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric `type` query value the server uses for a media type.
pub fn lib_type_to_num(media_type: MediaType) -> u8 {
    match media_type {
        MediaType::Movie => 1,
        MediaType::Show => 2,
        MediaType::Episode => 4,
        _ => 0,
    }
}

/// A section listing request built from the current browse selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseQuery {
    pub path: String,
    pub params: Vec<(String, String)>,
    /// Sort the user picked; may differ from the `sort` param sent.
    pub requested_sort: LibrarySort,
}

impl BrowseQuery {
    /// `library_type` is the section's primary type (`Type[0]`), if known.
    pub fn build(
        section_id: u64,
        library_type: Option<&str>,
        primary: PrimaryFilter,
        type_filter: TypeFilter,
        sort: LibrarySort,
    ) -> Self {
        let mut params: Vec<(String, String)> = Vec::new();

        let end = match primary {
            PrimaryFilter::Watched => {
                params.push(("show.unwatchedLeaves!".into(), "1".into()));
                params.push(("unwatched!".into(), "1".into()));
                "all"
            }
            other => other.as_str(),
        };

        if primary == PrimaryFilter::All {
            if let TypeFilter::Only(t) = type_filter {
                params.push(("type".into(), lib_type_to_num(t).to_string()));
            }
        }

        // Show sections cannot sort by update time server-side.
        let sort_param = if sort.is_updated() && library_type == Some("show") {
            LibrarySort::TitleAsc
        } else {
            sort
        };
        params.push(("sort".into(), sort_param.as_str().into()));

        Self {
            path: format!("/library/sections/{section_id}/{end}"),
            params,
            requested_sort: sort,
        }
    }

    /// Re-sort an `updated:*` listing by numeric update time.
    pub fn post_sort(&self, container: &mut MediaContainer) {
        match self.requested_sort {
            LibrarySort::UpdatedAsc => container.metadata.sort_by_key(|i| i.updated_at),
            LibrarySort::UpdatedDesc => container
                .metadata
                .sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            _ => {}
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
