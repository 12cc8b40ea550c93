use serde::{Deserialize, Serialize};

use super::media::MediaItem;

/// A directory entry: a library section, a genre, or another browse folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub library_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Directory {
    /// Whether this section holds movies or shows (the only kinds browsed).
    pub fn is_video_library(&self) -> bool {
        matches!(self.library_type.as_deref(), Some("movie" | "show"))
    }
}

/// A media type a library section can be filtered to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryType {
    #[serde(default)]
    pub key: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub title: String,
}

/// The `MediaContainer` envelope every server listing is wrapped in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContainer {
    #[serde(default)]
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title1: Option<String>,
    #[serde(rename = "librarySectionID", default, skip_serializing_if = "Option::is_none")]
    pub library_section_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_group: Option<String>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<MediaItem>,
    #[serde(rename = "Directory", default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    #[serde(rename = "Type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<LibraryType>,
}

impl MediaContainer {
    /// Primary media type of a library section container (`Type[0]`).
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(|t| t.type_name.as_str())
    }
}

/// Top-level `{"MediaContainer": ...}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerResponse {
    #[serde(rename = "MediaContainer", default)]
    pub media_container: MediaContainer,
}
