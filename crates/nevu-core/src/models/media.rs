use serde::{Deserialize, Serialize};

/// Stream type of an audio track in a part's stream list.
pub const STREAM_TYPE_AUDIO: u8 = 2;
/// Stream type of a subtitle track in a part's stream list.
pub const STREAM_TYPE_SUBTITLE: u8 = 3;

/// Kind of a library entry, as reported in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
    Season,
    Episode,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
            Self::Season => "season",
            Self::Episode => "episode",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One library entry (movie, show, season or episode).
///
/// Built from server or discover responses and never persisted. Counters the
/// server omits deserialize as zero so watch-state checks need no unwrapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub rating_key: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub guid: String,
    #[serde(rename = "type", default)]
    pub item_type: MediaType,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_offset: Option<u64>,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub view_count: u32,
    #[serde(default)]
    pub viewed_leaf_count: u32,
    #[serde(default)]
    pub leaf_count: u32,
    #[serde(default)]
    pub child_count: u32,
    #[serde(default)]
    pub index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_rating_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandparent_rating_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandparent_title: Option<String>,
    #[serde(rename = "librarySectionID", default, skip_serializing_if = "Option::is_none")]
    pub library_section_id: Option<u64>,
    #[serde(default)]
    pub added_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    /// Rating on the server's 0-10 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f32>,
    #[serde(rename = "Media", default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(rename = "Children", default, skip_serializing_if = "Option::is_none")]
    pub children: Option<ChildContainer>,
    #[serde(rename = "OnDeck", default, skip_serializing_if = "Option::is_none")]
    pub on_deck: Option<OnDeck>,
    #[serde(rename = "Extras", default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<ChildContainer>,
}

/// Nested `Children` / `Extras` block on a detail response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildContainer {
    #[serde(default)]
    pub size: u32,
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<MediaItem>,
}

/// The episode the server suggests resuming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnDeck {
    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Box<MediaItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_resolution: Option<String>,
    #[serde(rename = "Part", default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub key: String,
    #[serde(rename = "Stream", default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    #[serde(default)]
    pub stream_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_title: Option<String>,
}

impl MediaItem {
    /// Identifier the discover service uses for watchlist actions.
    ///
    /// GUIDs look like `plex://movie/5d776825880197001ec967c9`; the id is the
    /// fourth `/`-separated segment.
    pub fn discover_id(&self) -> Option<&str> {
        discover_id_of(&self.guid)
    }

    /// Identifier the community service uses for reviews (last GUID segment).
    pub fn community_id(&self) -> Option<&str> {
        self.guid.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Streams of the first part of the first media, if any.
    pub fn primary_streams(&self) -> &[Stream] {
        self.media
            .first()
            .and_then(|m| m.parts.first())
            .map(|p| p.streams.as_slice())
            .unwrap_or_default()
    }

    /// Unique audio languages, in order of first appearance.
    pub fn audio_languages(&self) -> Vec<String> {
        unique_languages(self.primary_streams(), STREAM_TYPE_AUDIO, true)
    }

    /// Unique subtitle languages, in order of first appearance.
    pub fn subtitle_languages(&self) -> Vec<String> {
        unique_languages(self.primary_streams(), STREAM_TYPE_SUBTITLE, false)
    }

    /// Part key of the first extra (usually the trailer).
    pub fn trailer_key(&self) -> Option<&str> {
        self.extras
            .as_ref()?
            .metadata
            .first()?
            .media
            .first()?
            .parts
            .first()
            .map(|p| p.key.as_str())
            .filter(|k| !k.is_empty())
    }

    /// Seasons listed in the nested `Children` block.
    pub fn child_items(&self) -> &[MediaItem] {
        self.children
            .as_ref()
            .map(|c| c.metadata.as_slice())
            .unwrap_or_default()
    }

    /// The on-deck episode, if the server returned one.
    pub fn on_deck_item(&self) -> Option<&MediaItem> {
        self.on_deck.as_ref()?.metadata.as_deref()
    }
}

/// See [`MediaItem::discover_id`].
pub fn discover_id_of(guid: &str) -> Option<&str> {
    guid.split('/').nth(3).filter(|s| !s.is_empty())
}

fn unique_languages(streams: &[Stream], stream_type: u8, fallback_display: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for stream in streams.iter().filter(|s| s.stream_type == stream_type) {
        let lang = match (&stream.language, fallback_display) {
            (Some(l), _) => Some(l),
            (None, true) => stream.display_title.as_ref(),
            (None, false) => None,
        };
        if let Some(lang) = lang {
            if !out.contains(lang) {
                out.push(lang.clone());
            }
        }
    }
    out
}
