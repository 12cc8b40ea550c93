use serde::Serialize;

use nevu_api::community::types::{ActivityReview, ReviewsData};
use nevu_core::models::{Directory, MediaItem, MediaType};
use nevu_core::watch::{is_watched, rating_to_stars};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `1h 56m`, `42m`, or `0m`.
pub fn format_duration(ms: u64) -> String {
    let minutes = ms / 60_000;
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// One listing row: key, display title, type and markers.
pub fn item_line(item: &MediaItem) -> String {
    let title = match item.item_type {
        MediaType::Episode => format!(
            "{} S{}E{} {}",
            item.grandparent_title.as_deref().unwrap_or_default(),
            item.parent_index.unwrap_or_default(),
            item.index,
            item.title
        ),
        MediaType::Season => format!(
            "{} {}",
            item.parent_title.as_deref().unwrap_or_default(),
            item.title
        ),
        _ if item.year > 0 => format!("{} ({})", item.title, item.year),
        _ => item.title.clone(),
    };

    let mut line = format!("{:>8}  {}  [{}]", item.rating_key, title.trim(), item.item_type);
    if is_watched(item) {
        line.push_str("  watched");
    } else if let Some(offset) = item.view_offset.filter(|o| *o > 0) {
        line.push_str(&format!("  at {}", format_duration(offset)));
    }
    if let Some(stars) = rating_to_stars(item.user_rating) {
        line.push_str(&format!("  {stars}*"));
    }
    line
}

pub fn library_line(dir: &Directory) -> String {
    format!(
        "{:>4}  {}  [{}]",
        dir.key,
        dir.title,
        dir.library_type.as_deref().unwrap_or("unknown")
    )
}

/// Multi-line detail view for `nevu meta`.
pub fn item_detail(item: &MediaItem) -> String {
    let mut out = item_line(item);
    if let Some(summary) = item.summary.as_deref().filter(|s| !s.is_empty()) {
        out.push_str("\n\n");
        out.push_str(summary);
    }
    if item.duration > 0 {
        out.push_str(&format!("\n\nRuntime: {}", format_duration(item.duration)));
    }
    if let Some(rating) = &item.content_rating {
        out.push_str(&format!("\nRated: {rating}"));
    }
    let audio = item.audio_languages();
    if !audio.is_empty() {
        out.push_str(&format!("\nAudio: {}", audio.join(", ")));
    }
    let subtitles = item.subtitle_languages();
    if !subtitles.is_empty() {
        out.push_str(&format!("\nSubtitles: {}", subtitles.join(", ")));
    }
    if matches!(item.item_type, MediaType::Show) && item.leaf_count > 0 {
        out.push_str(&format!(
            "\nEpisodes: {}/{} watched",
            item.viewed_leaf_count, item.leaf_count
        ));
    }
    for season in item.child_items() {
        out.push_str(&format!("\n  {}", item_line(season)));
    }
    out
}

fn review_line(review: &ActivityReview) -> String {
    let author = review
        .user
        .as_ref()
        .map(|u| {
            if u.display_name.is_empty() {
                u.username.as_str()
            } else {
                u.display_name.as_str()
            }
        })
        .unwrap_or("unknown");
    let score = review
        .score()
        .map(|s| format!("{}* ", s / 2.0))
        .unwrap_or_default();
    let message = match (&review.message, review.has_spoilers) {
        (Some(_), true) => "[spoilers hidden]".to_string(),
        (Some(m), false) => m.replace('\n', " "),
        (None, _) => String::new(),
    };
    format!("  {score}{author}: {message}").trim_end().to_string()
}

pub fn reviews_text(data: &ReviewsData) -> String {
    let mut out = String::new();
    if let Some(own) = &data.user_review {
        out.push_str("Your review\n");
        out.push_str(&review_line(own));
        out.push('\n');
    }
    for section in data.sections() {
        if section.nodes.is_empty() {
            continue;
        }
        out.push_str(&section.title);
        out.push('\n');
        for review in &section.nodes {
            out.push_str(&review_line(review));
            out.push('\n');
        }
        if section.page_info.has_next_page {
            out.push_str("  ...\n");
        }
    }
    if out.is_empty() {
        out.push_str("No reviews yet\n");
    }
    out
}
