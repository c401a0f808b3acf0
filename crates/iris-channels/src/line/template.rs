//! Carousel template assembly for news digests.

use iris_core::message::{CarouselColumn, Headline, Payload};

/// Maximum carousel columns the Messaging API accepts.
const MAX_COLUMNS: usize = 5;

/// Build a news carousel payload.
///
/// Entries without an image are dropped (the template requires a thumbnail);
/// returns `None` when nothing is left to show.
pub fn news_carousel(alt_text: &str, headlines: &[Headline]) -> Option<Payload> {
    let columns: Vec<CarouselColumn> = headlines
        .iter()
        .filter_map(|h| {
            h.image_url.as_ref().map(|image| CarouselColumn {
                title: h.title.clone(),
                text: h.title.clone(),
                image_url: image.clone(),
                action_url: h.url.clone(),
            })
        })
        .take(MAX_COLUMNS)
        .collect();

    if columns.is_empty() {
        None
    } else {
        Some(Payload::Carousel {
            alt_text: alt_text.to_string(),
            columns,
        })
    }
}

/// Plain-text digest fallback for when no headline carries an image.
pub fn news_text(headlines: &[Headline]) -> String {
    headlines
        .iter()
        .take(MAX_COLUMNS)
        .map(|h| format!("{}\n{}", h.title, h.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}
