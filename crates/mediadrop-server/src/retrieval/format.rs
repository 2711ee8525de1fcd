//! Format selectors passed to the retrieval tool
//!
//! Streamed output cannot be merged after the fact, so streaming selectors
//! prefer a single pre-muxed mp4: every mp4 alternative is tried before any
//! other container, and plain `best` is the last resort. Local downloads may
//! merge separate video and audio tracks into an mp4 container.

use mediadrop_common::Quality;

/// Selector for output written to stdout
pub fn stream_selector(quality: Quality) -> String {
    match quality {
        Quality::Highest | Quality::Best => "best[ext=mp4]/best".to_string(),
        Quality::Lowest => "worst[ext=mp4]/worst".to_string(),
        _ => match quality.max_height() {
            Some(h) => format!("best[height<={h}][ext=mp4]/best[ext=mp4]/best[height<={h}]/best"),
            None => "best[ext=mp4]/best".to_string(),
        },
    }
}

/// Selector for a local file, merged into mp4
pub fn local_selector(quality: Quality) -> String {
    match quality {
        Quality::Highest | Quality::Best => "bestvideo+bestaudio/best".to_string(),
        Quality::Lowest => "worstvideo+worstaudio/worst".to_string(),
        _ => match quality.max_height() {
            Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"),
            None => "bestvideo+bestaudio/best".to_string(),
        },
    }
}
