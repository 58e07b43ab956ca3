//! Layout-link extraction from video descriptions

use crate::types::{LayoutLink, VideoRecord};
use once_cell::sync::Lazy;
use regex::Regex;

/// Official layout-link pattern issued by the game client. The layout id
/// after `id=` is percent-encoded, e.g. `TH16%3AWB%3A...`.
pub const LAYOUT_LINK_PATTERN: &str = r"https://link\.clashofclans\.com/en/\?action=OpenLayout&id=TH(?:15|16|17)%3A[A-Z]+%3A[0-9A-Za-z\-_]+";

static LAYOUT_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LAYOUT_LINK_PATTERN).expect("invalid layout link pattern"));

/// Extracts layout links from a video's description.
///
/// Pure text scan over already-fetched content. Links for other Town Hall
/// levels are dropped, duplicates collapse to their first occurrence, and
/// a description with no links yields an empty Vec.
pub fn extract_links(video: &VideoRecord, th_level: u8) -> Vec<LayoutLink> {
    let level_marker = format!("id=TH{}%3A", th_level);
    let mut links = Vec::new();

    for m in LAYOUT_LINK_RE.find_iter(&video.description) {
        let url = m.as_str();
        if !url.contains(&level_marker) {
            continue;
        }
        if links.iter().any(|l: &LayoutLink| l.url == url) {
            continue;
        }
        links.push(LayoutLink {
            url: url.to_string(),
            video_id: video.id.clone(),
        });
    }

    links
}
