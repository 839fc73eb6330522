//! Video page recognition for link deliveries.

use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static video id pattern"));

const WATCH_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Extract the 11-character video id from a watch, short or embed link.
///
/// Accepts:
/// - `youtube.com/watch?v=<id>` (bare, `www.` or `m.` host)
/// - `youtu.be/<id>`
/// - `youtube.com/embed/<id>`
///
/// The host must be one of those exactly; a video URL embedded in some other
/// site's path or query does not count.
pub fn video_id(url: &str) -> Option<String> {
    parse_video_id(&Url::parse(url.trim()).ok()?)
}

/// [`video_id`] for an already parsed URL.
pub fn parse_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let mut segments = url.path_segments()?;
    let candidate = if SHORT_HOSTS.contains(&host) {
        segments.next()?.to_string()
    } else if WATCH_HOSTS.contains(&host) {
        match segments.next()? {
            "watch" => url.query_pairs().find(|(k, _)| k == "v")?.1.into_owned(),
            "embed" => segments.next()?.to_string(),
            _ => return None,
        }
    } else {
        return None;
    };
    VIDEO_ID.is_match(&candidate).then_some(candidate)
}

pub fn is_video_link(url: &str) -> bool {
    video_id(url).is_some()
}

/// Short label for logs: "Video (<id>)", or a generic fallback.
pub fn describe_video(url: &str) -> String {
    match video_id(url) {
        Some(id) => format!("Video ({id})"),
        None => "Video".to_string(),
    }
}
