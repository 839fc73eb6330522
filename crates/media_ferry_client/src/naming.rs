//! Artifact names: `browser_<date>_<time>_<digest>.<ext>`.
//!
//! The timestamp gives ordering across time. The digest covers the source URL
//! and the request's sequence number, so two requests in the same second never
//! share a name, even when they point at the same URL.

use chrono::{DateTime, Utc};
use reqwest::Url;
use sha2::{Digest, Sha256};

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

const DIGEST_LEN: usize = 8;

pub fn generate_artifact_name(
    source_url: &str,
    sequence: u64,
    timestamp: DateTime<Utc>,
    default_extension: &str,
) -> String {
    let ext = sniff_extension(source_url).unwrap_or(default_extension);
    let mut hasher = Sha256::new();
    hasher.update(source_url.as_bytes());
    hasher.update(sequence.to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    format!(
        "browser_{}_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        &digest[..DIGEST_LEN],
        ext
    )
}

/// Lower-cased extension of the URL's last path segment, if it is on the
/// allow-list. Query strings and fragments are ignored.
pub fn sniff_extension(source_url: &str) -> Option<&'static str> {
    let url = Url::parse(source_url).ok()?;
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().copied().find(|e| *e == ext)
}

pub fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn extension_comes_from_url_path() {
        assert_eq!(sniff_extension("https://x/y.png"), Some("png"));
        assert_eq!(sniff_extension("https://x/a/b/photo.JPEG?w=200#frag"), Some("jpeg"));
        assert_eq!(sniff_extension("https://cdn.example/img.webp"), Some("webp"));
    }

    #[test]
    fn unknown_or_missing_extension_is_none() {
        assert_eq!(sniff_extension("https://x/y.svg"), None);
        assert_eq!(sniff_extension("https://x/image"), None);
        assert_eq!(sniff_extension("https://x/"), None);
        assert_eq!(sniff_extension("not a url"), None);
        assert_eq!(sniff_extension("https://x/y.png.exe"), None);
    }

    #[test]
    fn name_uses_default_extension_when_unrecognised() {
        let name = generate_artifact_name("https://x/image?id=4", 1, at(0), "jpg");
        assert!(name.ends_with(".jpg"), "{name}");
        let name = generate_artifact_name("%%%", 1, at(0), "png");
        assert!(name.ends_with(".png"), "{name}");
    }

    #[test]
    fn name_embeds_second_granularity_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        let name = generate_artifact_name("https://x/y.gif", 1, ts, "jpg");
        assert!(name.starts_with("browser_20250309_140507_"), "{name}");
        assert!(name.ends_with(".gif"));
    }

    #[test]
    fn same_inputs_give_same_name() {
        let a = generate_artifact_name("https://x/y.png", 7, at(1_700_000_000), "jpg");
        let b = generate_artifact_name("https://x/y.png", 7, at(1_700_000_000), "jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn same_url_in_same_second_differs_by_sequence() {
        let a = generate_artifact_name("https://x/y.png", 7, at(1_700_000_000), "jpg");
        let b = generate_artifact_name("https://x/y.png", 8, at(1_700_000_000), "jpg");
        assert_ne!(a, b);
        assert_eq!(a[..23], b[..23]);
    }

    #[test]
    fn different_sources_in_same_second_do_not_collide() {
        let a = generate_artifact_name("https://x/one.png", 7, at(1_700_000_000), "jpg");
        let b = generate_artifact_name("https://x/two.png", 7, at(1_700_000_000), "jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn allow_list_check() {
        assert!(is_allowed_extension("bmp"));
        assert!(!is_allowed_extension("tiff"));
    }
}
