use crate::FerryError;
use crate::naming;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8590";
pub const DEFAULT_SOURCE: &str = "media-ferry";
pub const DEFAULT_ORIGIN: &str = "chrome-extension://media-ferry";
pub const DEFAULT_DOWNLOAD_SUBDIR: &str = "MediaFerry";

const MIN_NOTIFICATION_TTL: Duration = Duration::from_secs(4);
const MAX_NOTIFICATION_TTL: Duration = Duration::from_secs(8);

#[derive(Clone, Debug)]
pub struct Config {
    /// Companion service root, e.g. `http://localhost:8590`.
    pub base_url: String,
    /// Value of the `source` field sent with every push.
    pub source: String,
    /// Origin presented when reading image bytes for the clipboard.
    pub origin: String,
    pub download_dir: PathBuf,
    pub download_subdir: String,
    pub default_extension: String,
    pub request_timeout: Duration,
    pub fast_fail_timeout: Duration,
    pub probe_timeout: Duration,
    pub probe_interval: Duration,
    pub notification_ttl: Duration,
    pub copy_link_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, FerryError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, FerryError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = get("MEDIA_FERRY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let download_dir = match get("MEDIA_FERRY_DOWNLOAD_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => get("HOME")
                .map(|home| PathBuf::from(home).join("Downloads"))
                .ok_or_else(|| {
                    FerryError::Config("MEDIA_FERRY_DOWNLOAD_DIR missing and HOME unset".into())
                })?,
        };
        let default_extension = get("MEDIA_FERRY_DEFAULT_EXTENSION")
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .unwrap_or_else(|| "jpg".into());
        if !naming::is_allowed_extension(&default_extension) {
            return Err(FerryError::Config(format!(
                "MEDIA_FERRY_DEFAULT_EXTENSION {default_extension:?} is not an image extension"
            )));
        }

        let ttl = millis(&mut get, "MEDIA_FERRY_NOTIFICATION_TTL_MS", 5_000)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            source: get("MEDIA_FERRY_SOURCE").unwrap_or_else(|| DEFAULT_SOURCE.into()),
            origin: get("MEDIA_FERRY_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.into()),
            download_dir,
            download_subdir: get("MEDIA_FERRY_DOWNLOAD_SUBDIR")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_SUBDIR.into()),
            default_extension,
            request_timeout: millis(&mut get, "MEDIA_FERRY_REQUEST_TIMEOUT_MS", 5_000)?,
            fast_fail_timeout: millis(&mut get, "MEDIA_FERRY_FAST_FAIL_TIMEOUT_MS", 1_000)?,
            probe_timeout: millis(&mut get, "MEDIA_FERRY_PROBE_TIMEOUT_MS", 2_000)?,
            probe_interval: Duration::from_secs(parse_or(
                &mut get,
                "MEDIA_FERRY_PROBE_INTERVAL_SECS",
                30,
            )?),
            notification_ttl: ttl.clamp(MIN_NOTIFICATION_TTL, MAX_NOTIFICATION_TTL),
            copy_link_fallback: parse_or(&mut get, "MEDIA_FERRY_COPY_LINK_FALLBACK", false)?,
        })
    }

    /// Defaults rooted at an explicit download directory; used by tests and
    /// embedders that do not read the environment.
    pub fn with_download_dir(base_url: &str, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            source: DEFAULT_SOURCE.into(),
            origin: DEFAULT_ORIGIN.into(),
            download_dir: download_dir.into(),
            download_subdir: DEFAULT_DOWNLOAD_SUBDIR.into(),
            default_extension: "jpg".into(),
            request_timeout: Duration::from_secs(5),
            fast_fail_timeout: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(2),
            probe_interval: Duration::from_secs(30),
            notification_ttl: Duration::from_secs(5),
            copy_link_fallback: false,
        }
    }

    pub fn download_folder(&self) -> PathBuf {
        self.download_dir.join(&self.download_subdir)
    }
}

fn parse_or<F, T>(get: &mut F, key: &str, default: T) -> Result<T, FerryError>
where
    F: FnMut(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| FerryError::Config(format!("{key} has invalid value {raw:?}"))),
    }
}

fn millis<F>(get: &mut F, key: &str, default: u64) -> Result<Duration, FerryError>
where
    F: FnMut(&str) -> Option<String>,
{
    parse_or(get, key, default).map(Duration::from_millis)
}
