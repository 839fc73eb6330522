//! Delivery core: ferries a remote image or video link into a desktop
//! application through whichever channel is currently available.
//!
//! The pieces, leaves first: [`naming`] picks the artifact name,
//! [`liveness`] tracks whether the companion service answers, [`channels`]
//! holds one strategy per delivery mechanism, [`orchestrator`] sequences them,
//! [`feedback`] turns the result into a notification and [`ledger`] remembers
//! recent successes. [`session`] wires all of it together for a host process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub mod channels;
pub mod config;
pub mod feedback;
pub mod http_client;
pub mod ledger;
pub mod liveness;
pub mod naming;
pub mod observability;
pub mod orchestrator;
pub mod session;
pub mod utils;

pub use liveness::LivenessState;

#[derive(Debug, Error)]
pub enum FerryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("companion service refused: {0}")]
    Refused(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid request: {0}")]
    InvalidRequest(RejectReason),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a user action was refused before any channel was tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MalformedUrl,
    UnsupportedScheme,
    NotAVideoLink,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::MalformedUrl => "source is not an absolute URL",
            RejectReason::UnsupportedScheme => "source URL must use http or https",
            RejectReason::NotAVideoLink => "source URL is not a recognised video page",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Image,
    VideoLink,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Image => "image",
            RequestKind::VideoLink => "video_link",
        }
    }
}

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// One user action: a source URL plus what kind of media it points at.
///
/// Immutable once built. Construction is where validation happens, so a
/// request that exists is always safe to hand to the channels. Every request
/// gets its own process-wide sequence number, even for a repeated URL.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryRequest {
    source_url: Url,
    kind: RequestKind,
    requested_at: DateTime<Utc>,
    sequence: u64,
}

impl DeliveryRequest {
    pub fn new(source_url: &str, kind: RequestKind) -> Result<Self, FerryError> {
        Self::new_at(source_url, kind, Utc::now())
    }

    pub fn new_at(
        source_url: &str,
        kind: RequestKind,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, FerryError> {
        let url = Url::parse(source_url.trim())
            .map_err(|_| FerryError::InvalidRequest(RejectReason::MalformedUrl))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FerryError::InvalidRequest(RejectReason::UnsupportedScheme));
        }
        if kind == RequestKind::VideoLink && utils::parse_video_id(&url).is_none() {
            return Err(FerryError::InvalidRequest(RejectReason::NotAVideoLink));
        }
        Ok(Self {
            source_url: url,
            kind,
            requested_at,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    RemoteService,
    Clipboard,
    Download,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::RemoteService => "remote_service",
            ChannelKind::Clipboard => "clipboard",
            ChannelKind::Download => "download",
        }
    }

    /// Wording used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::RemoteService => "desktop app",
            ChannelKind::Clipboard => "clipboard",
            ChannelKind::Download => "download folder",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    ServiceUnavailable,
    CrossOriginBlocked,
    DecodeFailed,
    ClipboardDenied,
    WriteFailed,
}

impl DeliveryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryErrorKind::ServiceUnavailable => "service_unavailable",
            DeliveryErrorKind::CrossOriginBlocked => "cross_origin_blocked",
            DeliveryErrorKind::DecodeFailed => "decode_failed",
            DeliveryErrorKind::ClipboardDenied => "clipboard_denied",
            DeliveryErrorKind::WriteFailed => "write_failed",
        }
    }
}

/// The result of a single channel attempt. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelOutcome {
    pub channel: ChannelKind,
    pub success: bool,
    pub artifact_name: Option<String>,
    pub message: String,
    pub error_kind: Option<DeliveryErrorKind>,
}

impl ChannelOutcome {
    pub fn succeeded(
        channel: ChannelKind,
        artifact_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            success: true,
            artifact_name: Some(artifact_name.into()),
            message: message.into(),
            error_kind: None,
        }
    }

    pub fn failed(
        channel: ChannelKind,
        artifact_name: impl Into<String>,
        error_kind: DeliveryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            success: false,
            artifact_name: Some(artifact_name.into()),
            message: message.into(),
            error_kind: Some(error_kind),
        }
    }
}

/// Everything that happened for one request, in attempt order.
#[derive(Clone, Debug)]
pub struct DeliveryResult {
    pub request: DeliveryRequest,
    pub artifact_name: String,
    pub outcomes: Vec<ChannelOutcome>,
}

impl DeliveryResult {
    pub fn success(&self) -> bool {
        self.terminal().is_some_and(|o| o.success)
    }

    /// The outcome that ended the sequence: the success, or the last failure.
    pub fn terminal(&self) -> Option<&ChannelOutcome> {
        self.outcomes.last()
    }

    pub fn attempted_channels(&self) -> Vec<ChannelKind> {
        self.outcomes.iter().map(|o| o.channel).collect()
    }
}

/// Per-attempt inputs shared by every tier of one request.
#[derive(Clone, Copy, Debug)]
pub struct AttemptContext<'a> {
    pub artifact_name: &'a str,
    pub liveness: &'a LivenessState,
}

/// One delivery mechanism.
///
/// Implementations must not fail: every error is folded into a
/// `ChannelOutcome` with `success == false` and an `error_kind`.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + 'static {
    fn kind(&self) -> ChannelKind;

    async fn attempt(&self, request: &DeliveryRequest, ctx: &AttemptContext<'_>)
    -> ChannelOutcome;
}
