//! Semi-automatic tier: put the image on the system clipboard so the user
//! only has to paste.

use crate::{
    AttemptContext, ChannelKind, ChannelOutcome, DeliveryChannel, DeliveryErrorKind,
    DeliveryRequest, RequestKind,
};
use async_trait::async_trait;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

/// Source bytes decoded to a straight RGBA8 bitmap.
///
/// This is the clipboard's canonical image form: the system backend
/// publishes it as PNG, whatever format the source was served in.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// Write-only clipboard backend.
pub trait ClipboardSink: Send + Sync + 'static {
    fn write_image(&self, image: &EncodedImage) -> Result<(), ClipboardError>;

    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// The desktop clipboard via `arboard`, which offers image writes as PNG to
/// other applications. A handle is opened per write.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_image(&self, image: &EncodedImage) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_image(arboard::ImageData {
                width: image.width as usize,
                height: image.height as usize,
                bytes: Cow::Borrowed(&image.rgba),
            })
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "arboard"
    }
}

enum ClipFailure {
    Decode(String),
    Clipboard(String),
}

pub struct ClipboardChannel {
    http: reqwest::Client,
    origin: String,
    timeout: Duration,
    sink: Arc<dyn ClipboardSink>,
}

impl ClipboardChannel {
    pub fn new(
        http: reqwest::Client,
        origin: impl Into<String>,
        timeout: Duration,
        sink: Arc<dyn ClipboardSink>,
    ) -> Self {
        Self {
            http,
            origin: origin.into(),
            timeout,
            sink,
        }
    }

    /// Read the image bytes the way a page script would: the source must
    /// answer 2xx and allow our origin to read the body.
    async fn fetch_cross_origin(&self, url: &str) -> Result<Vec<u8>, String> {
        let resp = self
            .http
            .get(url)
            .header(ORIGIN, self.origin.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("fetch failed: {e}"))?;
        if !resp.status().is_success() {
            return Err(format!("source answered {}", resp.status()));
        }
        let allowed = resp
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "*" || v.trim() == self.origin);
        if !allowed {
            return Err("source does not allow cross-origin reads".into());
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| format!("reading body failed: {e}"))?;
        Ok(bytes.to_vec())
    }

    async fn copy_image(&self, url: &str, artifact_name: &str) -> ChannelOutcome {
        let bytes = match self.fetch_cross_origin(url).await {
            Ok(b) => b,
            Err(msg) => {
                return ChannelOutcome::failed(
                    self.kind(),
                    artifact_name,
                    DeliveryErrorKind::CrossOriginBlocked,
                    msg,
                );
            }
        };

        // Decoding and the clipboard call are blocking; keep them off the
        // scheduler thread.
        let sink = Arc::clone(&self.sink);
        let joined = tokio::task::spawn_blocking(move || {
            let image =
                EncodedImage::from_bytes(&bytes).map_err(|e| ClipFailure::Decode(e.to_string()))?;
            sink.write_image(&image)
                .map_err(|e| ClipFailure::Clipboard(e.to_string()))?;
            Ok::<_, ClipFailure>((image.width, image.height))
        })
        .await;

        match joined {
            Ok(Ok((w, h))) => ChannelOutcome::succeeded(
                self.kind(),
                artifact_name,
                format!("copied {w}x{h} image to clipboard"),
            ),
            Ok(Err(ClipFailure::Decode(msg))) => ChannelOutcome::failed(
                self.kind(),
                artifact_name,
                DeliveryErrorKind::DecodeFailed,
                msg,
            ),
            Ok(Err(ClipFailure::Clipboard(msg))) => ChannelOutcome::failed(
                self.kind(),
                artifact_name,
                DeliveryErrorKind::ClipboardDenied,
                msg,
            ),
            Err(e) => ChannelOutcome::failed(
                self.kind(),
                artifact_name,
                DeliveryErrorKind::ClipboardDenied,
                format!("clipboard task failed: {e}"),
            ),
        }
    }

    async fn copy_link(&self, url: &str, artifact_name: &str) -> ChannelOutcome {
        let sink = Arc::clone(&self.sink);
        let text = url.to_string();
        let joined = tokio::task::spawn_blocking(move || sink.write_text(&text)).await;
        match joined {
            Ok(Ok(())) => {
                ChannelOutcome::succeeded(self.kind(), artifact_name, "link copied to clipboard")
            }
            Ok(Err(e)) => ChannelOutcome::failed(
                self.kind(),
                artifact_name,
                DeliveryErrorKind::ClipboardDenied,
                e.to_string(),
            ),
            Err(e) => ChannelOutcome::failed(
                self.kind(),
                artifact_name,
                DeliveryErrorKind::ClipboardDenied,
                format!("clipboard task failed: {e}"),
            ),
        }
    }
}

#[async_trait]
impl DeliveryChannel for ClipboardChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Clipboard
    }

    async fn attempt(
        &self,
        request: &DeliveryRequest,
        ctx: &AttemptContext<'_>,
    ) -> ChannelOutcome {
        tracing::debug!("clipboard tier using {} backend", self.sink.name());
        let url = request.source_url().as_str();
        match request.kind() {
            RequestKind::Image => self.copy_image(url, ctx.artifact_name).await,
            RequestKind::VideoLink => self.copy_link(url, ctx.artifact_name).await,
        }
    }
}
