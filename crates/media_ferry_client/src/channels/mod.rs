//! Delivery tiers and the fixed order they are tried in.
//!
//! Image: companion service, then clipboard, then download folder.
//! Video link: companion service only, optionally followed by copying the
//! link to the clipboard as text.

use crate::{ChannelKind, DeliveryChannel, RequestKind};
use std::sync::Arc;

pub mod clipboard;
pub mod download;
pub mod remote;

pub use clipboard::{ClipboardChannel, ClipboardError, ClipboardSink, EncodedImage, SystemClipboard};
pub use download::DownloadChannel;
pub use remote::RemoteServiceChannel;

pub const IMAGE_PLAN: &[ChannelKind] = &[
    ChannelKind::RemoteService,
    ChannelKind::Clipboard,
    ChannelKind::Download,
];
pub const VIDEO_PLAN: &[ChannelKind] = &[ChannelKind::RemoteService];
pub const VIDEO_PLAN_WITH_LINK_COPY: &[ChannelKind] =
    &[ChannelKind::RemoteService, ChannelKind::Clipboard];

pub fn plan(kind: RequestKind, copy_link_fallback: bool) -> &'static [ChannelKind] {
    match (kind, copy_link_fallback) {
        (RequestKind::Image, _) => IMAGE_PLAN,
        (RequestKind::VideoLink, false) => VIDEO_PLAN,
        (RequestKind::VideoLink, true) => VIDEO_PLAN_WITH_LINK_COPY,
    }
}

/// One strategy per tier.
#[derive(Clone)]
pub struct ChannelSet {
    remote: Arc<dyn DeliveryChannel>,
    clipboard: Arc<dyn DeliveryChannel>,
    download: Arc<dyn DeliveryChannel>,
}

impl ChannelSet {
    pub fn new(
        remote: Arc<dyn DeliveryChannel>,
        clipboard: Arc<dyn DeliveryChannel>,
        download: Arc<dyn DeliveryChannel>,
    ) -> Self {
        debug_assert_eq!(remote.kind(), ChannelKind::RemoteService);
        debug_assert_eq!(clipboard.kind(), ChannelKind::Clipboard);
        debug_assert_eq!(download.kind(), ChannelKind::Download);
        Self {
            remote,
            clipboard,
            download,
        }
    }

    pub fn get(&self, kind: ChannelKind) -> &Arc<dyn DeliveryChannel> {
        match kind {
            ChannelKind::RemoteService => &self.remote,
            ChannelKind::Clipboard => &self.clipboard,
            ChannelKind::Download => &self.download,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_plan_degrades_through_all_tiers() {
        assert_eq!(
            plan(RequestKind::Image, false),
            &[
                ChannelKind::RemoteService,
                ChannelKind::Clipboard,
                ChannelKind::Download
            ]
        );
        assert_eq!(plan(RequestKind::Image, true), IMAGE_PLAN);
    }

    #[test]
    fn video_plan_is_service_only_unless_link_copy_enabled() {
        assert_eq!(plan(RequestKind::VideoLink, false), &[ChannelKind::RemoteService]);
        assert_eq!(
            plan(RequestKind::VideoLink, true),
            &[ChannelKind::RemoteService, ChannelKind::Clipboard]
        );
    }
}
