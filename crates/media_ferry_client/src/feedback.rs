//! One transient notification per request.
//!
//! The text comes from a fixed table keyed on the terminal channel, whether it
//! succeeded, and the request kind. Raw error strings never reach the user.

use crate::{ChannelKind, DeliveryResult, RejectReason, RequestKind};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TITLE: &str = "Media Ferry";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Service accepted the item; the desktop app can paste it now.
    Ready,
    /// Item is on the clipboard; the user pastes manually.
    Clipboard,
    /// Item is a file in the download folder.
    Saved,
    Failure,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl NotificationKind {
    pub fn severity(&self) -> Severity {
        match self {
            NotificationKind::Ready => Severity::Success,
            NotificationKind::Clipboard | NotificationKind::Saved => Severity::Info,
            NotificationKind::Failure | NotificationKind::Rejected => Severity::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub ttl: Duration,
}

pub type NotificationId = u64;

/// Where notifications are rendered.
pub trait NotificationSink: Send + Sync + 'static {
    /// Must make the notification visible before returning.
    fn show(&self, notification: Notification) -> NotificationId;
}

pub fn notification_for(
    result: &DeliveryResult,
    download_subdir: &str,
    ttl: Duration,
) -> Notification {
    let kind = result.request.kind();
    let (nkind, message) = match result.terminal() {
        Some(t) if t.success => match (t.channel, kind) {
            (ChannelKind::RemoteService, RequestKind::Image) => (
                NotificationKind::Ready,
                "Ready! Press Cmd+V in the timeline".to_string(),
            ),
            (ChannelKind::RemoteService, RequestKind::VideoLink) => (
                NotificationKind::Ready,
                "Video sent to the desktop app".to_string(),
            ),
            (ChannelKind::Clipboard, RequestKind::Image) => (
                NotificationKind::Clipboard,
                "Image copied to clipboard - paste it into the app".to_string(),
            ),
            (ChannelKind::Clipboard, RequestKind::VideoLink) => (
                NotificationKind::Clipboard,
                "Link copied to clipboard - paste it into the app".to_string(),
            ),
            (ChannelKind::Download, _) => (
                NotificationKind::Saved,
                format!(
                    "Saved {} to the {} folder",
                    result.artifact_name, download_subdir
                ),
            ),
        },
        _ => {
            let tried: Vec<&str> = result.outcomes.iter().map(|o| o.channel.label()).collect();
            let message = if tried.is_empty() {
                "Could not deliver: no channel was available".to_string()
            } else {
                format!("Could not deliver: tried {}, all failed", tried.join(", "))
            };
            (NotificationKind::Failure, message)
        }
    };
    Notification {
        kind: nkind,
        title: TITLE.to_string(),
        message,
        ttl,
    }
}

pub fn rejection_notification(reason: RejectReason, ttl: Duration) -> Notification {
    let message = match reason {
        RejectReason::NotAVideoLink => "That link is not a supported video page",
        RejectReason::MalformedUrl | RejectReason::UnsupportedScheme => {
            "That is not a valid media URL"
        }
    };
    Notification {
        kind: NotificationKind::Rejected,
        title: TITLE.to_string(),
        message: message.to_string(),
        ttl,
    }
}

#[derive(Clone)]
pub struct FeedbackReporter {
    sink: Arc<dyn NotificationSink>,
    ttl: Duration,
    download_subdir: String,
}

impl FeedbackReporter {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        ttl: Duration,
        download_subdir: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            ttl,
            download_subdir: download_subdir.into(),
        }
    }

    pub fn report(&self, result: &DeliveryResult) -> NotificationId {
        self.sink
            .show(notification_for(result, &self.download_subdir, self.ttl))
    }

    pub fn report_rejection(&self, reason: RejectReason) -> NotificationId {
        self.sink.show(rejection_notification(reason, self.ttl))
    }
}

#[derive(Clone, Debug)]
struct Active {
    id: NotificationId,
    notification: Notification,
}

/// In-process notification surface: shows immediately, dismisses itself
/// after the notification's TTL, or earlier via [`NotificationBoard::dismiss`].
/// Notifications from different requests coexist, each on its own timer.
#[derive(Clone, Default)]
pub struct NotificationBoard {
    next_id: Arc<AtomicU64>,
    active: Arc<Mutex<Vec<Active>>>,
}

impl NotificationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut active = self.lock();
        let before = active.len();
        active.retain(|a| a.id != id);
        before != active.len()
    }

    pub fn active(&self) -> Vec<(NotificationId, Notification)> {
        self.lock()
            .iter()
            .map(|a| (a.id, a.notification.clone()))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Active>> {
        // A panic while holding the lock leaves the list itself intact.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NotificationSink for NotificationBoard {
    fn show(&self, notification: Notification) -> NotificationId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        match notification.kind.severity() {
            Severity::Error => tracing::warn!("{}: {}", notification.title, notification.message),
            _ => tracing::info!("{}: {}", notification.title, notification.message),
        }
        let ttl = notification.ttl;
        self.lock().push(Active { id, notification });

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let board = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    if board.dismiss(id) {
                        tracing::debug!("notification {} expired", id);
                    }
                });
            }
            Err(_) => tracing::debug!("no runtime; notification {} will not auto-dismiss", id),
        }
        id
    }
}
