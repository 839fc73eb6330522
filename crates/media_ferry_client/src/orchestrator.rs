//! Priority-ordered fallback chain.
//!
//! Full automation (companion service) degrades to a single manual paste
//! (clipboard) and finally to a manual drag-in (download folder). Tiers run
//! strictly one after another and the first success ends the chain.

use crate::channels::{self, ChannelSet};
use crate::feedback::FeedbackReporter;
use crate::ledger::{RecentItem, RecentItems};
use crate::liveness::LivenessProber;
use crate::{
    AttemptContext, DeliveryRequest, DeliveryResult, FerryError, RejectReason, RequestKind,
    naming, observability,
};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct OrchestratorOptions {
    /// Extension used when the source URL does not reveal one.
    pub default_extension: String,
    /// Copy a video link to the clipboard as text when the service fails.
    pub copy_link_fallback: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            default_extension: "jpg".into(),
            copy_link_fallback: false,
        }
    }
}

pub struct Orchestrator {
    channels: ChannelSet,
    prober: Arc<LivenessProber>,
    ledger: Arc<RecentItems>,
    reporter: FeedbackReporter,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(
        channels: ChannelSet,
        prober: Arc<LivenessProber>,
        ledger: Arc<RecentItems>,
        reporter: FeedbackReporter,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            channels,
            prober,
            ledger,
            reporter,
            options,
        }
    }

    pub fn ledger(&self) -> &Arc<RecentItems> {
        &self.ledger
    }

    pub fn prober(&self) -> &Arc<LivenessProber> {
        &self.prober
    }

    /// Run the chain for one request. Never fails: exhausting every tier is
    /// an ordinary result with `success() == false`.
    pub async fn deliver(&self, request: DeliveryRequest) -> DeliveryResult {
        let artifact_name = naming::generate_artifact_name(
            request.source_url().as_str(),
            request.sequence(),
            request.requested_at(),
            &self.options.default_extension,
        );

        // Advisory only; a stale cache refreshes in the background.
        let believed_up = self.prober.is_likely_reachable();
        let liveness = self.prober.state();
        tracing::debug!(
            "delivering {} {} as {} (service believed {})",
            request.kind().as_str(),
            request.source_url(),
            artifact_name,
            if believed_up { "up" } else { "down" }
        );

        let plan = channels::plan(request.kind(), self.options.copy_link_fallback);
        let mut outcomes = Vec::with_capacity(plan.len());
        for &kind in plan {
            let ctx = AttemptContext {
                artifact_name: &artifact_name,
                liveness: &liveness,
            };
            let outcome = self.channels.get(kind).attempt(&request, &ctx).await;
            debug_assert_eq!(outcome.channel, kind);
            debug_assert_eq!(
                outcome.artifact_name.as_deref(),
                Some(artifact_name.as_str())
            );
            observability::record_attempt(&outcome);

            let success = outcome.success;
            if success {
                tracing::info!("{} delivered via {}", artifact_name, kind.as_str());
            } else {
                tracing::warn!(
                    "{} tier failed for {}: {} ({})",
                    kind.as_str(),
                    artifact_name,
                    outcome.message,
                    outcome.error_kind.map(|k| k.as_str()).unwrap_or("unknown")
                );
            }
            outcomes.push(outcome);
            if success {
                break;
            }
        }

        let result = DeliveryResult {
            request,
            artifact_name,
            outcomes,
        };
        observability::record_delivery(&result);
        result
    }

    /// The single entry point for user actions: validate, deliver, notify
    /// exactly once, remember on success.
    pub async fn request_delivery(
        &self,
        source_url: &str,
        kind: RequestKind,
    ) -> Result<DeliveryResult, FerryError> {
        let request = match DeliveryRequest::new(source_url, kind) {
            Ok(r) => r,
            Err(e) => {
                let reason = match &e {
                    FerryError::InvalidRequest(reason) => *reason,
                    _ => RejectReason::MalformedUrl,
                };
                tracing::warn!("rejected {} request for {:?}: {}", kind.as_str(), source_url, e);
                observability::record_rejection();
                self.reporter.report_rejection(reason);
                return Err(e);
            }
        };

        let result = self.deliver(request).await;
        self.reporter.report(&result);

        if let Some(terminal) = result.terminal().filter(|t| t.success) {
            self.ledger
                .record(RecentItem {
                    source_url: result.request.source_url().to_string(),
                    kind: result.request.kind(),
                    artifact_name: result.artifact_name.clone(),
                    channel: terminal.channel,
                    completed_at: Utc::now(),
                })
                .await;
        }
        Ok(result)
    }

    /// Deliver a remembered item again as a brand-new request; a new
    /// artifact name is generated.
    pub async fn replay(&self, item: &RecentItem) -> Result<DeliveryResult, FerryError> {
        self.request_delivery(&item.source_url, item.kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{Notification, NotificationId, NotificationKind, NotificationSink};
    use crate::http_client::CompanionClient;
    use crate::{ChannelKind, ChannelOutcome, DeliveryChannel, DeliveryErrorKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Channel that answers from a script and records every call.
    struct Scripted {
        kind: ChannelKind,
        succeed: bool,
        calls: Arc<Mutex<Vec<(ChannelKind, String)>>>,
    }

    #[async_trait]
    impl DeliveryChannel for Scripted {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn attempt(
            &self,
            _request: &DeliveryRequest,
            ctx: &AttemptContext<'_>,
        ) -> ChannelOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((self.kind, ctx.artifact_name.to_string()));
            if self.succeed {
                ChannelOutcome::succeeded(self.kind, ctx.artifact_name, "ok")
            } else {
                ChannelOutcome::failed(
                    self.kind,
                    ctx.artifact_name,
                    DeliveryErrorKind::ServiceUnavailable,
                    "scripted failure",
                )
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl NotificationSink for Recorder {
        fn show(&self, notification: Notification) -> NotificationId {
            let mut shown = self.0.lock().unwrap();
            shown.push(notification);
            shown.len() as NotificationId
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        calls: Arc<Mutex<Vec<(ChannelKind, String)>>>,
        shown: Arc<Recorder>,
    }

    fn harness(remote: bool, clipboard: bool, download: bool) -> Harness {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mk = |kind, succeed| -> Arc<dyn DeliveryChannel> {
            Arc::new(Scripted {
                kind,
                succeed,
                calls: Arc::clone(&calls),
            })
        };
        let channels = ChannelSet::new(
            mk(ChannelKind::RemoteService, remote),
            mk(ChannelKind::Clipboard, clipboard),
            mk(ChannelKind::Download, download),
        );
        // Port 9 on loopback: nothing listens there; background refreshes fail fast.
        let prober = LivenessProber::new(
            CompanionClient::new("http://127.0.0.1:9"),
            Duration::from_millis(200),
            Duration::from_secs(30),
        );
        let shown = Arc::new(Recorder::default());
        let reporter = FeedbackReporter::new(shown.clone(), Duration::from_secs(5), "MediaFerry");
        let orchestrator = Orchestrator::new(
            channels,
            prober,
            Arc::new(RecentItems::new()),
            reporter,
            OrchestratorOptions::default(),
        );
        Harness {
            orchestrator,
            calls,
            shown,
        }
    }

    fn attempted(h: &Harness) -> Vec<ChannelKind> {
        h.calls.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    #[tokio::test]
    async fn image_chain_tries_every_tier_in_order_until_success() {
        let cases = [
            ((true, true, true), 1),
            ((false, true, true), 2),
            ((false, false, true), 3),
            ((false, false, false), 3),
        ];
        for ((r, c, d), expected) in cases {
            let h = harness(r, c, d);
            let result = h
                .orchestrator
                .request_delivery("https://x/y.png", RequestKind::Image)
                .await
                .expect("accepted");
            let order = attempted(&h);
            assert_eq!(order.len(), expected);
            assert_eq!(order, channels::IMAGE_PLAN[..expected].to_vec());
            assert_eq!(result.outcomes.len(), expected);
            assert_eq!(result.success(), r || c || d);
        }
    }

    #[tokio::test]
    async fn artifact_name_is_shared_across_tiers() {
        let h = harness(false, false, false);
        let result = h
            .orchestrator
            .request_delivery("https://x/photo.webp", RequestKind::Image)
            .await
            .unwrap();
        assert!(result.artifact_name.ends_with(".webp"));
        for (_, name) in h.calls.lock().unwrap().iter() {
            assert_eq!(name, &result.artifact_name);
        }
        for o in &result.outcomes {
            assert_eq!(o.artifact_name.as_deref(), Some(result.artifact_name.as_str()));
        }
    }

    #[tokio::test]
    async fn exactly_one_notification_and_ledger_only_on_success() {
        let h = harness(false, false, false);
        h.orchestrator
            .request_delivery("https://x/y.png", RequestKind::Image)
            .await
            .unwrap();
        assert_eq!(h.shown.0.lock().unwrap().len(), 1);
        assert_eq!(h.shown.0.lock().unwrap()[0].kind, NotificationKind::Failure);
        assert!(h.orchestrator.ledger().is_empty().await);

        let h = harness(false, true, true);
        h.orchestrator
            .request_delivery("https://x/y.png", RequestKind::Image)
            .await
            .unwrap();
        assert_eq!(h.shown.0.lock().unwrap().len(), 1);
        assert_eq!(h.shown.0.lock().unwrap()[0].kind, NotificationKind::Clipboard);
        let item = h.orchestrator.ledger().most_recent().await.expect("recorded");
        assert_eq!(item.channel, ChannelKind::Clipboard);
    }

    #[tokio::test]
    async fn video_link_uses_service_only() {
        let h = harness(false, true, true);
        let result = h
            .orchestrator
            .request_delivery("https://youtu.be/dQw4w9WgXcQ", RequestKind::VideoLink)
            .await
            .unwrap();
        assert_eq!(attempted(&h), vec![ChannelKind::RemoteService]);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn rejected_request_attempts_nothing_but_notifies_once() {
        let h = harness(true, true, true);
        let err = h
            .orchestrator
            .request_delivery("https://example.com/article", RequestKind::VideoLink)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FerryError::InvalidRequest(RejectReason::NotAVideoLink)
        ));
        assert!(attempted(&h).is_empty());
        let shown = h.shown.0.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, NotificationKind::Rejected);
    }

    #[tokio::test]
    async fn replay_builds_a_fresh_request() {
        let h = harness(true, true, true);
        let first = h
            .orchestrator
            .request_delivery("https://x/y.png", RequestKind::Image)
            .await
            .unwrap();
        let item = h.orchestrator.ledger().most_recent().await.unwrap();
        let replayed = h.orchestrator.replay(&item).await.unwrap();
        assert!(replayed.success());
        assert_eq!(replayed.request.source_url().as_str(), item.source_url);
        assert!(
            replayed.request.requested_at() >= item.completed_at - chrono::Duration::seconds(1)
        );
        // Same URL, usually the same second: the name must still change.
        assert_ne!(replayed.artifact_name, first.artifact_name);
        assert_ne!(replayed.request.sequence(), first.request.sequence());
        assert_eq!(h.orchestrator.ledger().len().await, 2);
    }
}
