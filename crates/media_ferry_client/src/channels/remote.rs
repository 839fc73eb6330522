use crate::http_client::{CompanionClient, ImagePush, LinkPush};
use crate::{
    AttemptContext, ChannelKind, ChannelOutcome, DeliveryChannel, DeliveryErrorKind,
    DeliveryRequest, RequestKind, utils,
};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Push the source reference to the companion service.
pub struct RemoteServiceChannel {
    client: CompanionClient,
    source: String,
    request_timeout: Duration,
    fast_fail_timeout: Duration,
    liveness_interval: Duration,
}

impl RemoteServiceChannel {
    pub fn new(
        client: CompanionClient,
        source: impl Into<String>,
        request_timeout: Duration,
        fast_fail_timeout: Duration,
        liveness_interval: Duration,
    ) -> Self {
        Self {
            client,
            source: source.into(),
            request_timeout,
            fast_fail_timeout,
            liveness_interval,
        }
    }

    /// A service that a fresh probe found down still gets an attempt, just
    /// with less patience.
    fn timeout_for(&self, ctx: &AttemptContext<'_>) -> Duration {
        if ctx.liveness.known_down(Utc::now(), self.liveness_interval) {
            self.fast_fail_timeout.min(self.request_timeout)
        } else {
            self.request_timeout
        }
    }
}

#[async_trait]
impl DeliveryChannel for RemoteServiceChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::RemoteService
    }

    async fn attempt(
        &self,
        request: &DeliveryRequest,
        ctx: &AttemptContext<'_>,
    ) -> ChannelOutcome {
        let timeout = self.timeout_for(ctx);
        let timestamp = request.requested_at().timestamp_millis();
        let source_url = request.source_url().as_str();

        let result = match request.kind() {
            RequestKind::Image => {
                let body = ImagePush {
                    image_url: source_url,
                    filename: ctx.artifact_name,
                    timestamp,
                    source: &self.source,
                };
                self.client.push_image(&body, timeout).await
            }
            RequestKind::VideoLink => {
                tracing::debug!(
                    "pushing {} to companion service",
                    utils::describe_video(source_url)
                );
                let body = LinkPush {
                    url: source_url,
                    timestamp,
                    source: &self.source,
                };
                self.client.push_link(&body, timeout).await
            }
        };

        match result {
            Ok(ack) => {
                if let Some(stored) = ack
                    .filename
                    .as_deref()
                    .filter(|stored| *stored != ctx.artifact_name)
                {
                    tracing::debug!(
                        "companion service stored {} as {}",
                        ctx.artifact_name,
                        stored
                    );
                }
                let message = ack
                    .message
                    .unwrap_or_else(|| "delivered to companion service".to_string());
                ChannelOutcome::succeeded(self.kind(), ctx.artifact_name, message)
            }
            Err(e) => ChannelOutcome::failed(
                self.kind(),
                ctx.artifact_name,
                DeliveryErrorKind::ServiceUnavailable,
                e.to_string(),
            ),
        }
    }
}
