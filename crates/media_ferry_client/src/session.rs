//! The process-wide state object: built once at start-up, handed to the
//! trigger layer, and disposed explicitly at shutdown.

use crate::channels::{
    ChannelSet, ClipboardChannel, ClipboardSink, DownloadChannel, RemoteServiceChannel,
    SystemClipboard,
};
use crate::config::Config;
use crate::feedback::{FeedbackReporter, NotificationBoard, NotificationSink};
use crate::http_client::CompanionClient;
use crate::ledger::RecentItems;
use crate::liveness::{LivenessProber, LivenessState, ProberTask};
use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::FerryError;
use std::sync::Arc;

pub struct Session {
    config: Config,
    orchestrator: Arc<Orchestrator>,
    prober_task: ProberTask,
}

impl Session {
    /// Start with the system clipboard and an in-process notification board.
    /// Must be called from within a Tokio runtime.
    pub fn start(config: Config) -> Result<Self, FerryError> {
        Self::start_with(
            config,
            Arc::new(SystemClipboard),
            Arc::new(NotificationBoard::new()),
        )
    }

    pub fn start_with(
        config: Config,
        clipboard: Arc<dyn ClipboardSink>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Result<Self, FerryError> {
        let http = reqwest::Client::builder().build()?;
        let companion = CompanionClient::with_client(http.clone(), &config.base_url);

        let prober = LivenessProber::new(
            companion.clone(),
            config.probe_timeout,
            config.probe_interval,
        );
        let download = Arc::new(DownloadChannel::new(
            http.clone(),
            config.download_folder(),
            config.request_timeout,
        ));
        tracing::info!(
            "media ferry session starting (service {}, downloads to {})",
            config.base_url,
            download.folder().display()
        );
        let channels = ChannelSet::new(
            Arc::new(RemoteServiceChannel::new(
                companion,
                config.source.clone(),
                config.request_timeout,
                config.fast_fail_timeout,
                prober.interval(),
            )),
            Arc::new(ClipboardChannel::new(
                http,
                config.origin.clone(),
                config.request_timeout,
                clipboard,
            )),
            download,
        );
        let reporter = FeedbackReporter::new(
            notifications,
            config.notification_ttl,
            config.download_subdir.clone(),
        );
        let orchestrator = Arc::new(Orchestrator::new(
            channels,
            Arc::clone(&prober),
            Arc::new(RecentItems::new()),
            reporter,
            OrchestratorOptions {
                default_extension: config.default_extension.clone(),
                copy_link_fallback: config.copy_link_fallback,
            },
        ));

        let prober_task = prober.spawn();
        Ok(Self {
            config,
            orchestrator,
            prober_task,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn liveness(&self) -> LivenessState {
        self.orchestrator.prober().state()
    }

    /// Stop the recurring probe and wait for it to finish.
    pub async fn shutdown(self) {
        self.prober_task.shutdown().await;
        tracing::info!("media ferry session stopped");
    }
}
