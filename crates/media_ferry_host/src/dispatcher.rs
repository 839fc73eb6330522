//! Single consumer of the command queue.
//!
//! Commands are handled strictly one at a time, so at most one delivery is in
//! flight. Each command produces one JSON reply line on the output.

use crate::commands::Command;
use crate::error::{HostError, HostResult};
use media_ferry_client::ledger::RecentItem;
use media_ferry_client::orchestrator::Orchestrator;
use media_ferry_client::{
    ChannelOutcome, DeliveryResult, FerryError, LivenessState, RejectReason, RequestKind,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Delivery {
        kind: RequestKind,
        source_url: String,
        artifact_name: String,
        success: bool,
        outcomes: Vec<ChannelOutcome>,
    },
    Rejected {
        reason: RejectReason,
        message: String,
    },
    Recent {
        items: Vec<RecentItem>,
    },
    Status {
        service: String,
        liveness: LivenessState,
    },
    Error {
        message: String,
    },
    Bye,
}

impl From<DeliveryResult> for Reply {
    fn from(result: DeliveryResult) -> Self {
        Reply::Delivery {
            kind: result.request.kind(),
            source_url: result.request.source_url().to_string(),
            success: result.success(),
            artifact_name: result.artifact_name,
            outcomes: result.outcomes,
        }
    }
}

pub struct Dispatcher {
    orchestrator: Arc<Orchestrator>,
    service: String,
}

impl Dispatcher {
    pub fn new(orchestrator: Arc<Orchestrator>, service: impl Into<String>) -> Self {
        Self {
            orchestrator,
            service: service.into(),
        }
    }

    pub async fn handle(&self, command: Command) -> HostResult<Reply> {
        match command {
            Command::Image(url) => self.deliver(&url, RequestKind::Image).await,
            Command::Video(url) => self.deliver(&url, RequestKind::VideoLink).await,
            Command::Replay => {
                let item = self
                    .orchestrator
                    .ledger()
                    .most_recent()
                    .await
                    .ok_or(HostError::NothingToReplay)?;
                tracing::info!("replaying {}", item.source_url);
                let reply = self.orchestrator.replay(&item).await.map(Reply::from);
                rejection_or(reply)
            }
            Command::Recent => Ok(Reply::Recent {
                items: self.orchestrator.ledger().items().await,
            }),
            Command::Status => Ok(Reply::Status {
                service: self.service.clone(),
                liveness: self.orchestrator.prober().state(),
            }),
            Command::Quit => Ok(Reply::Bye),
        }
    }

    async fn deliver(&self, url: &str, kind: RequestKind) -> HostResult<Reply> {
        let reply = self
            .orchestrator
            .request_delivery(url, kind)
            .await
            .map(Reply::from);
        rejection_or(reply)
    }

    /// Drain the queue until it closes or `quit` arrives.
    pub async fn run<W>(&self, mut rx: mpsc::Receiver<Command>, mut out: W) -> HostResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(command) = rx.recv().await {
            let quit = command == Command::Quit;
            let reply = match self.handle(command).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!("command failed: {}", e);
                    Reply::Error {
                        message: e.to_string(),
                    }
                }
            };
            let mut line = serde_json::to_vec(&reply)?;
            line.push(b'\n');
            out.write_all(&line).await?;
            out.flush().await?;
            if quit {
                break;
            }
        }
        tracing::debug!("dispatcher finished");
        Ok(())
    }
}

/// A refused request is an ordinary reply, not a host error.
fn rejection_or(reply: Result<Reply, FerryError>) -> HostResult<Reply> {
    match reply {
        Ok(reply) => Ok(reply),
        Err(FerryError::InvalidRequest(reason)) => Ok(Reply::Rejected {
            reason,
            message: reason.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}
