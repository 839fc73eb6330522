use crate::{
    AttemptContext, ChannelKind, ChannelOutcome, DeliveryChannel, DeliveryErrorKind,
    DeliveryRequest, FerryError,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Last resort: save the source bytes under the artifact name in a fixed
/// folder so the user can drag the file in by hand.
pub struct DownloadChannel {
    http: reqwest::Client,
    folder: PathBuf,
    timeout: Duration,
}

impl DownloadChannel {
    pub fn new(http: reqwest::Client, folder: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            http,
            folder: folder.into(),
            timeout,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    async fn save(&self, url: &str, path: &Path) -> Result<u64, FerryError> {
        tokio::fs::create_dir_all(&self.folder).await?;

        let resp = self.http.get(url).timeout(self.timeout).send().await?;
        if !resp.status().is_success() {
            return Err(FerryError::Status {
                status: resp.status().as_u16(),
                body: String::new(),
            });
        }

        let mut file = tokio::fs::File::create(path).await?;
        let written = match stream_to(resp, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(path).await {
                    tracing::debug!("could not remove partial {}: {}", path.display(), rm);
                }
                return Err(e);
            }
        };
        Ok(written)
    }
}

async fn stream_to(resp: reqwest::Response, file: &mut tokio::fs::File) -> Result<u64, FerryError> {
    let mut stream = resp.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        file.write_all(&bytes).await?;
        written = written.saturating_add(bytes.len() as u64);
    }
    file.sync_all().await?;
    Ok(written)
}

#[async_trait]
impl DeliveryChannel for DownloadChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Download
    }

    async fn attempt(
        &self,
        request: &DeliveryRequest,
        ctx: &AttemptContext<'_>,
    ) -> ChannelOutcome {
        let path = self.folder.join(ctx.artifact_name);
        match self.save(request.source_url().as_str(), &path).await {
            Ok(written) => ChannelOutcome::succeeded(
                self.kind(),
                ctx.artifact_name,
                format!("saved {} bytes to {}", written, path.display()),
            ),
            Err(e) => ChannelOutcome::failed(
                self.kind(),
                ctx.artifact_name,
                DeliveryErrorKind::WriteFailed,
                e.to_string(),
            ),
        }
    }
}
